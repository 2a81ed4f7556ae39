// vim: tw=80
//! Where verification failures go.

use std::fmt;

/// The test framework's assertion primitives, as seen by verification.
///
/// Call count mismatches are reported with [`fail`](Reporter::fail), and
/// verification keeps going, so that one pass surfaces every unmet
/// expectation.
pub trait Reporter {
    /// Record a failure and continue
    fn fail(&mut self, message: &str);

    /// Record a failure and abort the test
    fn fatal(&mut self, message: &str) -> !;
}

/// A [`Reporter`] that collects failure messages.
///
/// # Examples
/// ```
/// # use dynmock::{Failures, Reporter};
/// let mut failures = Failures::new();
/// failures.fail("first");
/// failures.fail("second");
/// assert_eq!(2, failures.len());
/// assert_eq!(["first", "second"], failures.messages());
/// ```
#[derive(Debug, Default)]
pub struct Failures {
    messages: Vec<String>,
}

impl Failures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Panic with every collected message, if there are any.
    #[track_caller]
    pub fn finish(self) {
        if !self.is_empty() {
            panic!("{self}");
        }
    }
}

impl fmt::Display for Failures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} mock expectation(s) failed", self.messages.len())?;
        for (i, m) in self.messages.iter().enumerate() {
            writeln!(f, "{}) {m}", i + 1)?;
        }
        Ok(())
    }
}

impl Reporter for Failures {
    fn fail(&mut self, message: &str) {
        self.messages.push(message.to_owned());
    }

    #[track_caller]
    fn fatal(&mut self, message: &str) -> ! {
        self.messages.push(message.to_owned());
        panic!("{self}");
    }
}
