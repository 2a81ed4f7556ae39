// vim: tw=80
//! The per-test owner of every mock and interception.

use std::{
    cell::RefCell,
    cell::RefMut,
    fmt,
    rc::Rc,
};
use tracing::debug;

use crate::{
    error::fatal,
    interception::InterceptTable,
    introspect::Introspectable,
    mock::{Mock, MockInstance},
    registry::Registry,
    report::{Failures, Reporter},
};

thread_local! {
    /// Scopes alive on this thread, innermost last
    static ACTIVE: RefCell<Vec<Rc<ScopeState>>> = const {
        RefCell::new(Vec::new())
    };
}

/// The innermost scope alive on this thread
pub(crate) fn active() -> Option<Rc<ScopeState>> {
    ACTIVE.with(|a| a.borrow().last().cloned())
}

/// Runtime options for a [`MockScope`]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScopeConfig {
    verify_on_drop: bool,
}

impl ScopeConfig {
    pub fn builder() -> ScopeConfigBuilder {
        ScopeConfigBuilder::default()
    }

    pub fn verify_on_drop(&self) -> bool {
        self.verify_on_drop
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScopeConfigBuilder {
    verify_on_drop: bool,
}

impl ScopeConfigBuilder {
    /// Verify every expectation when the scope is dropped, and panic if any
    /// are unmet.
    pub fn verify_on_drop(mut self, verify: bool) -> Self {
        self.verify_on_drop = verify;
        self
    }

    pub fn build(self) -> ScopeConfig {
        ScopeConfig { verify_on_drop: self.verify_on_drop }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ScopeState {
    pub registry: RefCell<Registry>,
    pub intercepts: RefCell<InterceptTable>,
}

/// Owns the mocks of one test, and the interceptions they installed.
///
/// A scope is active on its thread from creation until it is dropped.  When
/// several are alive, real calls are routed through the innermost one.
/// Dropping the scope discards all of its mocks and restores every
/// intercepted method to its normal behavior.
///
/// # Examples
/// ```
/// # use dynmock::*;
/// # use std::{cell::RefCell, rc::Rc};
/// #[derive(Default)]
/// struct Calculator {}
///
/// #[mockable]
/// impl Calculator {
///     fn f(&self, _s: String, n: i32) -> i32 {
///         n
///     }
/// }
///
/// let scope = MockScope::new();
/// let calc = Rc::new(RefCell::new(Calculator::default()));
/// let mut mock = scope.declare_mock(&calc);
/// mock.to_receive("f").once().with_returns(values![19i32]);
///
/// assert_eq!(values![19i32], mock.call("f", values!["x".to_string(), 5i32]));
/// scope.verify();
/// ```
pub struct MockScope {
    state: Rc<ScopeState>,
    config: ScopeConfig,
}

impl MockScope {
    pub fn new() -> Self {
        Self::with_config(ScopeConfig::default())
    }

    pub fn with_config(config: ScopeConfig) -> Self {
        let state = Rc::new(ScopeState::default());
        ACTIVE.with(|a| a.borrow_mut().push(Rc::clone(&state)));
        debug!(?config, "activated mock scope");
        MockScope { state, config }
    }

    fn registry(&self) -> RefMut<'_, Registry> {
        self.state.registry.borrow_mut()
    }

    /// Create a mock of `target` and register it in this scope.
    ///
    /// # Panics
    ///
    /// If `target` already has a mock in this scope.
    #[track_caller]
    pub fn declare_mock<T: Introspectable>(&self, target: &Rc<RefCell<T>>)
        -> Mock<T>
    {
        let instance = Rc::new(MockInstance::new(target));
        if let Err(e) = self.registry().register(Rc::clone(&instance)) {
            fatal(e);
        }
        debug!(type_name = instance.type_name(), "declared mock");
        Mock::new(instance, Rc::clone(target), Rc::clone(&self.state))
    }

    /// Report every unmet expectation of every mock in this scope.
    pub fn assert_all_expectations(&self, reporter: &mut dyn Reporter) {
        // Clone the list so that reporters may touch the scope
        let mocks = self.state.registry.borrow()
            .iter()
            .cloned()
            .collect::<Vec<_>>();
        for m in mocks {
            m.verify(reporter);
        }
    }

    /// Panic with every unmet expectation, if there are any.
    #[track_caller]
    pub fn verify(&self) {
        let mut failures = Failures::new();
        self.assert_all_expectations(&mut failures);
        failures.finish();
    }

    /// Forget every mock in this scope.  Intercepted methods stay
    /// intercepted, but pass calls through to the real implementation.
    pub fn clear_all_expectations(&self) {
        self.registry().clear();
    }

    /// Restore every intercepted method to its normal behavior.
    pub fn release_intercepts(&self) {
        self.state.intercepts.borrow_mut().release_all();
    }

    /// Forget one mock.  Returns whether it belonged to this scope.
    pub fn remove<T: Introspectable>(&self, mock: &Mock<T>) -> bool {
        self.registry().unregister(mock.instance())
    }

    /// Number of mocks in this scope
    pub fn len(&self) -> usize {
        self.state.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.registry.borrow().is_empty()
    }

    /// Number of methods currently intercepted
    pub fn intercept_count(&self) -> usize {
        self.state.intercepts.borrow().len()
    }

    pub fn config(&self) -> ScopeConfig {
        self.config
    }
}

impl Default for MockScope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockScope")
            .field("config", &self.config)
            .field("mocks", &self.len())
            .field("intercepts", &self.intercept_count())
            .finish()
    }
}

impl Drop for MockScope {
    fn drop(&mut self) {
        ACTIVE.with(|a| {
            let mut active = a.borrow_mut();
            if let Some(i) = active.iter()
                .rposition(|s| Rc::ptr_eq(s, &self.state))
            {
                active.remove(i);
            }
        });
        let mut failures = Failures::new();
        if self.config.verify_on_drop && !std::thread::panicking() {
            self.assert_all_expectations(&mut failures);
        }
        debug!(mocks = self.len(), intercepts = self.intercept_count(),
               "tearing down mock scope");
        self.clear_all_expectations();
        self.release_intercepts();
        failures.finish();
    }
}
