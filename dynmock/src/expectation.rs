// vim: tw=80
//! The contract declared for one method of one mocked object.

use predicates::prelude::*;
use predicates_tree::CaseTreeExt;
use std::fmt;

use crate::{
    error::MockError,
    introspect::MethodSignature,
    report::Reporter,
    value::{type_list, value_list, Value},
};

/// How many times an expectation may be called
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Times {
    /// Any number of calls, including none
    #[default]
    Any,
    /// Exactly this many calls.  Never zero.
    Exactly(usize),
    /// Not a single call
    Never,
}

impl Times {
    /// Build from a call count.  Zero means "unconstrained".
    pub fn from_count(n: usize) -> Self {
        if n == 0 {
            Times::Any
        } else {
            Times::Exactly(n)
        }
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Times::Any => f.write_str("any"),
            Times::Exactly(n) => write!(f, "{n}"),
            Times::Never => f.write_str("never"),
        }
    }
}

/// Which arguments an expectation matches
#[derive(Clone, Debug, Default)]
enum Matcher {
    #[default]
    Unset,
    Any,
    Exact(Vec<Value>),
}

impl Matcher {
    fn is_set(&self) -> bool {
        !matches!(self, Matcher::Unset)
    }

    /// Check `args` against an exact matcher, describing the first failed
    /// argument predicate.
    fn verify(&self, args: &[Value]) -> Result<(), String> {
        let Matcher::Exact(expected) = self else {
            return Ok(());
        };
        for (i, (e, a)) in expected.iter().zip(args.iter()).enumerate() {
            let p = predicate::eq(e.clone());
            if let Some(case) = p.find_case(false, a) {
                return Err(format!("argument {i}: {}", case.tree()));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Unset | Matcher::Any => f.write_str("<anything>"),
            Matcher::Exact(v) => f.write_str(&value_list(v)),
        }
    }
}

/// One call of a mocked method
#[derive(Clone, Debug, PartialEq)]
pub struct CallRecord {
    args: Vec<Value>,
    returns: Option<Vec<Value>>,
}

impl CallRecord {
    /// The arguments the method was called with
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// What the real implementation returned.  Only present when the call
    /// was delegated to it.
    pub fn returns(&self) -> Option<&[Value]> {
        self.returns.as_deref()
    }
}

/// What a call needs from its expectation once it has been accepted
#[derive(Debug)]
pub(crate) struct CallPlan {
    pub record: usize,
    pub delegate: bool,
    pub returns: Option<Vec<Value>>,
}

/// The declared contract for a single method, plus the calls it received.
#[derive(Debug)]
pub(crate) struct MethodExpectation {
    /// Printable name, like `<Foo>.bar`
    full_name: String,
    signature: MethodSignature,
    times: Times,
    matcher: Matcher,
    returns: Option<Vec<Value>>,
    delegate: bool,
    calls: Vec<CallRecord>,
}

impl MethodExpectation {
    pub fn new(type_name: &str, signature: MethodSignature) -> Self {
        MethodExpectation {
            full_name: format!("<{type_name}>.{}", signature.name()),
            signature,
            times: Times::default(),
            matcher: Matcher::default(),
            returns: None,
            delegate: false,
            calls: Vec::new(),
        }
    }

    pub fn method(&self) -> &'static str {
        self.signature.name()
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub fn times(&mut self, times: Times) {
        self.times = times;
    }

    pub fn with_args(&mut self, args: Vec<Value>) -> Result<(), MockError> {
        if self.matcher.is_set() {
            return Err(MockError::ArgsAlreadyDeclared {
                modifier: "with_args()",
                method: self.full_name.clone()
            });
        }
        if !self.signature.accepts_args(&args) {
            return Err(MockError::WithArgsMismatch {
                method: self.full_name.clone(),
                expected: self.signature.params_string(),
                received: type_list(args.iter().map(Value::type_info))
            });
        }
        self.matcher = Matcher::Exact(args);
        Ok(())
    }

    pub fn with_any_args(&mut self) -> Result<(), MockError> {
        if self.matcher.is_set() {
            return Err(MockError::ArgsAlreadyDeclared {
                modifier: "with_any_args()",
                method: self.full_name.clone()
            });
        }
        self.matcher = Matcher::Any;
        Ok(())
    }

    pub fn with_returns(&mut self, returns: Vec<Value>)
        -> Result<(), MockError>
    {
        if self.returns.is_some() {
            return Err(MockError::ReturnsAlreadyDeclared {
                modifier: "with_returns()",
                method: self.full_name.clone()
            });
        }
        if !self.signature.accepts_returns(&returns) {
            return Err(MockError::WithReturnsMismatch {
                method: self.full_name.clone(),
                expected: self.signature.output_string(),
                received: type_list(returns.iter().map(Value::type_info))
            });
        }
        self.returns = Some(returns);
        Ok(())
    }

    pub fn and_calls_original(&mut self) -> Result<(), MockError> {
        if self.delegate {
            return Err(MockError::DelegationAlreadyDeclared {
                method: self.full_name.clone()
            });
        }
        self.delegate = true;
        Ok(())
    }

    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    /// Record a call, then decide whether it may proceed.
    ///
    /// The call is recorded first, so that it shows up in the call log even
    /// if it is rejected.
    pub fn call(&mut self, args: Vec<Value>) -> Result<CallPlan, MockError> {
        self.calls.push(CallRecord { args, returns: None });
        let record = self.calls.len() - 1;
        let args = &self.calls[record].args;

        if self.times == Times::Never {
            return Err(MockError::CalledButNeverExpected {
                method: self.full_name.clone(),
                args: value_list(args)
            });
        }
        if !self.signature.accepts_args(args) {
            return Err(MockError::InvalidArgsSignature {
                method: self.full_name.clone(),
                expected: self.signature.params_string(),
                received: type_list(args.iter().map(Value::type_info))
            });
        }
        if let Err(detail) = self.matcher.verify(args) {
            return Err(MockError::ArgsMismatch {
                method: self.full_name.clone(),
                detail
            });
        }
        if !self.delegate && self.returns.is_none() {
            return Err(MockError::ReturnsNotDefined {
                method: self.full_name.clone()
            });
        }
        Ok(CallPlan {
            record,
            delegate: self.delegate,
            returns: self.returns.clone()
        })
    }

    /// Store what the real implementation returned for a delegated call
    pub fn record_returns(&mut self, record: usize, returns: Vec<Value>) {
        if let Some(c) = self.calls.get_mut(record) {
            c.returns = Some(returns);
        }
    }

    /// Report every way in which the recorded calls violate this contract.
    pub fn verify(&self, reporter: &mut dyn Reporter) {
        let actual = self.calls.len();
        match self.times {
            Times::Any => (),
            Times::Never if actual > 0 => {
                reporter.fail(&self.count_failure("more", actual));
            },
            Times::Never => (),
            Times::Exactly(n) if actual > n => {
                reporter.fail(&self.count_failure("more", actual));
            },
            Times::Exactly(n) if actual < n => {
                reporter.fail(&self.count_failure("less", actual));
            },
            Times::Exactly(_) => (),
        }
        if let Some(declared) = &self.returns {
            for (i, c) in self.calls.iter().enumerate() {
                match &c.returns {
                    Some(r) if r != declared => {
                        reporter.fail(&format!(
"{} returned values differing from its declared returns on call {}:
  declared: {}
  actual  : {}",
                            self.full_name, i + 1, value_list(declared),
                            value_list(r)));
                    },
                    _ => ()
                }
            }
        }
    }

    fn count_failure(&self, direction: &str, actual: usize) -> String {
        let returns = match &self.returns {
            Some(r) => value_list(r),
            None => String::from("<undeclared>"),
        };
        format!(
"{} called {direction} than expected: expected {}, actual {actual}
  withargs   : {}
  withreturns: {returns}",
            self.full_name, self.times, self.matcher)
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{
        introspect::Receiver,
        report::Failures,
        value::TypeInfo,
        values,
    };

    fn expectation() -> MethodExpectation {
        let sig = MethodSignature::new("f", Receiver::Ref,
            vec![TypeInfo::of::<String>(), TypeInfo::of::<i32>()],
            Some(TypeInfo::of::<i32>()));
        MethodExpectation::new("Foo", sig)
    }

    fn args() -> Vec<Value> {
        values!["x".to_string(), 5i32]
    }

    #[test]
    fn times_from_count() {
        assert_eq!(Times::Any, Times::from_count(0));
        assert_eq!(Times::Exactly(3), Times::from_count(3));
    }

    #[test]
    fn call_is_recorded_before_rejection() {
        let mut e = expectation();
        e.times(Times::Never);
        let err = e.call(args()).unwrap_err();
        assert!(matches!(err, MockError::CalledButNeverExpected { .. }));
        assert_eq!(1, e.calls().len());
        assert_eq!(&args()[..], e.calls()[0].args());
    }

    #[test]
    fn never_fails_regardless_of_args() {
        let mut e = expectation();
        e.times(Times::Never);
        assert!(e.call(values![1u8]).is_err());
        let mut e = expectation();
        e.times(Times::Never);
        e.with_returns(values![1i32]).unwrap();
        assert!(e.call(args()).is_err());
    }

    #[test]
    fn invalid_signature() {
        let mut e = expectation();
        e.with_returns(values![1i32]).unwrap();
        let err = e.call(values![5i32, "x".to_string()]).unwrap_err();
        assert_eq!(MockError::InvalidArgsSignature {
            method: "<Foo>.f".to_string(),
            expected: "<String>, <i32>".to_string(),
            received: "<i32>, <String>".to_string()
        }, err);
    }

    #[test]
    fn no_returns_no_delegation() {
        let mut e = expectation();
        let err = e.call(args()).unwrap_err();
        assert!(matches!(err, MockError::ReturnsNotDefined { .. }));
    }

    #[test]
    fn exact_args_mismatch() {
        let mut e = expectation();
        e.with_args(values!["x".to_string(), 6i32]).unwrap();
        e.with_returns(values![1i32]).unwrap();
        let err = e.call(args()).unwrap_err();
        match err {
            MockError::ArgsMismatch { method, detail } => {
                assert_eq!("<Foo>.f", method);
                assert!(detail.starts_with("argument 1:"), "{detail}");
            },
            _ => panic!("unexpected error {err:?}")
        }
    }

    #[test]
    fn exact_args_match() {
        let mut e = expectation();
        e.with_args(args()).unwrap();
        e.with_returns(values![19i32]).unwrap();
        let plan = e.call(args()).unwrap();
        assert_eq!(Some(values![19i32]), plan.returns);
        assert!(!plan.delegate);
    }

    #[test]
    fn args_declared_once() {
        let mut e = expectation();
        e.with_args(args()).unwrap();
        assert!(e.with_args(args()).is_err());
        assert!(e.with_any_args().is_err());
        let mut e = expectation();
        e.with_any_args().unwrap();
        assert!(e.with_args(args()).is_err());
        assert!(e.with_any_args().is_err());
    }

    #[test]
    fn with_args_type_mismatch() {
        let mut e = expectation();
        let err = e.with_args(values!["x".to_string()]).unwrap_err();
        assert_eq!(MockError::WithArgsMismatch {
            method: "<Foo>.f".to_string(),
            expected: "<String>, <i32>".to_string(),
            received: "<String>".to_string()
        }, err);
    }

    #[test]
    fn returns_declared_once() {
        let mut e = expectation();
        e.with_returns(values![1i32]).unwrap();
        assert!(matches!(e.with_returns(values![1i32]),
                         Err(MockError::ReturnsAlreadyDeclared { .. })));
    }

    #[test]
    fn with_returns_type_mismatch() {
        let mut e = expectation();
        assert!(matches!(e.with_returns(values!["19"]),
                         Err(MockError::WithReturnsMismatch { .. })));
    }

    #[test]
    fn delegation_declared_once() {
        let mut e = expectation();
        e.and_calls_original().unwrap();
        assert!(e.and_calls_original().is_err());
    }

    #[test]
    fn verify_exact() {
        let mut e = expectation();
        e.times(Times::Exactly(2));
        e.with_returns(values![1i32]).unwrap();

        e.call(args()).unwrap();
        let mut f = Failures::new();
        e.verify(&mut f);
        assert_eq!(1, f.len());
        assert!(f.messages()[0].starts_with(
            "<Foo>.f called less than expected: expected 2, actual 1"));

        e.call(args()).unwrap();
        let mut f = Failures::new();
        e.verify(&mut f);
        assert!(f.is_empty());

        e.call(args()).unwrap();
        let mut f = Failures::new();
        e.verify(&mut f);
        assert!(f.messages()[0].starts_with(
            "<Foo>.f called more than expected: expected 2, actual 3"));
    }

    #[test]
    fn verify_never() {
        let mut e = expectation();
        e.times(Times::Never);
        let mut f = Failures::new();
        e.verify(&mut f);
        assert!(f.is_empty());
        let _ = e.call(args());
        e.verify(&mut f);
        assert!(f.messages()[0].starts_with(
            "<Foo>.f called more than expected: expected never, actual 1"));
    }

    #[test]
    fn verify_delegated_returns() {
        let mut e = expectation();
        e.and_calls_original().unwrap();
        e.with_returns(values![19i32]).unwrap();
        let plan = e.call(args()).unwrap();
        e.record_returns(plan.record, values![5i32]);
        let plan = e.call(args()).unwrap();
        e.record_returns(plan.record, values![19i32]);

        let mut f = Failures::new();
        e.verify(&mut f);
        assert_eq!(1, f.len());
        assert_eq!(
"<Foo>.f returned values differing from its declared returns on call 1:
  declared: 19 <i32>
  actual  : 5 <i32>", f.messages()[0]);
    }
}
