// vim: tw=80
//! Mock instances and the fluent handle used to configure them.

use cfg_if::cfg_if;
use std::{
    any::TypeId,
    cell::RefCell,
    fmt,
    rc::Rc,
};
use tracing::debug;

use crate::{
    error::{fatal, MockError},
    expectation::{CallRecord, MethodExpectation, Times},
    introspect::{Introspectable, MethodSignature},
    report::Reporter,
    scope::ScopeState,
    value::{short_type_name, Value},
};

/// Reference identity of a mocked object: where it lives, and what it is.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct Identity {
    addr: *const (),
    type_id: TypeId,
}

impl Identity {
    pub fn new<T: 'static>(addr: *const ()) -> Self {
        Identity { addr, type_id: TypeId::of::<T>() }
    }

    pub fn of<T: 'static>(target: &Rc<RefCell<T>>) -> Self {
        Identity::new::<T>(target.as_ptr() as *const ())
    }
}

/// Object-safe access to a mocked object's real implementation
trait Subject {
    fn invoke(&self, method: &str, args: Vec<Value>)
        -> Result<Vec<Value>, MockError>;
}

impl<T: Introspectable> Subject for RefCell<T> {
    fn invoke(&self, method: &str, args: Vec<Value>)
        -> Result<Vec<Value>, MockError>
    {
        let mut target = self.try_borrow_mut().map_err(|_| {
            MockError::TargetBorrowed {
                type_name: short_type_name(std::any::type_name::<T>()),
                method: method.to_string()
            }
        })?;
        target.invoke(method, args)
    }
}

/// How to reach the real implementation when a call delegates to it
pub(crate) enum Delegate<'a> {
    /// Borrow the target and invoke the method by name
    Target,
    /// Run the original body on a receiver that is already borrowed
    Original(
        Box<dyn FnOnce(Vec<Value>) -> Result<Vec<Value>, MockError> + 'a>
    ),
}

/// The expectations declared for one mocked object.
pub(crate) struct MockInstance {
    identity: Identity,
    type_name: &'static str,
    target: Rc<dyn Subject>,
    expectations: RefCell<Vec<MethodExpectation>>,
}

impl MockInstance {
    pub fn new<T: Introspectable>(target: &Rc<RefCell<T>>) -> Self {
        let type_name = target.borrow().type_name();
        MockInstance {
            identity: Identity::of(target),
            type_name,
            target: Rc::clone(target) as Rc<dyn Subject>,
            expectations: RefCell::new(Vec::new()),
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn full_name(&self, method: &str) -> String {
        format!("<{}>.{method}", self.type_name)
    }

    pub fn expect(&self, signature: MethodSignature) -> Result<(), MockError> {
        let mut expectations = self.expectations.borrow_mut();
        if expectations.iter().any(|e| e.method() == signature.name()) {
            return Err(MockError::DuplicateMethod {
                method: self.full_name(signature.name())
            });
        }
        debug!(method = %self.full_name(signature.name()), %signature,
               "declared expectation");
        expectations.push(MethodExpectation::new(self.type_name, signature));
        Ok(())
    }

    /// Apply `f` to the most recently declared expectation
    pub fn modify<F>(&self, modifier: &'static str, f: F)
        -> Result<(), MockError>
        where F: FnOnce(&mut MethodExpectation) -> Result<(), MockError>
    {
        let mut expectations = self.expectations.borrow_mut();
        match expectations.last_mut() {
            Some(e) => f(e),
            None => Err(MockError::ModifierBeforeDeclare { modifier })
        }
    }

    pub fn signatures(&self) -> Vec<MethodSignature> {
        self.expectations.borrow()
            .iter()
            .map(|e| e.signature().clone())
            .collect()
    }

    pub fn calls(&self, method: &str) -> Vec<CallRecord> {
        self.expectations.borrow()
            .iter()
            .find(|e| e.method() == method)
            .map(|e| e.calls().to_vec())
            .unwrap_or_default()
    }

    /// Resolve one call of `method`.
    ///
    /// The expectation table is not borrowed while the real implementation
    /// runs, so delegated bodies may call back into this mock.
    pub fn call(&self, method: &str, args: Vec<Value>, delegate: Delegate<'_>)
        -> Result<Vec<Value>, MockError>
    {
        let plan = {
            let mut expectations = self.expectations.borrow_mut();
            let e = expectations.iter_mut()
                .find(|e| e.method() == method)
                .ok_or_else(|| MockError::MockMethodNotFound {
                    method: self.full_name(method)
                })?;
            e.call(args.clone())?
        };

        let delegated = if plan.delegate {
            let out = match delegate {
                Delegate::Target => self.target.invoke(method, args)?,
                Delegate::Original(original) => original(args)?,
            };
            if let Some(e) = self.expectations.borrow_mut()
                .iter_mut()
                .find(|e| e.method() == method)
            {
                e.record_returns(plan.record, out.clone());
            }
            Some(out)
        } else {
            None
        };

        Ok(plan.returns.or(delegated).unwrap_or_default())
    }

    pub fn verify(&self, reporter: &mut dyn Reporter) {
        for e in self.expectations.borrow().iter() {
            e.verify(reporter);
        }
    }
}

impl fmt::Debug for MockInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockInstance")
            .field("type_name", &self.type_name)
            .field("identity", &self.identity)
            .field("expectations", &self.expectations)
            .finish()
    }
}

cfg_if! {
    if #[cfg(feature = "partial")] {
        fn intercept<T: Introspectable>(scope: &ScopeState,
                                        instance: &MockInstance)
            -> Result<(), MockError>
        {
            let mut table = scope.intercepts.borrow_mut();
            for sig in instance.signatures() {
                table.ensure_intercepted::<T>(instance.type_name(), &sig);
            }
            Ok(())
        }
    } else {
        fn intercept<T: Introspectable>(_scope: &ScopeState,
                                        instance: &MockInstance)
            -> Result<(), MockError>
        {
            Err(MockError::PartialUnsupported {
                type_name: instance.type_name().to_string()
            })
        }
    }
}

/// A mock of one object, and the handle used to declare its expectations.
///
/// Created by [`MockScope::declare_mock`](crate::MockScope::declare_mock).
/// Every modifier acts on the method most recently named by
/// [`to_receive`](Mock::to_receive), and panics if used incorrectly.
pub struct Mock<T: Introspectable> {
    instance: Rc<MockInstance>,
    target: Rc<RefCell<T>>,
    scope: Rc<ScopeState>,
}

impl<T: Introspectable> Mock<T> {
    pub(crate) fn new(instance: Rc<MockInstance>, target: Rc<RefCell<T>>,
                      scope: Rc<ScopeState>) -> Self
    {
        Mock { instance, target, scope }
    }

    pub(crate) fn instance(&self) -> &Rc<MockInstance> {
        &self.instance
    }

    #[track_caller]
    fn modify<F>(&mut self, modifier: &'static str, f: F) -> &mut Self
        where F: FnOnce(&mut MethodExpectation) -> Result<(), MockError>
    {
        if let Err(e) = self.instance.modify(modifier, f) {
            fatal(e);
        }
        self
    }

    /// Expect calls of `method`, which must be one of the target's
    /// introspectable methods.
    #[track_caller]
    pub fn to_receive(&mut self, method: &str) -> &mut Self {
        let signature = self.target.borrow().method_signature(method);
        let result = match signature {
            Some(sig) => self.instance.expect(sig),
            None => Err(MockError::MethodNotFound {
                type_name: self.instance.type_name().to_string(),
                method: method.to_string()
            })
        };
        if let Err(e) = result {
            fatal(e);
        }
        self
    }

    #[track_caller]
    fn set_times(&mut self, modifier: &'static str, times: Times)
        -> &mut Self
    {
        self.modify(modifier, |e| {
            e.times(times);
            Ok(())
        })
    }

    /// Expect exactly one call
    #[track_caller]
    pub fn once(&mut self) -> &mut Self {
        self.set_times("once()", Times::Exactly(1))
    }

    /// Expect exactly two calls
    #[track_caller]
    pub fn twice(&mut self) -> &mut Self {
        self.set_times("twice()", Times::Exactly(2))
    }

    /// Expect exactly `n` calls.  `times(0)` removes any constraint; use
    /// [`never`](Mock::never) to forbid calls.
    #[track_caller]
    pub fn times(&mut self, n: usize) -> &mut Self {
        self.set_times("times()", Times::from_count(n))
    }

    /// Allow any number of calls, including none
    #[track_caller]
    pub fn maybe(&mut self) -> &mut Self {
        self.set_times("maybe()", Times::Any)
    }

    /// Forbid calls.  The first call will panic.
    #[track_caller]
    pub fn never(&mut self) -> &mut Self {
        self.set_times("never()", Times::Never)
    }

    /// Only accept calls with exactly these argument values.
    #[track_caller]
    pub fn with_args(&mut self, args: Vec<Value>) -> &mut Self {
        self.modify("with_args()", |e| e.with_args(args))
    }

    /// Accept calls with any argument values
    #[track_caller]
    pub fn with_any_args(&mut self) -> &mut Self {
        self.modify("with_any_args()", |e| e.with_any_args())
    }

    /// Return these values from every call.  Methods returning `()` take an
    /// empty list.
    #[track_caller]
    pub fn with_returns(&mut self, returns: Vec<Value>) -> &mut Self {
        self.modify("with_returns()", |e| e.with_returns(returns))
    }

    /// Run the real implementation for every call.
    ///
    /// Combined with [`with_returns`](Mock::with_returns), the declared
    /// values are still what the caller gets, while the real output is
    /// recorded and compared with them during verification.
    #[track_caller]
    pub fn and_calls_original(&mut self) -> &mut Self {
        self.modify("and_calls_original()", |e| e.and_calls_original())
    }

    /// Simulate a call of `method`, panicking on any error.
    #[track_caller]
    pub fn call(&self, method: &str, args: Vec<Value>) -> Vec<Value> {
        self.try_call(method, args).unwrap_or_else(|e| fatal(e))
    }

    /// Simulate a call of `method`.
    pub fn try_call(&self, method: &str, args: Vec<Value>)
        -> Result<Vec<Value>, MockError>
    {
        self.instance.call(method, args, Delegate::Target)
    }

    /// Report every unmet expectation of this mock.
    pub fn assert(&self, reporter: &mut dyn Reporter) {
        self.instance.verify(reporter);
    }

    /// How many times `method` has been called so far.  Zero for methods
    /// that were never declared.
    pub fn call_count(&self, method: &str) -> usize {
        self.instance.calls(method).len()
    }

    /// Every recorded call of `method`, in order.
    pub fn calls(&self, method: &str) -> Vec<CallRecord> {
        self.instance.calls(method)
    }

    /// Route real calls of every declared method through this mock.
    ///
    /// Returns the very same target, so calls made through it, or through
    /// any other handle to it, are dispatched to the mock while the scope
    /// lives.  Methods declared later are not intercepted until `as_partial`
    /// is called again.
    #[track_caller]
    pub fn as_partial(&self) -> Rc<RefCell<T>> {
        if let Err(e) = intercept::<T>(&self.scope, &self.instance) {
            fatal(e);
        }
        Rc::clone(&self.target)
    }

    pub fn target(&self) -> &Rc<RefCell<T>> {
        &self.target
    }

    pub fn type_name(&self) -> &'static str {
        self.instance.type_name()
    }
}

impl<T: Introspectable> fmt::Debug for Mock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.instance, f)
    }
}
