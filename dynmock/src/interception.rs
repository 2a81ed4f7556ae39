// vim: tw=80
//! Routing of real method calls through mocks, for partial mocking.
//!
//! Every method rewritten by [`#[mockable]`](crate::mockable) first asks
//! [`is_intercepted`] whether its `(type, method)` pair has an installed
//! record in the innermost active [`MockScope`](crate::MockScope).  If so,
//! the call is handed to [`dispatch`], which either resolves it through the
//! mock registered for the receiver, or runs the original body unchanged when
//! the receiver isn't mocked.
//!
//! While a call is being dispatched, its record is suspended, so that the
//! original body can run without being intercepted again.

use std::{
    any::TypeId,
    cell::Cell,
    collections::HashMap,
    rc::Rc,
};
use tracing::{debug, trace};

use crate::{
    error::MockError,
    introspect::{MethodSignature, Receiver},
    mock::{Delegate, Identity},
    scope,
    value::Value,
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct InterceptKey {
    type_id: TypeId,
    method: &'static str,
}

/// An installed interception of one method of one type
#[derive(Debug)]
pub(crate) struct InterceptRecord {
    type_name: &'static str,
    method: &'static str,
    receiver: Receiver,
    installed: Cell<bool>,
}

impl InterceptRecord {
    fn installed(&self) -> bool {
        self.installed.get()
    }

    pub fn receiver(&self) -> Receiver {
        self.receiver
    }
}

/// Marks a record as not installed until dropped, even while unwinding.
struct Suspension<'a> {
    record: &'a InterceptRecord,
    previous: bool,
}

impl<'a> Suspension<'a> {
    fn new(record: &'a InterceptRecord) -> Self {
        let previous = record.installed.replace(false);
        Suspension { record, previous }
    }
}

impl Drop for Suspension<'_> {
    fn drop(&mut self) {
        self.record.installed.set(self.previous);
    }
}

#[derive(Debug, Default)]
pub(crate) struct InterceptTable {
    records: HashMap<InterceptKey, Rc<InterceptRecord>>,
}

impl InterceptTable {
    /// Install a record for `T::method`, unless one already exists.
    ///
    /// Returns whether a record was installed.
    #[cfg_attr(not(feature = "partial"), allow(dead_code))]
    pub fn ensure_intercepted<T: 'static>(&mut self, type_name: &'static str,
                                          signature: &MethodSignature) -> bool
    {
        let key = InterceptKey {
            type_id: TypeId::of::<T>(),
            method: signature.name()
        };
        if self.records.contains_key(&key) {
            return false;
        }
        debug!(type_name, method = signature.name(), "installed intercept");
        self.records.insert(key, Rc::new(InterceptRecord {
            type_name,
            method: signature.name(),
            receiver: signature.receiver(),
            installed: Cell::new(true),
        }));
        true
    }

    fn get<T: 'static>(&self, method: &'static str)
        -> Option<Rc<InterceptRecord>>
    {
        let key = InterceptKey { type_id: TypeId::of::<T>(), method };
        self.records.get(&key).cloned()
    }

    /// Remove every record
    pub fn release_all(&mut self) {
        for r in self.records.values() {
            r.installed.set(false);
            debug!(type_name = r.type_name, method = r.method,
                   "released intercept");
        }
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// The installed record for `T::method` in the innermost active scope
fn installed_record<T: 'static>(method: &'static str)
    -> Option<Rc<InterceptRecord>>
{
    let state = scope::active()?;
    let record = state.intercepts.borrow().get::<T>(method)?;
    record.installed().then_some(record)
}

/// Should calls of `T::method` be handed to [`dispatch`]?
#[doc(hidden)]
pub fn is_intercepted<T: 'static>(method: &'static str) -> bool {
    installed_record::<T>(method).is_some()
}

/// Resolve an intercepted call of `T::method` on `receiver`.
///
/// `original` runs the method's real body on the receiver.  It is used to
/// delegate when the mock says so, and to pass the call through unchanged
/// when the receiver is not mocked.
#[doc(hidden)]
pub fn dispatch<T, F>(receiver: *const (), method: &'static str,
                      args: Vec<Value>, original: F)
    -> Result<Vec<Value>, MockError>
    where T: 'static,
          F: FnOnce(Vec<Value>) -> Result<Vec<Value>, MockError>
{
    let Some(state) = scope::active() else {
        return original(args);
    };
    let record = state.intercepts.borrow().get::<T>(method);
    let Some(record) = record.filter(|r| r.installed()) else {
        return original(args);
    };
    let mock = state.registry.borrow().find(Identity::new::<T>(receiver));
    let _suspended = Suspension::new(&record);
    match mock {
        Some(mock) => {
            trace!(type_name = record.type_name, method,
                   receiver = %record.receiver(), "dispatching to mock");
            mock.call(method, args, Delegate::Original(Box::new(original)))
        },
        None => {
            trace!(type_name = record.type_name, method,
                   "receiver not mocked; passing through");
            original(args)
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;

    struct Thing;

    fn sig(name: &'static str) -> MethodSignature {
        MethodSignature::new(name, Receiver::Ref, vec![], None)
    }

    #[test]
    fn ensure_is_idempotent() {
        let mut table = InterceptTable::default();
        assert!(table.ensure_intercepted::<Thing>("Thing", &sig("a")));
        assert!(!table.ensure_intercepted::<Thing>("Thing", &sig("a")));
        assert!(table.ensure_intercepted::<Thing>("Thing", &sig("b")));
        assert!(table.ensure_intercepted::<u8>("u8", &sig("a")));
        assert_eq!(3, table.len());
    }

    #[test]
    fn release_all() {
        let mut table = InterceptTable::default();
        table.ensure_intercepted::<Thing>("Thing", &sig("a"));
        let record = table.get::<Thing>("a").unwrap();
        table.release_all();
        assert_eq!(0, table.len());
        assert!(!record.installed());
        assert!(table.get::<Thing>("a").is_none());
    }

    #[test]
    fn suspension_restores() {
        let mut table = InterceptTable::default();
        table.ensure_intercepted::<Thing>("Thing", &sig("a"));
        let record = table.get::<Thing>("a").unwrap();
        {
            let _s = Suspension::new(&record);
            assert!(!record.installed());
            {
                let _nested = Suspension::new(&record);
                assert!(!record.installed());
            }
            assert!(!record.installed());
        }
        assert!(record.installed());
    }

    #[test]
    fn suspension_restores_on_unwind() {
        let mut table = InterceptTable::default();
        table.ensure_intercepted::<Thing>("Thing", &sig("a"));
        let record = table.get::<Thing>("a").unwrap();
        let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _s = Suspension::new(&record);
            panic!("boom");
        }));
        assert!(r.is_err());
        assert!(record.installed());
    }

    #[test]
    fn no_scope_passes_through() {
        assert!(!is_intercepted::<Thing>("a"));
        let out = dispatch::<Thing, _>(std::ptr::null(), "a", vec![],
                                       |_| Ok(crate::values![3u8]));
        assert_eq!(crate::values![3u8], out.unwrap());
    }
}
