// vim: tw=80
//! The ordered list of live mocks in a scope.

use std::rc::Rc;

use crate::{
    error::MockError,
    mock::{Identity, MockInstance},
};

/// Membership is decided by reference identity only, never by value.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    mocks: Vec<Rc<MockInstance>>,
}

impl Registry {
    /// Append `instance`.  Its target must not already be under a mock.
    pub fn register(&mut self, instance: Rc<MockInstance>)
        -> Result<(), MockError>
    {
        if self.find(instance.identity()).is_some() {
            return Err(MockError::AlreadyMocked {
                type_name: instance.type_name().to_string()
            });
        }
        self.mocks.push(instance);
        Ok(())
    }

    /// Remove `instance`, keeping the others in order.  Returns whether it
    /// was present.
    pub fn unregister(&mut self, instance: &Rc<MockInstance>) -> bool {
        match self.mocks.iter().position(|m| Rc::ptr_eq(m, instance)) {
            Some(i) => {
                self.mocks.remove(i);
                true
            },
            None => false
        }
    }

    pub fn clear(&mut self) {
        self.mocks.clear();
    }

    pub fn len(&self) -> usize {
        self.mocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mocks.is_empty()
    }

    /// The mock whose target has the given identity
    pub fn find(&self, identity: Identity) -> Option<Rc<MockInstance>> {
        self.mocks.iter()
            .find(|m| m.identity() == identity)
            .cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<MockInstance>> {
        self.mocks.iter()
    }
}
