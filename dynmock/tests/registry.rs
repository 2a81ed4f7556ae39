// vim: tw=80
//! A scope keeps its mocks in declaration order, and tells them apart by the
//! identity of their targets, never by value.

use dynmock::*;
use std::{cell::RefCell, rc::Rc};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Widget {
    id: u32,
}

#[mockable]
impl Widget {
    fn id(&self) -> u32 {
        self.id
    }
}

fn widget(id: u32) -> Rc<RefCell<Widget>> {
    Rc::new(RefCell::new(Widget { id }))
}

#[test]
fn declare_and_remove() {
    let scope = MockScope::new();
    let targets = (0..4).map(widget).collect::<Vec<_>>();
    let mocks = targets.iter()
        .map(|t| scope.declare_mock(t))
        .collect::<Vec<_>>();
    assert_eq!(4, scope.len());

    // tail, head, then middle
    assert!(scope.remove(&mocks[3]));
    assert!(scope.remove(&mocks[0]));
    assert!(scope.remove(&mocks[1]));
    assert_eq!(1, scope.len());
    assert!(!scope.remove(&mocks[1]));

    assert!(scope.remove(&mocks[2]));
    assert!(scope.is_empty());
}

#[test]
fn equal_values_are_distinct_subjects() {
    let scope = MockScope::new();
    let a = widget(1);
    let b = widget(1);
    assert_eq!(*a.borrow(), *b.borrow());
    let _ma = scope.declare_mock(&a);
    let _mb = scope.declare_mock(&b);
    assert_eq!(2, scope.len());
}

#[test]
#[should_panic(expected = "mock setup failed: <Widget> is already under a mock in this scope")]
fn same_target_twice() {
    let scope = MockScope::new();
    let a = widget(1);
    let _m = scope.declare_mock(&a);
    let _m2 = scope.declare_mock(&a);
}

#[test]
fn same_target_in_different_scopes() {
    let a = widget(1);
    let outer = MockScope::new();
    let _m = outer.declare_mock(&a);
    let inner = MockScope::new();
    let _m2 = inner.declare_mock(&a);
    assert_eq!(1, outer.len());
    assert_eq!(1, inner.len());
}

#[test]
fn remove_then_redeclare() {
    let scope = MockScope::new();
    let a = widget(1);
    let m = scope.declare_mock(&a);
    assert!(scope.remove(&m));
    let _m = scope.declare_mock(&a);
    assert_eq!(1, scope.len());
}

#[test]
fn clear_all_expectations() {
    let scope = MockScope::new();
    let a = widget(1);
    let b = widget(2);
    let mut ma = scope.declare_mock(&a);
    ma.to_receive("id").once().with_returns(values![0u32]);
    let _mb = scope.declare_mock(&b);
    scope.clear_all_expectations();
    assert!(scope.is_empty());
    // Cleared mocks are no longer verified
    scope.verify();
}

#[test]
fn removed_mocks_are_not_verified() {
    let scope = MockScope::new();
    let a = widget(1);
    let mut m = scope.declare_mock(&a);
    m.to_receive("id").once().with_returns(values![0u32]);
    scope.remove(&m);
    scope.verify();
}

#[test]
fn type_name_and_target() {
    let scope = MockScope::new();
    let a = widget(7);
    let m = scope.declare_mock(&a);
    assert_eq!("Widget", m.type_name());
    assert!(Rc::ptr_eq(&a, m.target()));
}
