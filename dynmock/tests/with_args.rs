// vim: tw=80
//! Argument matching, and argument type checking

use dynmock::*;
use std::{cell::RefCell, rc::Rc};

#[derive(Default)]
pub struct Greeter {}

#[mockable]
impl Greeter {
    fn greet(&self, name: String, times: i32) -> String {
        name.repeat(times as usize)
    }
}

fn greeter() -> Rc<RefCell<Greeter>> {
    Rc::new(RefCell::new(Greeter::default()))
}

mod guards {
    use super::*;

    #[test]
    #[should_panic(expected = "mock setup failed: cannot call with_args() on <Greeter>.greet: arguments already declared")]
    fn with_args_twice() {
        let scope = MockScope::new();
        let g = greeter();
        let mut mock = scope.declare_mock(&g);
        mock.to_receive("greet")
            .with_args(values!["a".to_string(), 1i32])
            .with_args(values!["b".to_string(), 2i32]);
    }

    #[test]
    #[should_panic(expected = "mock setup failed: cannot call with_any_args() on <Greeter>.greet: arguments already declared")]
    fn with_any_args_after_with_args() {
        let scope = MockScope::new();
        let g = greeter();
        let mut mock = scope.declare_mock(&g);
        mock.to_receive("greet")
            .with_args(values!["a".to_string(), 1i32])
            .with_any_args();
    }

    #[test]
    #[should_panic(expected = "mock setup failed: cannot call with_args() on <Greeter>.greet: arguments already declared")]
    fn with_args_after_with_any_args() {
        let scope = MockScope::new();
        let g = greeter();
        let mut mock = scope.declare_mock(&g);
        mock.to_receive("greet")
            .with_any_args()
            .with_args(values!["a".to_string(), 1i32]);
    }

    #[test]
    #[should_panic(expected = "mock setup failed: cannot call with_any_args() on <Greeter>.greet: arguments already declared")]
    fn with_any_args_twice() {
        let scope = MockScope::new();
        let g = greeter();
        let mut mock = scope.declare_mock(&g);
        mock.to_receive("greet")
            .with_any_args()
            .with_any_args();
    }

    #[test]
    #[should_panic(expected = "mock setup failed: with_args() called before to_receive()")]
    fn before_to_receive() {
        let scope = MockScope::new();
        let g = greeter();
        let mut mock = scope.declare_mock(&g);
        mock.with_args(values!["a".to_string(), 1i32]);
    }
}

mod types {
    use super::*;

    #[test]
    #[should_panic(expected = "with_args() called with mismatched signature:\nmethod         : <Greeter>.greet\ntypes expected : <String>, <i32>\ntypes received : <&str>, <i32>")]
    fn wrong_type() {
        let scope = MockScope::new();
        let g = greeter();
        let mut mock = scope.declare_mock(&g);
        mock.to_receive("greet").with_args(values!["a", 1i32]);
    }

    #[test]
    #[should_panic(expected = "types received : <String>")]
    fn too_few() {
        let scope = MockScope::new();
        let g = greeter();
        let mut mock = scope.declare_mock(&g);
        mock.to_receive("greet").with_args(values!["a".to_string()]);
    }

    #[test]
    #[should_panic(expected = "mock call failed: mock method called with invalid arguments signature:\nmethod         : <Greeter>.greet\ntypes expected : <String>, <i32>\ntypes received : <i32>, <String>")]
    fn call_with_wrong_types() {
        let scope = MockScope::new();
        let g = greeter();
        let mut mock = scope.declare_mock(&g);
        mock.to_receive("greet").with_returns(values![String::new()]);
        mock.call("greet", values![1i32, "a".to_string()]);
    }

    /// Mistyped calls are recorded before they are rejected
    #[test]
    fn mistyped_call_is_recorded() {
        let scope = MockScope::new();
        let g = greeter();
        let mut mock = scope.declare_mock(&g);
        mock.to_receive("greet").with_any_args()
            .with_returns(values![String::new()]);
        let e = mock.try_call("greet", values![1u8]).unwrap_err();
        assert_eq!(ErrorKind::Runtime, e.kind());
        assert_eq!(values![1u8], mock.calls("greet")[0].args());
    }
}

#[test]
fn matching_call() {
    let scope = MockScope::new();
    let g = greeter();
    let mut mock = scope.declare_mock(&g);
    mock.to_receive("greet")
        .with_args(values!["a".to_string(), 3i32])
        .with_returns(values!["hi".to_string()]);
    let out = mock.call("greet", values!["a".to_string(), 3i32]);
    assert_eq!(values!["hi".to_string()], out);
}

#[test]
#[should_panic(expected = "mock call failed: <Greeter>.greet didn't match arguments:\nargument 1:")]
fn mismatched_values() {
    let scope = MockScope::new();
    let g = greeter();
    let mut mock = scope.declare_mock(&g);
    mock.to_receive("greet")
        .with_args(values!["a".to_string(), 3i32])
        .with_returns(values!["hi".to_string()]);
    mock.call("greet", values!["a".to_string(), 4i32]);
}

#[test]
fn any_args() {
    let scope = MockScope::new();
    let g = greeter();
    let mut mock = scope.declare_mock(&g);
    mock.to_receive("greet")
        .with_any_args()
        .with_returns(values!["hi".to_string()]);
    for i in 0..3 {
        mock.call("greet", values![i.to_string(), i]);
    }
    let recorded = mock.calls("greet")
        .iter()
        .map(|c| c.args()[1].downcast_ref::<i32>().copied())
        .collect::<Vec<_>>();
    assert_eq!(vec![Some(0), Some(1), Some(2)], recorded);
}

#[test]
#[should_panic(expected = "mock call failed: method not found within mock: <Greeter>.greet")]
fn undeclared_method() {
    let scope = MockScope::new();
    let g = greeter();
    let mock = scope.declare_mock(&g);
    mock.call("greet", values!["a".to_string(), 1i32]);
}

#[test]
#[should_panic(expected = "mock setup failed: cannot create expectation to_receive(\"wave\"): method not found within <Greeter>")]
fn unknown_method() {
    let scope = MockScope::new();
    let g = greeter();
    let mut mock = scope.declare_mock(&g);
    mock.to_receive("wave");
}

#[test]
#[should_panic(expected = "mock setup failed: <Greeter>.greet is already expected")]
fn method_declared_twice() {
    let scope = MockScope::new();
    let g = greeter();
    let mut mock = scope.declare_mock(&g);
    mock.to_receive("greet").to_receive("greet");
}
