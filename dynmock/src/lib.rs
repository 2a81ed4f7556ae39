// vim: tw=80
//! Expectation-based mocks of live objects.
//!
//! Dynmock lets a test declare, method by method, how a real object is
//! expected to be used: which methods will be called, how many times, with
//! which arguments, and what they should return.  Calls are then made either
//! directly on the mock, or on the real object itself, whose methods are
//! routed through the mock for as long as the test's [`MockScope`] lives.
//! Finally the scope verifies that every expectation was met.
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Call counts`](#call-counts)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Return values`](#return-values)
//! * [`Calling the original`](#calling-the-original)
//! * [`Partial mocks`](#partial-mocks)
//! * [`Verification`](#verification)
//! * [`Crate features`](#crate-features)
//!
//! ## Getting Started
//!
//! Mark an inherent `impl` block with [`#[mockable]`](mockable).  That makes
//! its methods discoverable and callable by name, which is all a mock needs.
//! Then, in your test, create a [`MockScope`] and declare mocks within it.
//! ```
//! use dynmock::*;
//! use std::{cell::RefCell, rc::Rc};
//!
//! #[derive(Default)]
//! struct Calculator {}
//!
//! #[mockable]
//! impl Calculator {
//!     fn f(&self, _s: String, n: i32) -> i32 {
//!         n
//!     }
//! }
//!
//! let scope = MockScope::new();
//! let calc = Rc::new(RefCell::new(Calculator::default()));
//! let mut mock = scope.declare_mock(&calc);
//! mock.to_receive("f")
//!     .once()
//!     .with_returns(values![19i32]);
//! assert_eq!(values![19i32], mock.call("f", values!["x".to_string(), 5i32]));
//! scope.verify();
//! ```
//!
//! Every modifier acts on the method most recently named by
//! [`to_receive`](Mock::to_receive).  Misusing them, for example by calling
//! [`with_returns`](Mock::with_returns) twice, or by naming a method the
//! target doesn't have, panics immediately.
//!
//! ## Call counts
//!
//! By default a method may be called any number of times.
//! [`once`](Mock::once), [`twice`](Mock::twice) and [`times`](Mock::times)
//! demand an exact count, checked during verification.
//! [`never`](Mock::never) forbids calls: the first one panics on the spot.
//! [`maybe`](Mock::maybe) and `times(0)` lift any constraint again.
//!
//! ## Matching arguments
//!
//! [`with_args`](Mock::with_args) restricts a method to exactly the given
//! argument values, and [`with_any_args`](Mock::with_any_args) explicitly
//! accepts anything.  Only one of them may be used per method.  Whatever the
//! matcher, a call whose arguments don't have the method's parameter types
//! is always an error.
//! ```should_panic
//! # use dynmock::*;
//! # use std::{cell::RefCell, rc::Rc};
//! # #[derive(Default)]
//! # struct Calculator {}
//! # #[mockable]
//! # impl Calculator {
//! #     fn f(&self, _s: String, n: i32) -> i32 { n }
//! # }
//! let scope = MockScope::new();
//! let calc = Rc::new(RefCell::new(Calculator::default()));
//! let mut mock = scope.declare_mock(&calc);
//! mock.to_receive("f")
//!     .with_args(values!["x".to_string(), 5i32])
//!     .with_returns(values![0i32]);
//! mock.call("f", values!["y".to_string(), 5i32]);   // panics
//! ```
//!
//! ## Return values
//!
//! [`with_returns`](Mock::with_returns) takes a list of values: empty for
//! methods that return `()`, otherwise exactly one value of the method's
//! return type.  A called method must either have declared returns, or
//! delegate to its real implementation.
//!
//! ## Calling the original
//!
//! [`and_calls_original`](Mock::and_calls_original) runs the real method for
//! every call, and returns whatever it returned.  If returns were declared
//! too, the caller gets those instead, but the real output is still recorded
//! in the method's [`CallRecord`]s, and verification reports any call whose
//! real output differed from the declared one.
//!
//! ## Partial mocks
//!
//! [`as_partial`](Mock::as_partial) intercepts every declared method of the
//! mocked type.  From then on, until the scope is dropped, calling one of
//! those methods on the mocked object goes through the mock, while calling
//! it on any other object of the same type runs the real implementation as
//! usual.
#![cfg_attr(feature = "partial", doc = "```")]
#![cfg_attr(not(feature = "partial"), doc = "```should_panic")]
//! # use dynmock::*;
//! # use std::{cell::RefCell, rc::Rc};
//! # #[derive(Default)]
//! # struct Calculator {}
//! # #[mockable]
//! # impl Calculator {
//! #     fn f(&self, _s: String, n: i32) -> i32 { n }
//! # }
//! let scope = MockScope::new();
//! let calc = Rc::new(RefCell::new(Calculator::default()));
//! let other = Calculator::default();
//! let mut mock = scope.declare_mock(&calc);
//! mock.to_receive("f").with_returns(values![19i32]);
//! let calc = mock.as_partial();
//!
//! assert_eq!(19, calc.borrow().f("x".to_string(), 5));
//! assert_eq!(5, other.f("x".to_string(), 5));
//! assert_eq!(1, mock.call_count("f"));
//! ```
//!
//! ## Verification
//!
//! [`MockScope::verify`] panics with every unmet expectation of every mock.
//! For finer control, [`MockScope::assert_all_expectations`] and
//! [`Mock::assert`] report failures through any [`Reporter`], continuing
//! after each one.  A scope built with
//! [`verify_on_drop`](ScopeConfigBuilder::verify_on_drop) verifies itself
//! when dropped.
//!
//! ## Crate features
//!
//! * `partial` - Generate the interception hooks that partial mocks rely
//!   on.  Enabled by default.  Without it, [`Mock::as_partial`] panics, and
//!   methods marked `#[mockable]` compile to exactly their original bodies.

use cfg_if::cfg_if;

mod error;
mod expectation;
pub mod interception;
mod introspect;
mod mock;
mod registry;
mod report;
mod scope;
mod value;

pub use dynmock_derive::mockable;

pub use crate::{
    error::{fatal, ErrorKind, MockError},
    expectation::{CallRecord, Times},
    introspect::{Introspectable, MethodSignature, Receiver},
    mock::Mock,
    report::{Failures, Reporter},
    scope::{MockScope, ScopeConfig, ScopeConfigBuilder},
    value::{returns, ArgReader, TypeInfo, Value},
};

cfg_if! {
    if #[cfg(feature = "partial")] {
        /// Can mocks in this build intercept real calls?
        pub const PARTIAL: bool = true;
    } else {
        /// Can mocks in this build intercept real calls?
        pub const PARTIAL: bool = false;
    }
}
