// vim: tw=80
//! Setup and runtime errors.
//!
//! Every fallible operation inside the crate returns a [`MockError`].  The
//! public, fluent API turns them into panics with [`fatal`], because a test
//! that misconfigured or misused a mock cannot validate anything further.

use thiserror::Error;

/// When was the contract violation discovered?
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// While declaring expectations
    Setup,
    /// While dispatching a call
    Runtime,
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum MockError {
    #[error("cannot create expectation to_receive(\"{method}\"): method not found within <{type_name}>")]
    MethodNotFound { type_name: String, method: String },

    #[error("{modifier} called before to_receive(); to_receive must be declared before other expectations")]
    ModifierBeforeDeclare { modifier: &'static str },

    #[error("cannot call {modifier} on {method}: arguments already declared")]
    ArgsAlreadyDeclared { modifier: &'static str, method: String },

    #[error("cannot call {modifier} on {method}: returns already declared")]
    ReturnsAlreadyDeclared { modifier: &'static str, method: String },

    #[error("cannot call and_calls_original() on {method}: delegation already declared")]
    DelegationAlreadyDeclared { method: String },

    #[error("{method} is already expected; each method may be declared once per mock")]
    DuplicateMethod { method: String },

    #[error("with_args() called with mismatched signature:\nmethod         : {method}\ntypes expected : {expected}\ntypes received : {received}")]
    WithArgsMismatch { method: String, expected: String, received: String },

    #[error("with_returns() called with mismatched signature:\nmethod         : {method}\ntypes expected : {expected}\ntypes received : {received}")]
    WithReturnsMismatch { method: String, expected: String, received: String },

    #[error("<{type_name}> is already under a mock in this scope")]
    AlreadyMocked { type_name: String },

    #[error("as_partial() on <{type_name}>: partial mocking is not enabled (build dynmock with the \"partial\" feature)")]
    PartialUnsupported { type_name: String },

    #[error("method not found within mock: {method}")]
    MockMethodNotFound { method: String },

    #[error("method called but never was expected:\nmethod   : {method}\nwithargs : {args}")]
    CalledButNeverExpected { method: String, args: String },

    #[error("mock method called with invalid arguments signature:\nmethod         : {method}\ntypes expected : {expected}\ntypes received : {received}")]
    InvalidArgsSignature { method: String, expected: String, received: String },

    #[error("{method} didn't match arguments:\n{detail}")]
    ArgsMismatch { method: String, detail: String },

    #[error("method called without return value declaration within mock: {method}\nmust either declare a return value (with_returns) or delegate to the real implementation (and_calls_original)")]
    ReturnsNotDefined { method: String },

    #[error("cannot call the original {method}: <{type_name}> is already borrowed")]
    TargetBorrowed { type_name: String, method: String },

    #[error("{method}: argument {position} expected {expected}, received {received}")]
    ArgumentMismatch {
        method: String,
        position: usize,
        expected: String,
        received: String,
    },

    #[error("{method}: return values expected {expected}, received {received}")]
    ReturnMismatch { method: String, expected: String, received: String },

    #[error("<{type_name}> has no introspectable method {method}")]
    UnknownMethod { type_name: String, method: String },
}

impl MockError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MockError::MethodNotFound { .. }
            | MockError::ModifierBeforeDeclare { .. }
            | MockError::ArgsAlreadyDeclared { .. }
            | MockError::ReturnsAlreadyDeclared { .. }
            | MockError::DelegationAlreadyDeclared { .. }
            | MockError::DuplicateMethod { .. }
            | MockError::WithArgsMismatch { .. }
            | MockError::WithReturnsMismatch { .. }
            | MockError::AlreadyMocked { .. }
            | MockError::PartialUnsupported { .. } => ErrorKind::Setup,
            _ => ErrorKind::Runtime
        }
    }
}

/// Abort the current test with `err`.
///
/// Used by the fluent API and by code generated by `#[mockable]`.
#[doc(hidden)]
#[track_caller]
pub fn fatal(err: MockError) -> ! {
    match err.kind() {
        ErrorKind::Setup => panic!("mock setup failed: {err}"),
        ErrorKind::Runtime => panic!("mock call failed: {err}"),
    }
}
