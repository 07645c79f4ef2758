//! Error taxonomy for join-point registration and advised calls
//!
//! Registration errors (`UnresolvableJoinPoint`, `BindingChanged`,
//! `EmptyRegistration`) surface synchronously from `register`. Activation
//! errors (`HookNotActivated`, `AlreadyActivated`) surface at the call that
//! trips them. The remaining variants are raised by the object model while
//! dispatching calls.

use thiserror::Error;

/// Errors raised by the interception framework and its object model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AspectError {
    #[error("{name} is not a module-level function and could not be found in any top-level type")]
    UnresolvableJoinPoint { name: String },

    #[error("advice for `{join_point}` was invoked before its hook was activated")]
    HookNotActivated { join_point: String },

    #[error("hook for [{join_points}] is already activated")]
    AlreadyActivated { join_points: String },

    #[error("`{join_point}` was rebound after it was classified")]
    BindingChanged { join_point: String },

    #[error("register requires at least one join point")]
    EmptyRegistration,

    #[error("name `{name}` is not defined in module `{module}`")]
    UndefinedName { module: String, name: String },

    #[error("module `{0}` is not loaded")]
    UnknownModule(String),

    #[error("type `{type_name}` has no member `{name}`")]
    NoSuchMember { type_name: String, name: String },

    #[error("`{name}` expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("`{name}` expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("`{0}` is not callable")]
    NotCallable(String),

    #[error("{0}")]
    Raised(String),
}

pub type Result<T> = std::result::Result<T, AspectError>;
