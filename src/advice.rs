//! Advice functions and the continuation they receive
//!
//! Every advice gets the same shape regardless of join point kind: the
//! receiver (none, an instance, or a type), a continuation into the original
//! behavior, and the call's arguments.

use crate::classifier::JoinPointKind;
use crate::error::{AspectError, Result};
use crate::object::ObjectRef;
use crate::types::TypeRef;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// The receiver an advised call was made on
#[derive(Debug, Clone)]
pub enum Receiver {
    /// Free functions and static methods
    None,
    /// Instance methods: the instance the method was called on
    Instance(ObjectRef),
    /// Class-bound methods: the type used at the call site
    Type(TypeRef),
}

// Receivers compare by identity.
impl PartialEq for Receiver {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Receiver::None, Receiver::None) => true,
            (Receiver::Instance(a), Receiver::Instance(b)) => Arc::ptr_eq(a, b),
            (Receiver::Type(a), Receiver::Type(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Receiver {
    pub fn is_none(&self) -> bool {
        matches!(self, Receiver::None)
    }

    pub fn as_value(&self) -> Option<Value> {
        match self {
            Receiver::None => None,
            Receiver::Instance(o) => Some(Value::Object(o.clone())),
            Receiver::Type(t) => Some(Value::Type(t.clone())),
        }
    }
}

type Target = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// Re-enters the behavior beneath the current advice layer
///
/// Any receiver the original needs is already captured; callers pass only the
/// explicit arguments, which may differ from the ones the advice received.
#[derive(Clone)]
pub struct Continuation {
    target: Arc<Target>,
}

impl Continuation {
    pub fn new<F>(target: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            target: Arc::new(target),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.target)(args)
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Continuation")
    }
}

/// One advised call as seen by the advice
#[derive(Debug, Clone)]
pub struct Invocation {
    pub receiver: Receiver,
    /// Name the join point is bound under
    pub join_point: String,
    pub kind: JoinPointKind,
    pub next: Continuation,
    /// Explicit arguments, receiver excluded
    pub args: Vec<Value>,
}

impl Invocation {
    pub fn arg(&self, index: usize) -> Result<&Value> {
        self.args.get(index).ok_or_else(|| AspectError::ArityMismatch {
            name: self.join_point.clone(),
            expected: index + 1,
            actual: self.args.len(),
        })
    }

    /// Continue with the arguments unchanged
    pub fn proceed(&self) -> Result<Value> {
        self.next.call(&self.args)
    }

    /// Continue with replacement arguments
    pub fn proceed_with(&self, args: &[Value]) -> Result<Value> {
        self.next.call(args)
    }
}

/// Replacement behavior installed around one or more join points
pub trait Advice: Send + Sync {
    fn invoke(&self, invocation: &Invocation) -> Result<Value>;
}

impl<F> Advice for F
where
    F: Fn(&Invocation) -> Result<Value> + Send + Sync,
{
    fn invoke(&self, invocation: &Invocation) -> Result<Value> {
        self(invocation)
    }
}

pub type AdviceRef = Arc<dyn Advice>;
