//! Callable values with stable identity
//!
//! A [`Function`] is a cheap handle (an `Arc`) around a body closure. Two
//! handles are the same function only if they share the allocation, which is
//! what classification uses to decide whether a symbol table entry *is* the
//! callable being advised.

use crate::error::{AspectError, Result};
use crate::value::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Signature shared by every function body
pub type Body = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique function identifier, used for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(u64);

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn#{}", self.0)
    }
}

struct FunctionInner {
    id: FunctionId,
    name: String,
    module: String,
    /// Positional parameter count, receiver included (None = variadic)
    arity: Option<usize>,
    body: Box<Body>,
}

/// A named callable declared in a module
#[derive(Clone)]
pub struct Function {
    inner: Arc<FunctionInner>,
}

impl Function {
    pub fn new<F>(name: &str, module: &str, arity: Option<usize>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(FunctionInner {
                id: FunctionId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
                name: name.to_string(),
                module: module.to_string(),
                arity,
                body: Box::new(body),
            }),
        }
    }

    pub fn id(&self) -> FunctionId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Name of the module whose symbol table the function was declared in
    pub fn module(&self) -> &str {
        &self.inner.module
    }

    pub fn arity(&self) -> Option<usize> {
        self.inner.arity
    }

    /// Identity comparison
    pub fn is(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Invoke the body after checking the argument count
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        if let Some(expected) = self.inner.arity {
            if expected != args.len() {
                return Err(AspectError::ArityMismatch {
                    name: self.inner.name.clone(),
                    expected,
                    actual: args.len(),
                });
            }
        }
        (self.inner.body)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("module", &self.inner.module)
            .field("arity", &self.inner.arity)
            .finish()
    }
}
