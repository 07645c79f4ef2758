//! References to callables as a caller holds them
//!
//! Attribute access hands out one of these forms. Classification inspects the
//! form to tell free functions, instance methods, class-bound methods and
//! static methods apart.

use crate::error::Result;
use crate::function::Function;
use crate::object::ObjectRef;
use crate::types::TypeRef;
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum CallableRef {
    /// A bare function: module-level, or a static member read through its type
    Function(Function),
    /// An instance member read through its type; the caller supplies the instance
    Unbound { owner: TypeRef, function: Function },
    /// An instance member read through an instance
    BoundToInstance { receiver: ObjectRef, function: Function },
    /// A class-bound member, bound to the type it was read through
    BoundToType { receiver: TypeRef, function: Function },
}

impl CallableRef {
    pub fn function(&self) -> &Function {
        match self {
            CallableRef::Function(function)
            | CallableRef::Unbound { function, .. }
            | CallableRef::BoundToInstance { function, .. }
            | CallableRef::BoundToType { function, .. } => function,
        }
    }

    pub fn name(&self) -> &str {
        self.function().name()
    }

    /// Invoke the reference, prepending its bound receiver if it has one
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match self {
            CallableRef::Function(function) | CallableRef::Unbound { function, .. } => {
                function.call(args)
            }
            CallableRef::BoundToInstance { receiver, function } => {
                function.call(&prepend(Value::Object(receiver.clone()), args))
            }
            CallableRef::BoundToType { receiver, function } => {
                function.call(&prepend(Value::Type(receiver.clone()), args))
            }
        }
    }
}

impl From<Function> for CallableRef {
    fn from(function: Function) -> Self {
        CallableRef::Function(function)
    }
}

pub(crate) fn prepend(first: Value, rest: &[Value]) -> Vec<Value> {
    let mut args = Vec::with_capacity(rest.len() + 1);
    args.push(first);
    args.extend_from_slice(rest);
    args
}
