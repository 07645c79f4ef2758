//! Dynamic values passed to join points, advice, and continuations
//!
//! Advice may call its continuation with arguments that differ from the ones it
//! received, and one advice may serve join points of different shapes, so all
//! arguments travel as [`Value`].

use crate::error::{AspectError, Result};
use crate::object::ObjectRef;
use crate::types::TypeRef;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A dynamically typed argument or return value
#[derive(Debug, Clone, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    #[serde(serialize_with = "serialize_object")]
    Object(ObjectRef),
    #[serde(serialize_with = "serialize_type")]
    Type(TypeRef),
}

fn serialize_object<S: Serializer>(object: &ObjectRef, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("<{} object>", object.type_def().name()))
}

fn serialize_type<S: Serializer>(ty: &TypeRef, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("<type {}>", ty.name()))
}

impl Value {
    /// Short name of the variant, used in type mismatch errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Type(_) => "type",
        }
    }

    pub fn as_str(&self, context: &str) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(mismatch(context, "str", other)),
        }
    }

    pub fn as_int(&self, context: &str) -> Result<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch(context, "int", other)),
        }
    }

    pub fn as_object(&self, context: &str) -> Result<&ObjectRef> {
        match self {
            Value::Object(o) => Ok(o),
            other => Err(mismatch(context, "object", other)),
        }
    }

    pub fn as_type(&self, context: &str) -> Result<&TypeRef> {
        match self {
            Value::Type(t) => Ok(t),
            other => Err(mismatch(context, "type", other)),
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }
}

fn mismatch(context: &str, expected: &'static str, actual: &Value) -> AspectError {
    AspectError::TypeMismatch {
        name: context.to_string(),
        expected,
        actual: actual.kind_name(),
    }
}

// Objects and types compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(o) => write!(f, "<{} object>", o.type_def().name()),
            Value::Type(t) => write!(f, "<type {}>", t.name()),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl From<TypeRef> for Value {
    fn from(t: TypeRef) -> Self {
        Value::Type(t)
    }
}
