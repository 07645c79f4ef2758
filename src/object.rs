//! Instances of [`TypeDef`]s
//!
//! Method calls on an instance resolve the member through the instance's type
//! on every call; the instance is prepended for instance members.

use crate::callable::CallableRef;
use crate::error::{AspectError, Result};
use crate::types::{MemberKind, TypeRef};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

pub type ObjectRef = Arc<Object>;

pub struct Object {
    type_def: TypeRef,
    fields: RwLock<BTreeMap<String, Value>>,
}

impl Object {
    pub fn new(type_def: TypeRef) -> ObjectRef {
        Arc::new(Self {
            type_def,
            fields: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn type_def(&self) -> &TypeRef {
        &self.type_def
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn set_field(&self, name: &str, value: impl Into<Value>) {
        self.fields
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.into());
    }

    /// Attribute access on the instance
    pub fn attr(self: &Arc<Self>, name: &str) -> Result<CallableRef> {
        let member = self
            .type_def
            .member(name)
            .ok_or_else(|| AspectError::NoSuchMember {
                type_name: self.type_def.name().to_string(),
                name: name.to_string(),
            })?;

        Ok(match member.kind {
            MemberKind::Instance => CallableRef::BoundToInstance {
                receiver: self.clone(),
                function: member.function,
            },
            MemberKind::ClassBound => CallableRef::BoundToType {
                receiver: self.type_def.clone(),
                function: member.function,
            },
            MemberKind::Static => CallableRef::Function(member.function),
        })
    }

    /// Dispatch a method by name
    pub fn call_method(self: &Arc<Self>, name: &str, args: &[Value]) -> Result<Value> {
        self.attr(name)?.call(args)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type", &self.type_def.name())
            .finish_non_exhaustive()
    }
}
