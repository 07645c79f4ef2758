//! Types and their member tables
//!
//! A type's member table is a binding site: every method dispatch resolves the
//! member by name at call time, so overwriting an entry redirects all existing
//! callers. The table sits behind a `RwLock` and entries are swapped whole, so
//! a concurrent lookup sees either the old member or the new one.

use crate::callable::CallableRef;
use crate::error::{AspectError, Result};
use crate::function::Function;
use crate::object::{Object, ObjectRef};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

pub type TypeRef = Arc<TypeDef>;

/// How a member receives its receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Receives the instance as its first argument
    Instance,
    /// Receives the (possibly derived) type as its first argument
    ClassBound,
    /// Receives no receiver
    Static,
}

/// An entry in a member table
#[derive(Debug, Clone)]
pub struct Member {
    pub kind: MemberKind,
    pub function: Function,
}

/// A named type with an optional base type and a mutable member table
pub struct TypeDef {
    name: String,
    module: String,
    base: Option<TypeRef>,
    members: RwLock<BTreeMap<String, Member>>,
}

impl TypeDef {
    pub fn builder(name: &str) -> TypeBuilder {
        TypeBuilder {
            name: name.to_string(),
            base: None,
            methods: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn base(&self) -> Option<&TypeRef> {
        self.base.as_ref()
    }

    /// Member declared directly on this type (bases are not consulted)
    pub fn own_member(&self, name: &str) -> Option<Member> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Member resolved through this type and then its bases
    pub fn member(&self, name: &str) -> Option<Member> {
        self.own_member(name)
            .or_else(|| self.base.as_ref().and_then(|b| b.member(name)))
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Overwrite (or add) a member, returning the previous entry
    pub fn set_member(&self, name: &str, member: Member) -> Option<Member> {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), member)
    }

    /// Set `member` under `name` only if `name` still resolves to `expected`
    ///
    /// The own entry is checked under the write lock; a name this type does
    /// not declare is checked through the bases and then shadowed here.
    pub fn replace_member_if(&self, name: &str, expected: &Function, member: Member) -> bool {
        let mut members = self
            .members
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let holds = match members.get(name) {
            Some(current) => current.function.is(expected),
            None => self
                .base
                .as_ref()
                .and_then(|b| b.member(name))
                .is_some_and(|inherited| inherited.function.is(expected)),
        };
        if !holds {
            return false;
        }
        members.insert(name.to_string(), member);
        true
    }

    /// True if `self` is `other` or derives from it
    pub fn is_subtype_of(&self, other: &TypeDef) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.base.as_ref().is_some_and(|b| b.is_subtype_of(other))
    }

    /// The type, walking from `self` through its bases, whose own member table
    /// holds `function` under `name`
    pub fn declaring_type_of(self: &Arc<Self>, name: &str, function: &Function) -> Option<TypeRef> {
        let mut current = Some(self.clone());
        while let Some(ty) = current {
            if ty
                .own_member(name)
                .is_some_and(|m| m.function.is(function))
            {
                return Some(ty);
            }
            current = ty.base.clone();
        }
        None
    }

    /// Attribute access on the type itself
    ///
    /// Instance members come back unbound, class-bound members come back bound
    /// to this type, and static members come back as the bare function.
    pub fn attr(self: &Arc<Self>, name: &str) -> Result<CallableRef> {
        let member = self.lookup(name)?;
        Ok(match member.kind {
            MemberKind::Instance => CallableRef::Unbound {
                owner: self.clone(),
                function: member.function,
            },
            MemberKind::ClassBound => CallableRef::BoundToType {
                receiver: self.clone(),
                function: member.function,
            },
            MemberKind::Static => CallableRef::Function(member.function),
        })
    }

    /// Call a member through the type
    ///
    /// Class-bound members receive this type as their first argument. Instance
    /// members called this way expect the instance among `args`.
    pub fn call(self: &Arc<Self>, name: &str, args: &[Value]) -> Result<Value> {
        self.attr(name)?.call(args)
    }

    pub fn instantiate(self: &Arc<Self>) -> ObjectRef {
        Object::new(self.clone())
    }

    fn lookup(&self, name: &str) -> Result<Member> {
        self.member(name).ok_or_else(|| AspectError::NoSuchMember {
            type_name: self.name.clone(),
            name: name.to_string(),
        })
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("base", &self.base.as_ref().map(|b| b.name.clone()))
            .field("members", &self.member_names())
            .finish()
    }
}

type MethodBody = Box<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Builder for [`TypeDef`]
///
/// Member functions are created when the type is built, so they record the
/// declaring module the type is built into.
pub struct TypeBuilder {
    name: String,
    base: Option<TypeRef>,
    methods: Vec<(String, MemberKind, Option<usize>, MethodBody)>,
}

impl TypeBuilder {
    pub fn base(mut self, base: &TypeRef) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Add an instance method; `arity` counts the explicit arguments only
    pub fn instance_method<F>(self, name: &str, arity: usize, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.method(name, MemberKind::Instance, Some(arity + 1), body)
    }

    /// Add a class-bound method; `arity` counts the explicit arguments only
    pub fn class_method<F>(self, name: &str, arity: usize, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.method(name, MemberKind::ClassBound, Some(arity + 1), body)
    }

    pub fn static_method<F>(self, name: &str, arity: usize, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.method(name, MemberKind::Static, Some(arity), body)
    }

    fn method<F>(mut self, name: &str, kind: MemberKind, arity: Option<usize>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods
            .push((name.to_string(), kind, arity, Box::new(body)));
        self
    }

    /// Build the type as declared in `module`
    pub fn build(self, module: &str) -> TypeRef {
        let members = self
            .methods
            .into_iter()
            .map(|(name, kind, arity, body)| {
                let function = Function::new(&name, module, arity, move |args| body(args));
                (name, Member { kind, function })
            })
            .collect();

        Arc::new(TypeDef {
            name: self.name,
            module: module.to_string(),
            base: self.base,
            members: RwLock::new(members),
        })
    }
}
