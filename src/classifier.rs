//! Join-point classification
//!
//! Decides what kind of callable a [`CallableRef`] denotes and where it is
//! bound, so that the replacement can be installed where every existing caller
//! will find it:
//!
//! 1. bound to a type: class-bound method, bound in the type's member table
//! 2. bound to an instance, or an unbound member: instance method, bound in the
//!    declaring type's member table
//! 3. a bare function that its declaring module binds under its name: free
//!    function, bound in the module's symbol table
//! 4. a bare function held as a static member by a type of that module:
//!    static method, bound in that type's member table
//!
//! Receiver-bound forms are decided before the module is consulted, since a
//! method's function may share its name with an unrelated module entry.

use crate::callable::CallableRef;
use crate::error::{AspectError, Result};
use crate::function::Function;
use crate::module::{Entry, ModuleRef};
use crate::runtime::Runtime;
use crate::types::{Member, MemberKind, TypeRef};
use serde::Serialize;
use std::fmt;

/// What kind of callable a join point is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPointKind {
    Free,
    Instance,
    ClassBound,
    Static,
}

impl JoinPointKind {
    /// Member kind installed at a type binding site (None for free functions)
    pub fn member_kind(self) -> Option<MemberKind> {
        match self {
            JoinPointKind::Free => None,
            JoinPointKind::Instance => Some(MemberKind::Instance),
            JoinPointKind::ClassBound => Some(MemberKind::ClassBound),
            JoinPointKind::Static => Some(MemberKind::Static),
        }
    }

    /// Human-readable name, as shown by `Display`
    pub fn describe(self) -> &'static str {
        match self {
            JoinPointKind::Free => "free function",
            JoinPointKind::Instance => "instance method",
            JoinPointKind::ClassBound => "class-bound method",
            JoinPointKind::Static => "static method",
        }
    }

    pub fn from_member_kind(kind: MemberKind) -> Self {
        match kind {
            MemberKind::Instance => JoinPointKind::Instance,
            MemberKind::ClassBound => JoinPointKind::ClassBound,
            MemberKind::Static => JoinPointKind::Static,
        }
    }
}

impl fmt::Display for JoinPointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Where a join point is bound
#[derive(Debug, Clone)]
pub enum BindingSite {
    /// Entry in a module's symbol table
    Module { module: ModuleRef, name: String },
    /// Entry in a type's member table
    Member { owner: TypeRef, name: String },
}

impl BindingSite {
    pub fn owner_name(&self) -> &str {
        match self {
            BindingSite::Module { module, .. } => module.name(),
            BindingSite::Member { owner, .. } => owner.name(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BindingSite::Module { name, .. } | BindingSite::Member { name, .. } => name,
        }
    }
}

/// A classified join point: kind, binding site, and the callable found there
#[derive(Debug, Clone)]
pub struct JoinPoint {
    kind: JoinPointKind,
    site: BindingSite,
    original: Function,
}

impl JoinPoint {
    /// A module-level function, owner given explicitly
    pub fn free(module: &ModuleRef, name: &str) -> Result<Self> {
        match module.get(name) {
            Some(Entry::Function(original)) => Ok(Self {
                kind: JoinPointKind::Free,
                site: BindingSite::Module {
                    module: module.clone(),
                    name: name.to_string(),
                },
                original,
            }),
            _ => Err(unresolvable(name)),
        }
    }

    /// An instance method of `owner`
    pub fn instance(owner: &TypeRef, name: &str) -> Result<Self> {
        Self::member(owner, name, MemberKind::Instance)
    }

    /// A class-bound method of `owner`
    pub fn class_bound(owner: &TypeRef, name: &str) -> Result<Self> {
        Self::member(owner, name, MemberKind::ClassBound)
    }

    /// A static method of `owner`, with no identity search
    pub fn static_method(owner: &TypeRef, name: &str) -> Result<Self> {
        Self::member(owner, name, MemberKind::Static)
    }

    fn member(owner: &TypeRef, name: &str, expected: MemberKind) -> Result<Self> {
        let Member { kind, function } = owner.member(name).ok_or_else(|| unresolvable(name))?;
        if kind != expected {
            return Err(AspectError::TypeMismatch {
                name: format!("{}.{}", owner.name(), name),
                expected: JoinPointKind::from_member_kind(expected).describe(),
                actual: JoinPointKind::from_member_kind(kind).describe(),
            });
        }
        Ok(Self::at_member(JoinPointKind::from_member_kind(kind), owner, name, function))
    }

    fn at_member(kind: JoinPointKind, owner: &TypeRef, name: &str, original: Function) -> Self {
        Self {
            kind,
            site: BindingSite::Member {
                owner: owner.clone(),
                name: name.to_string(),
            },
            original,
        }
    }

    pub fn kind(&self) -> JoinPointKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        self.site.name()
    }

    pub fn site(&self) -> &BindingSite {
        &self.site
    }

    /// The callable bound at the site when the join point was classified
    pub fn original(&self) -> &Function {
        &self.original
    }

    /// Owning type for member join points
    pub fn owner_type(&self) -> Option<&TypeRef> {
        match &self.site {
            BindingSite::Member { owner, .. } => Some(owner),
            BindingSite::Module { .. } => None,
        }
    }

    /// `owner.name`, for diagnostics
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.site.owner_name(), self.site.name())
    }
}

fn unresolvable(name: &str) -> AspectError {
    AspectError::UnresolvableJoinPoint {
        name: name.to_string(),
    }
}

/// Classifies callable references against a runtime's modules
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'rt> {
    runtime: &'rt Runtime,
    static_search: bool,
}

impl<'rt> Classifier<'rt> {
    pub fn new(runtime: &'rt Runtime) -> Self {
        Self {
            runtime,
            static_search: true,
        }
    }

    /// Whether bare functions not bound in their module are looked for among
    /// the module's types as static members
    pub fn with_static_search(mut self, enabled: bool) -> Self {
        self.static_search = enabled;
        self
    }

    pub fn classify(&self, callable: &CallableRef) -> Result<JoinPoint> {
        let join_point = match callable {
            CallableRef::BoundToType { receiver, function } => {
                self.class_bound_member(receiver, function)?
            }
            CallableRef::BoundToInstance { receiver, function } => {
                self.instance_member(receiver.type_def(), function)?
            }
            CallableRef::Unbound { owner, function } => self.instance_member(owner, function)?,
            CallableRef::Function(function) => self.module_level(function)?,
        };

        tracing::debug!(
            join_point = %join_point.qualified_name(),
            kind = %join_point.kind(),
            function = %join_point.original().id(),
            "classified join point"
        );
        Ok(join_point)
    }

    fn class_bound_member(&self, receiver: &TypeRef, function: &Function) -> Result<JoinPoint> {
        let name = function.name();
        let bound = receiver.member(name).is_some_and(|m| {
            m.kind == MemberKind::ClassBound && m.function.is(function)
        });
        if !bound {
            return Err(unresolvable(name));
        }
        Ok(JoinPoint::at_member(
            JoinPointKind::ClassBound,
            receiver,
            name,
            function.clone(),
        ))
    }

    fn instance_member(&self, accessed: &TypeRef, function: &Function) -> Result<JoinPoint> {
        let declaring = accessed
            .declaring_type_of(function.name(), function)
            .ok_or_else(|| unresolvable(function.name()))?;
        Ok(JoinPoint::at_member(
            JoinPointKind::Instance,
            &declaring,
            function.name(),
            function.clone(),
        ))
    }

    fn module_level(&self, function: &Function) -> Result<JoinPoint> {
        let name = function.name();
        let module = self
            .runtime
            .module(function.module())
            .map_err(|_| unresolvable(name))?;

        if let Some(Entry::Function(bound)) = module.get(name) {
            if bound.is(function) {
                return Ok(JoinPoint {
                    kind: JoinPointKind::Free,
                    site: BindingSite::Module {
                        module,
                        name: name.to_string(),
                    },
                    original: function.clone(),
                });
            }
        }

        if self.static_search {
            let owner = module.types().into_iter().find(|ty| {
                ty.own_member(name).is_some_and(|m| {
                    m.kind == MemberKind::Static && m.function.is(function)
                })
            });
            if let Some(owner) = owner {
                return Ok(JoinPoint::at_member(JoinPointKind::Static, &owner, name, function.clone()));
            }
        }

        Err(unresolvable(name))
    }
}

/// Classify with the default settings
pub fn classify(runtime: &Runtime, callable: &CallableRef) -> Result<JoinPoint> {
    Classifier::new(runtime).classify(callable)
}
