//! Module symbol tables
//!
//! Callers reach module-level functions by name through [`Module::call`], so
//! rebinding an entry is visible to every caller from its next call on.

use crate::error::{AspectError, Result};
use crate::function::Function;
use crate::types::{TypeBuilder, TypeRef};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

pub type ModuleRef = Arc<Module>;

/// A symbol table entry
#[derive(Debug, Clone)]
pub enum Entry {
    Function(Function),
    Type(TypeRef),
    Value(Value),
}

pub struct Module {
    name: String,
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl Module {
    pub fn new(name: &str) -> ModuleRef {
        Arc::new(Self {
            name: name.to_string(),
            entries: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a function in this module and bind it under its name
    pub fn define_function<F>(&self, name: &str, arity: usize, body: F) -> Function
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let function = Function::new(name, &self.name, Some(arity), body);
        self.bind(name, Entry::Function(function.clone()));
        function
    }

    /// Build a type declared in this module and bind it under its name
    pub fn define_type(&self, builder: TypeBuilder) -> TypeRef {
        let ty = builder.build(&self.name);
        self.bind(ty.name(), Entry::Type(ty.clone()));
        ty
    }

    /// Overwrite (or add) an entry, returning the previous one
    pub fn bind(&self, name: &str, entry: Entry) -> Option<Entry> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), entry)
    }

    /// Bind `replacement` under `name` only if `name` still holds `expected`
    ///
    /// Returns false, leaving the table untouched, if the entry was rebound.
    pub fn rebind_if(&self, name: &str, expected: &Function, replacement: Function) -> bool {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !matches!(entries.get(name), Some(Entry::Function(f)) if f.is(expected)) {
            return false;
        }
        entries.insert(name.to_string(), Entry::Function(replacement));
        true
    }

    pub fn get(&self, name: &str) -> Option<Entry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn function(&self, name: &str) -> Result<Function> {
        match self.lookup(name)? {
            Entry::Function(f) => Ok(f),
            _ => Err(AspectError::NotCallable(format!("{}.{}", self.name, name))),
        }
    }

    pub fn type_def(&self, name: &str) -> Result<TypeRef> {
        match self.lookup(name)? {
            Entry::Type(t) => Ok(t),
            _ => Err(AspectError::TypeMismatch {
                name: format!("{}.{}", self.name, name),
                expected: "type",
                actual: "function or value",
            }),
        }
    }

    /// Every type-valued entry, in name order
    pub fn types(&self) -> Vec<TypeRef> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter_map(|entry| match entry {
                Entry::Type(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    /// Resolve `name` now and call it
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.function(name)?.call(args)
    }

    fn lookup(&self, name: &str) -> Result<Entry> {
        self.get(name).ok_or_else(|| AspectError::UndefinedName {
            module: self.name.clone(),
            name: name.to_string(),
        })
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("entries", &names)
            .finish()
    }
}
