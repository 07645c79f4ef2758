//! Registry of loaded modules
//!
//! Classification resolves a function's declaring module here by name.

use crate::error::{AspectError, Result};
use crate::module::{Module, ModuleRef};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct Runtime {
    modules: RwLock<BTreeMap<String, ModuleRef>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and load an empty module; an existing module of the same name is replaced
    pub fn create_module(&self, name: &str) -> ModuleRef {
        let module = Module::new(name);
        self.load(module.clone());
        module
    }

    pub fn load(&self, module: ModuleRef) {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(module.name().to_string(), module);
    }

    pub fn module(&self, name: &str) -> Result<ModuleRef> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| AspectError::UnknownModule(name.to_string()))
    }

    pub fn module_names(&self) -> Vec<String> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
