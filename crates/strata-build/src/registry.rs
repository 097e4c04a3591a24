//! Module registry: globally-unique module names and their interfaces
//!
//! Maps each module name to the artifact that defines its externally-visible
//! interface. For meta-source files the interface artifact is itself
//! generated by translation; it is registered before translation is modeled
//! so other files can already resolve the name.

use crate::error::{BuildError, BuildResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    /// Uniqueness domain: module name -> file that claimed it.
    defined: BTreeMap<String, String>,
    /// Module name -> interface artifact path used to resolve by-name
    /// references. A later interface file may refine an earlier entry.
    interfaces: BTreeMap<String, String>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a module name for a defining file.
    ///
    /// A second definition of the same name is a fatal configuration error:
    /// resolution by name would become ambiguous.
    pub fn register(
        &mut self,
        module: impl Into<String>,
        path: impl Into<String>,
    ) -> BuildResult<()> {
        let module = module.into();
        let path = path.into();
        if let Some(first) = self.defined.get(&module) {
            return Err(BuildError::duplicate_module(module, first.clone(), path));
        }
        self.defined.insert(module, path);
        Ok(())
    }

    /// Record the interface artifact for a module, replacing any earlier one.
    pub fn record_interface(&mut self, module: impl Into<String>, artifact: impl Into<String>) {
        self.interfaces.insert(module.into(), artifact.into());
    }

    /// Resolve a module name to its interface artifact.
    pub fn interface(&self, module: &str) -> Option<&str> {
        self.interfaces.get(module).map(String::as_str)
    }

    /// All resolvable modules with their interface artifacts, sorted by name.
    pub fn modules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.interfaces
            .iter()
            .map(|(m, p)| (m.as_str(), p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}
