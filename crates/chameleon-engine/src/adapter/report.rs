//! Diagnostic export of generated modules

use std::path::Path;

use chameleon_types::{AdaptError, AdaptResult};
use serde::{Deserialize, Serialize};

use super::{AdapterType, MemberBinding};
use crate::config::BindingOptions;

/// Snapshot of one adapter module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleReport {
    /// Module name
    pub module: String,
    /// Contract full name
    pub contract: String,
    /// Number of generated types
    pub generated: u64,
    /// Generated types in generation order
    pub types: Vec<TypeReport>,
}

/// Snapshot of one generated type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeReport {
    /// Generated type name
    pub name: String,
    /// Underlying type full name
    pub underlying: String,
    /// Whether members route through an interception policy
    pub intercepted: bool,
    /// Options the type was generated with
    pub options: BindingOptions,
    /// Generation order within the module
    pub serial: u64,
    /// Binding decisions
    pub bindings: Vec<MemberBinding>,
}

impl From<&AdapterType> for TypeReport {
    fn from(ty: &AdapterType) -> Self {
        Self {
            name: ty.name().to_string(),
            underlying: ty.underlying().full_name(),
            intercepted: ty.is_intercepted(),
            options: ty.options(),
            serial: ty.serial(),
            bindings: ty.bindings().to_vec(),
        }
    }
}

impl ModuleReport {
    /// Render as pretty-printed JSON
    pub fn to_json(&self) -> AdaptResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AdaptError::Io(e.to_string()))
    }

    /// Write as pretty-printed JSON to `path`
    pub fn save(&self, path: &Path) -> AdaptResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a report written by [`ModuleReport::save`]
    pub fn load(path: &Path) -> AdaptResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| AdaptError::Io(e.to_string()))
    }
}
