//! Adapter configuration
//!
//! Provides the binding options that shape generated adapters and their TOML
//! representation.
//!
//! ```toml
//! [binding]
//! direct_binding = true
//! assignable_match = true
//! check_return_types = false
//! ```

use std::path::Path;

use chameleon_types::{AdaptError, AdaptResult};
use serde::{Deserialize, Serialize};

/// Options that control how contract members are bound
///
/// Options are part of the adapter cache key: factories with different
/// options never share generated types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingOptions {
    /// Bind to a statically discovered member when one exists; when false every
    /// member binds dynamically
    pub direct_binding: bool,

    /// Accept assignable (not only identical) signatures as direct candidates
    pub assignable_match: bool,

    /// Check forwarded results against the contract's declared type
    pub check_return_types: bool,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            direct_binding: true,
            assignable_match: true,
            check_return_types: true,
        }
    }
}

/// Adapter factory configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Member binding options
    #[serde(default)]
    pub binding: BindingOptions,
}

impl AdapterConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> AdaptResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> AdaptResult<Self> {
        toml::from_str(content).map_err(|e| AdaptError::Config(e.to_string()))
    }

    /// Serialize to a TOML string
    pub fn to_toml_string(&self) -> AdaptResult<String> {
        toml::to_string_pretty(self).map_err(|e| AdaptError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BindingOptions::default();
        assert!(options.direct_binding);
        assert!(options.assignable_match);
        assert!(options.check_return_types);
        assert_eq!(AdapterConfig::from_str("").unwrap(), AdapterConfig::default());
    }

    #[test]
    fn test_partial_table() {
        let config = AdapterConfig::from_str(
            r#"
[binding]
direct_binding = false
"#,
        )
        .unwrap();
        assert!(!config.binding.direct_binding);
        assert!(config.binding.assignable_match);
    }

    #[test]
    fn test_roundtrip() {
        let mut config = AdapterConfig::default();
        config.binding.check_return_types = false;
        let text = config.to_toml_string().unwrap();
        assert_eq!(AdapterConfig::from_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml() {
        let err = AdapterConfig::from_str("[binding]\ndirect_binding = \"yes\"").unwrap_err();
        assert!(matches!(err, AdaptError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AdapterConfig::from_file(Path::new("/nonexistent/chameleon.toml")).unwrap_err();
        assert!(matches!(err, AdaptError::Io(_)));
    }
}
