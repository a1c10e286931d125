//! Named type registry
//!
//! A registry is one module of types: names are unique inside it and types
//! iterate in definition order.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::builder::TypeBuilder;
use crate::error::{AdaptError, AdaptResult};
use crate::ty::TypeHandle;

#[derive(Default)]
struct RegistryInner {
    by_name: FxHashMap<String, TypeHandle>,
    ordered: Vec<TypeHandle>,
}

/// Module of named types
pub struct TypeRegistry {
    module: String,
    inner: RwLock<RegistryInner>,
}

impl TypeRegistry {
    /// Create an empty module
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Module name
    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// Start a class in this module
    pub fn class(&self, name: &str) -> TypeBuilder {
        TypeBuilder::class(name).in_module(&self.module)
    }

    /// Start an interface in this module
    pub fn interface(&self, name: &str) -> TypeBuilder {
        TypeBuilder::interface(name).in_module(&self.module)
    }

    /// Start a value type in this module
    pub fn value_type(&self, name: &str) -> TypeBuilder {
        TypeBuilder::value_type(name).in_module(&self.module)
    }

    /// Build and register a type
    ///
    /// The builder's module is replaced with this registry's module.
    pub fn define(&self, builder: TypeBuilder) -> AdaptResult<TypeHandle> {
        let mut inner = self.inner.write();
        if inner.by_name.contains_key(builder.name()) {
            return Err(AdaptError::DuplicateType {
                name: builder.name().to_string(),
                module: self.module.clone(),
            });
        }
        let ty = builder.in_module(&self.module).build()?;
        inner.by_name.insert(ty.name().to_string(), ty.clone());
        inner.ordered.push(ty.clone());
        Ok(ty)
    }

    /// Look up a type by name
    pub fn get(&self, name: &str) -> Option<TypeHandle> {
        self.inner.read().by_name.get(name).cloned()
    }

    /// Check if a type with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().by_name.contains_key(name)
    }

    /// Number of types
    pub fn len(&self) -> usize {
        self.inner.read().ordered.len()
    }

    /// Check if the module is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().ordered.is_empty()
    }

    /// All types in definition order
    pub fn types(&self) -> Vec<TypeHandle> {
        self.inner.read().ordered.clone()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("module", &self.module)
            .field("types", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_lookup() {
        let registry = TypeRegistry::new("shapes");
        let shape = registry.define(registry.interface("Shape")).unwrap();
        let circle = registry.define(registry.class("Circle").implements(&shape)).unwrap();

        assert_eq!(registry.get("Circle"), Some(circle.clone()));
        assert_eq!(circle.module(), "shapes");
        assert!(registry.contains("Shape"));
        assert!(registry.get("Square").is_none());
        assert_eq!(registry.types(), vec![shape, circle]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = TypeRegistry::new("shapes");
        registry.define(registry.class("Circle")).unwrap();
        let err = registry.define(registry.class("Circle")).unwrap_err();
        assert_eq!(
            err,
            AdaptError::DuplicateType {
                name: "Circle".to_string(),
                module: "shapes".to_string(),
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_module_is_forced() {
        let registry = TypeRegistry::new("net");
        let ty = registry.define(TypeBuilder::class("Socket")).unwrap();
        assert_eq!(ty.module(), "net");
    }
}
