//! Fluent type builder
//!
//! ```ignore
//! let stream = TypeBuilder::class("FileStream")
//!     .in_module("io")
//!     .method(MethodInfo::new("Read", vec![buffer, i32, i32], i32).with_body(read))
//!     .property(PropertyInfo::new("Length", i32).with_getter(len))
//!     .build()?;
//! ```

use std::sync::Arc;

use crate::error::{AdaptError, AdaptResult};
use crate::member::{ConstructorInfo, EventInfo, FieldInfo, IndexerInfo, MethodInfo, PropertyInfo};
use crate::ty::{TypeHandle, TypeKind};

/// Module name used when none is given
pub const DEFAULT_MODULE: &str = "dynamic";

/// Builder for a new [`TypeHandle`]
pub struct TypeBuilder {
    name: Arc<str>,
    module: Arc<str>,
    kind: TypeKind,
    parent: Option<TypeHandle>,
    interfaces: Vec<TypeHandle>,
    sealed: bool,
    is_abstract: bool,
    methods: Vec<MethodInfo>,
    properties: Vec<PropertyInfo>,
    indexers: Vec<IndexerInfo>,
    fields: Vec<FieldInfo>,
    constructors: Vec<ConstructorInfo>,
    events: Vec<EventInfo>,
}

impl TypeBuilder {
    fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: Arc::from(name),
            module: Arc::from(DEFAULT_MODULE),
            kind,
            parent: None,
            interfaces: Vec::new(),
            sealed: kind == TypeKind::Value,
            is_abstract: false,
            methods: Vec::new(),
            properties: Vec::new(),
            indexers: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Start a class deriving from `object` unless a parent is given
    pub fn class(name: &str) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// Start an interface
    pub fn interface(name: &str) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// Start a value type
    pub fn value_type(name: &str) -> Self {
        Self::new(name, TypeKind::Value)
    }

    /// Name of the type being built
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the originating module
    pub fn in_module(mut self, module: &str) -> Self {
        self.module = Arc::from(module);
        self
    }

    /// Set the base class
    pub fn parent(mut self, parent: &TypeHandle) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Add an implemented (or, for interfaces, extended) interface
    pub fn implements(mut self, interface: &TypeHandle) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    /// Forbid derivation
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// Mark the class abstract
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add a method
    pub fn method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a property
    pub fn property(mut self, property: PropertyInfo) -> Self {
        self.properties.push(property);
        self
    }

    /// Add an indexer
    pub fn indexer(mut self, indexer: IndexerInfo) -> Self {
        self.indexers.push(indexer);
        self
    }

    /// Add a field
    pub fn field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a constructor
    pub fn constructor(mut self, constructor: ConstructorInfo) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Add an event
    pub fn event(mut self, event: EventInfo) -> Self {
        self.events.push(event);
        self
    }

    fn invalid(&self, message: &str) -> AdaptError {
        AdaptError::InvalidType(format!("{}: {}", self.name, message))
    }

    fn validate(&self) -> AdaptResult<()> {
        if self.name.is_empty() {
            return Err(AdaptError::InvalidType("type name is empty".to_string()));
        }
        match self.kind {
            TypeKind::Class => {
                if let Some(parent) = &self.parent {
                    if !parent.is_class() {
                        return Err(self.invalid("parent must be a class"));
                    }
                    if parent.is_sealed() {
                        return Err(self.invalid(&format!("can not derive from sealed class {}", parent)));
                    }
                }
            }
            TypeKind::Interface | TypeKind::Value => {
                if self.parent.is_some() {
                    return Err(self.invalid("only classes have a parent"));
                }
                if self.is_abstract {
                    return Err(self.invalid("only classes can be abstract"));
                }
            }
            TypeKind::Null | TypeKind::Void => return Err(self.invalid("reserved type kind")),
        }
        if let Some(other) = self.interfaces.iter().find(|i| !i.is_interface()) {
            return Err(self.invalid(&format!("{} is not an interface", other)));
        }
        if self.kind == TypeKind::Interface {
            let has_bodies = self.methods.iter().any(|m| m.has_body())
                || self.properties.iter().any(|p| p.has_body() && (p.can_read() || p.can_write()))
                || self.indexers.iter().any(|i| i.has_body() && (i.can_read() || i.can_write()))
                || self.events.iter().any(|e| e.has_body());
            if has_bodies {
                return Err(self.invalid("interface members can not have bodies"));
            }
            if !self.fields.is_empty() {
                return Err(self.invalid("interfaces can not declare fields"));
            }
        }
        Ok(())
    }

    /// Validate and create the type
    pub fn build(self) -> AdaptResult<TypeHandle> {
        self.validate()?;

        let parent = match self.kind {
            TypeKind::Class => Some(self.parent.clone().unwrap_or_else(TypeHandle::object)),
            _ => None,
        };
        let ty = TypeHandle::create(
            self.name,
            self.module,
            self.kind,
            self.sealed,
            self.is_abstract,
            parent,
            self.interfaces,
        );

        let interface = ty.is_interface();
        for method in self.methods {
            ty.define_method(if interface { method.as_abstract() } else { method })?;
        }
        for property in self.properties {
            ty.define_property(if interface { property.as_abstract() } else { property })?;
        }
        for indexer in self.indexers {
            ty.define_indexer(if interface { indexer.as_abstract() } else { indexer })?;
        }
        for event in self.events {
            ty.define_event(if interface { event.as_abstract() } else { event })?;
        }
        for field in self.fields {
            ty.define_field(field)?;
        }
        for constructor in self.constructors {
            ty.define_constructor(constructor)?;
        }

        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_class_defaults_to_object_parent() {
        let ty = TypeBuilder::class("Plain").build().unwrap();
        assert_eq!(ty.parent(), Some(&TypeHandle::object()));
        assert_eq!(ty.module(), DEFAULT_MODULE);
        assert!(!ty.is_sealed());
    }

    #[test]
    fn test_value_types_are_sealed() {
        let ty = TypeBuilder::value_type("Point").build().unwrap();
        assert!(ty.is_sealed());
        assert!(ty.parent().is_none());
    }

    #[test]
    fn test_sealed_parent_rejected() {
        let err = TypeBuilder::class("MyString")
            .parent(&TypeHandle::string())
            .build()
            .unwrap_err();
        assert!(matches!(err, AdaptError::InvalidType(_)));
    }

    #[test]
    fn test_interface_members_are_abstract() {
        let ty = TypeBuilder::interface("Shape")
            .method(MethodInfo::new("Area", vec![], TypeHandle::f64()))
            .property(PropertyInfo::new("Name", TypeHandle::string()).readable())
            .build()
            .unwrap();
        let area = &ty.declared_methods()[0];
        assert!(area.modifiers().is_abstract);
        assert!(area.modifiers().is_virtual);
        assert!(ty.declared_properties()[0].modifiers().is_abstract);
    }

    #[test]
    fn test_interface_bodies_rejected() {
        let err = TypeBuilder::interface("Shape")
            .method(MethodInfo::new("Area", vec![], TypeHandle::f64()).with_body(|_, _| Ok(Value::F64(0.0))))
            .build()
            .unwrap_err();
        assert!(matches!(err, AdaptError::InvalidType(_)));
    }

    #[test]
    fn test_abstract_member_needs_abstract_class() {
        let err = TypeBuilder::class("Job")
            .method(MethodInfo::new("Run", vec![], TypeHandle::void()).as_abstract())
            .build()
            .unwrap_err();
        assert!(matches!(err, AdaptError::InvalidType(_)));

        TypeBuilder::class("Job")
            .abstract_class()
            .method(MethodInfo::new("Run", vec![], TypeHandle::void()).as_abstract())
            .build()
            .unwrap();
    }

    #[test]
    fn test_implements_requires_interface() {
        let class = TypeBuilder::class("Base").build().unwrap();
        let err = TypeBuilder::class("Derived").implements(&class).build().unwrap_err();
        assert!(matches!(err, AdaptError::InvalidType(_)));
    }
}
