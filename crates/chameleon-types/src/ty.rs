//! Runtime type descriptors
//!
//! A [`TypeHandle`] is the runtime identity of a type: its name, originating
//! module, kind, place in the hierarchy, and an open member table. Handles are
//! cheap to clone and compare by identity, never by name.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{AdaptError, AdaptResult, MemberKind};
use crate::member::{ConstructorInfo, EventInfo, FieldInfo, IndexerInfo, MethodInfo, PropertyInfo};

/// Module name of the built-in types
pub const BUILTIN_MODULE: &str = "core";

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// Type kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Value types (copied, never subclassed)
    Value,
    /// Reference class types
    Class,
    /// Interface types
    Interface,
    /// The type of the null reference
    Null,
    /// The absence of a value (method returns only)
    Void,
}

/// Members declared directly on a type
#[derive(Default)]
pub(crate) struct MemberTable {
    pub(crate) fields: Vec<Arc<FieldInfo>>,
    pub(crate) properties: Vec<Arc<PropertyInfo>>,
    pub(crate) indexers: Vec<Arc<IndexerInfo>>,
    pub(crate) methods: Vec<Arc<MethodInfo>>,
    pub(crate) constructors: Vec<Arc<ConstructorInfo>>,
    pub(crate) events: Vec<Arc<EventInfo>>,
}

/// Runtime description of a type
pub struct TypeDescriptor {
    id: u64,
    name: Arc<str>,
    module: Arc<str>,
    kind: TypeKind,
    sealed: bool,
    is_abstract: bool,
    parent: Option<TypeHandle>,
    interfaces: Vec<TypeHandle>,
    members: RwLock<MemberTable>,
    lookups: AtomicU64,
}

/// Shared handle to a [`TypeDescriptor`]
#[derive(Clone)]
pub struct TypeHandle(Arc<TypeDescriptor>);

/// Non-owning handle, used by members that must refer back to their own type
#[derive(Clone)]
pub struct WeakTypeHandle {
    id: u64,
    inner: Weak<TypeDescriptor>,
}

impl WeakTypeHandle {
    /// Upgrade to a strong handle if the type is still alive
    pub fn upgrade(&self) -> Option<TypeHandle> {
        self.inner.upgrade().map(TypeHandle)
    }

    /// Identifier of the referenced type
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl TypeHandle {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn create(
        name: Arc<str>,
        module: Arc<str>,
        kind: TypeKind,
        sealed: bool,
        is_abstract: bool,
        parent: Option<TypeHandle>,
        interfaces: Vec<TypeHandle>,
    ) -> Self {
        TypeHandle(Arc::new(TypeDescriptor {
            id: NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed),
            name,
            module,
            kind,
            sealed,
            is_abstract,
            parent,
            interfaces,
            members: RwLock::new(MemberTable::default()),
            lookups: AtomicU64::new(0),
        }))
    }

    fn builtin(name: &str, kind: TypeKind, sealed: bool, parent: Option<TypeHandle>) -> Self {
        Self::create(
            Arc::from(name),
            Arc::from(BUILTIN_MODULE),
            kind,
            sealed,
            false,
            parent,
            Vec::new(),
        )
    }

    /// Process-unique type identifier
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Name of the module the type was defined in
    pub fn module(&self) -> &str {
        &self.0.module
    }

    /// `module.name`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.0.module, self.0.name)
    }

    /// Type kind
    pub fn kind(&self) -> TypeKind {
        self.0.kind
    }

    /// Whether this is a value type
    pub fn is_value_type(&self) -> bool {
        self.0.kind == TypeKind::Value
    }

    /// Whether this is a class
    pub fn is_class(&self) -> bool {
        self.0.kind == TypeKind::Class
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.0.kind == TypeKind::Interface
    }

    /// Whether values of this type are references (and may therefore be null)
    pub fn is_reference_type(&self) -> bool {
        matches!(self.0.kind, TypeKind::Class | TypeKind::Interface | TypeKind::Null)
    }

    /// Whether the type can not be derived from
    pub fn is_sealed(&self) -> bool {
        self.0.sealed
    }

    /// Whether the type is abstract
    pub fn is_abstract(&self) -> bool {
        self.0.is_abstract
    }

    /// Base class, if any
    pub fn parent(&self) -> Option<&TypeHandle> {
        self.0.parent.as_ref()
    }

    /// Implemented interfaces (or extended interfaces, for an interface)
    pub fn interfaces(&self) -> &[TypeHandle] {
        &self.0.interfaces
    }

    /// Create a non-owning handle
    pub fn downgrade(&self) -> WeakTypeHandle {
        WeakTypeHandle {
            id: self.0.id,
            inner: Arc::downgrade(&self.0),
        }
    }

    // ===== Lookup accounting =====

    /// Record one reflective member lookup against this type
    pub fn note_lookup(&self) {
        self.0.lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of reflective member lookups performed against this type
    pub fn lookup_count(&self) -> u64 {
        self.0.lookups.load(Ordering::Relaxed)
    }

    // ===== Declared members =====

    /// Methods declared directly on this type, in declaration order
    pub fn declared_methods(&self) -> Vec<Arc<MethodInfo>> {
        self.0.members.read().methods.clone()
    }

    /// Properties declared directly on this type
    pub fn declared_properties(&self) -> Vec<Arc<PropertyInfo>> {
        self.0.members.read().properties.clone()
    }

    /// Indexers declared directly on this type
    pub fn declared_indexers(&self) -> Vec<Arc<IndexerInfo>> {
        self.0.members.read().indexers.clone()
    }

    /// Fields declared directly on this type
    pub fn declared_fields(&self) -> Vec<Arc<FieldInfo>> {
        self.0.members.read().fields.clone()
    }

    /// Constructors declared on this type
    pub fn declared_constructors(&self) -> Vec<Arc<ConstructorInfo>> {
        self.0.members.read().constructors.clone()
    }

    /// Events declared directly on this type
    pub fn declared_events(&self) -> Vec<Arc<EventInfo>> {
        self.0.members.read().events.clone()
    }

    // ===== Member definition =====
    //
    // Types stay open: members may be added after the type is in use.

    fn duplicate(&self, kind: MemberKind, member: &str) -> AdaptError {
        AdaptError::DuplicateMember {
            kind,
            member: member.to_string(),
            type_name: self.name().to_string(),
        }
    }

    fn prepare_member(&self, is_abstract: bool) -> AdaptResult<()> {
        if self.0.kind == TypeKind::Null || self.0.kind == TypeKind::Void {
            return Err(AdaptError::InvalidType(format!(
                "type {} can not declare members",
                self.name()
            )));
        }
        if is_abstract && self.is_class() && !self.is_abstract() {
            return Err(AdaptError::InvalidType(format!(
                "abstract member declared on non-abstract class {}",
                self.name()
            )));
        }
        Ok(())
    }

    /// Add a method
    pub fn define_method(&self, mut method: MethodInfo) -> AdaptResult<Arc<MethodInfo>> {
        self.prepare_member(method.modifiers().is_abstract)?;
        method.set_declaring_type(self.0.name.clone());
        let mut members = self.0.members.write();
        if members
            .methods
            .iter()
            .any(|m| m.name() == method.name() && m.params() == method.params())
        {
            return Err(self.duplicate(MemberKind::Method, method.name()));
        }
        let method = Arc::new(method);
        members.methods.push(method.clone());
        Ok(method)
    }

    /// Add a property
    pub fn define_property(&self, mut property: PropertyInfo) -> AdaptResult<Arc<PropertyInfo>> {
        self.prepare_member(property.modifiers().is_abstract)?;
        property.set_declaring_type(self.0.name.clone());
        let mut members = self.0.members.write();
        if members.properties.iter().any(|p| p.name() == property.name()) {
            return Err(self.duplicate(MemberKind::Property, property.name()));
        }
        let property = Arc::new(property);
        members.properties.push(property.clone());
        Ok(property)
    }

    /// Add an indexer
    pub fn define_indexer(&self, mut indexer: IndexerInfo) -> AdaptResult<Arc<IndexerInfo>> {
        self.prepare_member(indexer.modifiers().is_abstract)?;
        indexer.set_declaring_type(self.0.name.clone());
        let mut members = self.0.members.write();
        if members.indexers.iter().any(|i| i.params() == indexer.params()) {
            return Err(self.duplicate(MemberKind::Indexer, indexer.name()));
        }
        let indexer = Arc::new(indexer);
        members.indexers.push(indexer.clone());
        Ok(indexer)
    }

    /// Add a field
    pub fn define_field(&self, mut field: FieldInfo) -> AdaptResult<Arc<FieldInfo>> {
        self.prepare_member(false)?;
        field.set_declaring_type(self.0.name.clone());
        let mut members = self.0.members.write();
        if members.fields.iter().any(|f| f.name() == field.name()) {
            return Err(self.duplicate(MemberKind::Field, field.name()));
        }
        let field = Arc::new(field);
        members.fields.push(field.clone());
        Ok(field)
    }

    /// Add a constructor
    pub fn define_constructor(
        &self,
        mut constructor: ConstructorInfo,
    ) -> AdaptResult<Arc<ConstructorInfo>> {
        self.prepare_member(false)?;
        if self.is_interface() {
            return Err(AdaptError::InvalidType(format!(
                "interface {} can not declare constructors",
                self.name()
            )));
        }
        constructor.set_declaring_type(self.0.name.clone());
        let mut members = self.0.members.write();
        if members
            .constructors
            .iter()
            .any(|c| c.params() == constructor.params())
        {
            return Err(self.duplicate(MemberKind::Constructor, self.name()));
        }
        let constructor = Arc::new(constructor);
        members.constructors.push(constructor.clone());
        Ok(constructor)
    }

    /// Add an event
    pub fn define_event(&self, mut event: EventInfo) -> AdaptResult<Arc<EventInfo>> {
        self.prepare_member(event.modifiers().is_abstract)?;
        event.set_declaring_type(self.0.name.clone());
        let mut members = self.0.members.write();
        if members.events.iter().any(|e| e.name() == event.name()) {
            return Err(self.duplicate(MemberKind::Event, event.name()));
        }
        let event = Arc::new(event);
        members.events.push(event.clone());
        Ok(event)
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({}#{})", self.full_name(), self.0.id)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

// ============================================================================
// Built-in types
// ============================================================================

struct Builtins {
    object: TypeHandle,
    null: TypeHandle,
    void: TypeHandle,
    boolean: TypeHandle,
    int32: TypeHandle,
    int64: TypeHandle,
    float64: TypeHandle,
    string: TypeHandle,
    buffer: TypeHandle,
    handler: TypeHandle,
}

static BUILTINS: Lazy<Builtins> = Lazy::new(|| {
    let object = TypeHandle::builtin("object", TypeKind::Class, false, None);
    let class = |name: &str, sealed: bool| {
        TypeHandle::builtin(name, TypeKind::Class, sealed, Some(object.clone()))
    };
    let string = class("string", true);
    let buffer = class("buffer", true);
    // Handler is not sealed so that typed delegate types can derive from it.
    let handler = class("handler", false);
    Builtins {
        null: TypeHandle::builtin("null", TypeKind::Null, true, None),
        void: TypeHandle::builtin("void", TypeKind::Void, true, None),
        boolean: TypeHandle::builtin("bool", TypeKind::Value, true, None),
        int32: TypeHandle::builtin("i32", TypeKind::Value, true, None),
        int64: TypeHandle::builtin("i64", TypeKind::Value, true, None),
        float64: TypeHandle::builtin("f64", TypeKind::Value, true, None),
        string,
        buffer,
        handler,
        object,
    }
});

impl TypeHandle {
    /// Root class every type is assignable to
    pub fn object() -> TypeHandle {
        BUILTINS.object.clone()
    }

    /// Type of the null reference
    pub fn null() -> TypeHandle {
        BUILTINS.null.clone()
    }

    /// Return type of methods without a result
    pub fn void() -> TypeHandle {
        BUILTINS.void.clone()
    }

    /// `bool` value type
    pub fn bool() -> TypeHandle {
        BUILTINS.boolean.clone()
    }

    /// `i32` value type
    pub fn i32() -> TypeHandle {
        BUILTINS.int32.clone()
    }

    /// `i64` value type
    pub fn i64() -> TypeHandle {
        BUILTINS.int64.clone()
    }

    /// `f64` value type
    pub fn f64() -> TypeHandle {
        BUILTINS.float64.clone()
    }

    /// Immutable string class
    pub fn string() -> TypeHandle {
        BUILTINS.string.clone()
    }

    /// Shared byte buffer class
    pub fn buffer() -> TypeHandle {
        BUILTINS.buffer.clone()
    }

    /// Base type of event handlers
    pub fn handler() -> TypeHandle {
        BUILTINS.handler.clone()
    }

    /// Whether this is the `void` type
    pub fn is_void(&self) -> bool {
        self.0.kind == TypeKind::Void
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::MethodInfo;

    #[test]
    fn test_builtins_are_stable() {
        assert_eq!(TypeHandle::i32(), TypeHandle::i32());
        assert_ne!(TypeHandle::i32(), TypeHandle::i64());
        assert_eq!(TypeHandle::string().parent(), Some(&TypeHandle::object()));
        assert_eq!(TypeHandle::string().module(), BUILTIN_MODULE);
        assert!(TypeHandle::i32().is_value_type());
        assert!(TypeHandle::string().is_sealed());
        assert!(!TypeHandle::object().is_sealed());
    }

    #[test]
    fn test_identity_not_name() {
        let a = TypeHandle::create(
            Arc::from("Thing"),
            Arc::from("a"),
            TypeKind::Class,
            false,
            false,
            None,
            vec![],
        );
        let b = TypeHandle::create(
            Arc::from("Thing"),
            Arc::from("a"),
            TypeKind::Class,
            false,
            false,
            None,
            vec![],
        );
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.downgrade().upgrade(), Some(a.clone()));
    }

    #[test]
    fn test_duplicate_method_rejected() {
        let ty = TypeHandle::create(
            Arc::from("Calc"),
            Arc::from("test"),
            TypeKind::Class,
            false,
            false,
            None,
            vec![],
        );
        ty.define_method(MethodInfo::new("add", vec![TypeHandle::i32()], TypeHandle::i32()))
            .unwrap();
        // Overload with a different signature is fine
        ty.define_method(MethodInfo::new("add", vec![TypeHandle::i64()], TypeHandle::i64()))
            .unwrap();

        let err = ty
            .define_method(MethodInfo::new("add", vec![TypeHandle::i32()], TypeHandle::i32()))
            .unwrap_err();
        assert!(matches!(err, AdaptError::DuplicateMember { .. }));
        assert_eq!(ty.declared_methods().len(), 2);
        assert_eq!(ty.declared_methods()[0].declaring_type(), "Calc");
    }

    #[test]
    fn test_lookup_counter() {
        let ty = TypeHandle::object();
        let before = ty.lookup_count();
        ty.note_lookup();
        assert!(ty.lookup_count() > before);
    }
}
