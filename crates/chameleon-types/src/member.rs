//! Member metadata
//!
//! Every member a type exposes to reflection is registered explicitly with a
//! descriptor from this module. Bodies are type-erased closures receiving the
//! receiver value first; static members receive [`Value::Null`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AdaptError, AdaptResult, MemberKind};
use crate::handler::Handler;
use crate::ty::TypeHandle;
use crate::value::Value;

/// Name indexed properties are registered under
pub const INDEXER_NAME: &str = "Item";

/// Method body: `(receiver, args) -> result`
pub type MethodBody = Arc<dyn Fn(&Value, &[Value]) -> AdaptResult<Value> + Send + Sync>;
/// Property or field getter: `(receiver) -> value`
pub type GetterBody = Arc<dyn Fn(&Value) -> AdaptResult<Value> + Send + Sync>;
/// Property or field setter: `(receiver, value)`
pub type SetterBody = Arc<dyn Fn(&Value, Value) -> AdaptResult<()> + Send + Sync>;
/// Indexer getter: `(receiver, index) -> value`
pub type IndexGetterBody = Arc<dyn Fn(&Value, &[Value]) -> AdaptResult<Value> + Send + Sync>;
/// Indexer setter: `(receiver, index, value)`
pub type IndexSetterBody = Arc<dyn Fn(&Value, &[Value], Value) -> AdaptResult<()> + Send + Sync>;
/// Event add or remove accessor: `(receiver, handler)`
pub type EventAccessor = Arc<dyn Fn(&Value, &Handler) -> AdaptResult<()> + Send + Sync>;
/// Constructor body: `(args) -> new instance`
pub type ConstructorBody = Arc<dyn Fn(&[Value]) -> AdaptResult<Value> + Send + Sync>;

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to derived types
    Protected,
    /// Visible to the declaring type only
    Private,
}

/// Member modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Member belongs to the type, not to instances
    pub is_static: bool,
    /// Member may be overridden by derived types
    pub is_virtual: bool,
    /// Member has no body and must be overridden
    pub is_abstract: bool,
    /// Compiler-reserved member such as an accessor method
    pub is_special_name: bool,
}

impl Modifiers {
    /// Whether a derived type can replace this member
    pub fn is_overridable(&self) -> bool {
        !self.is_static && (self.is_virtual || self.is_abstract)
    }
}

/// Validate `args` against an ordered parameter list
pub fn check_arguments(member: &str, params: &[TypeHandle], args: &[Value]) -> AdaptResult<()> {
    if params.len() != args.len() {
        return Err(AdaptError::ArgumentMismatch {
            member: member.to_string(),
            message: format!("expected {} arguments, got {}", params.len(), args.len()),
        });
    }
    for (i, (param, arg)) in params.iter().zip(args).enumerate() {
        let actual = arg.type_of();
        if !param.is_assignable_from(&actual) {
            return Err(AdaptError::ArgumentMismatch {
                member: member.to_string(),
                message: format!("argument {} is {}, expected {}", i, actual, param),
            });
        }
    }
    Ok(())
}

/// Borrow the payload of `receiver` as `T`
pub fn downcast_receiver<'a, T: Any>(member: &str, receiver: &'a Value) -> AdaptResult<&'a T> {
    receiver
        .as_object()
        .and_then(|obj| obj.downcast_ref::<T>())
        .ok_or_else(|| AdaptError::ReceiverMismatch {
            member: member.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })
}

fn declaring(ty: &Option<Arc<str>>) -> &str {
    ty.as_deref().unwrap_or("")
}

fn abstract_member(kind: MemberKind, member: &str, ty: &Option<Arc<str>>) -> AdaptError {
    AdaptError::AbstractMember {
        kind,
        member: member.to_string(),
        type_name: declaring(ty).to_string(),
    }
}

fn check_value(member: &str, expected: &TypeHandle, value: &Value) -> AdaptResult<()> {
    let actual = value.type_of();
    if expected.is_assignable_from(&actual) {
        Ok(())
    } else {
        Err(AdaptError::ArgumentMismatch {
            member: member.to_string(),
            message: format!("value is {}, expected {}", actual, expected),
        })
    }
}

// ============================================================================
// Methods
// ============================================================================

/// Method descriptor
#[derive(Clone)]
pub struct MethodInfo {
    name: Arc<str>,
    params: Vec<TypeHandle>,
    return_type: TypeHandle,
    visibility: Visibility,
    modifiers: Modifiers,
    declaring_type: Option<Arc<str>>,
    body: Option<MethodBody>,
}

impl MethodInfo {
    /// Declare a public instance method without a body
    pub fn new(name: impl Into<Arc<str>>, params: Vec<TypeHandle>, return_type: TypeHandle) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            declaring_type: None,
            body: None,
        }
    }

    /// Attach a body
    pub fn with_body<F>(mut self, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> AdaptResult<Value> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    /// Attach a body that receives the receiver's payload as `T`
    pub fn with_typed_body<T, F>(self, body: F) -> Self
    where
        T: Any,
        F: Fn(&T, &[Value]) -> AdaptResult<Value> + Send + Sync + 'static,
    {
        let name = self.name.clone();
        self.with_body(move |receiver, args| body(downcast_receiver::<T>(&name, receiver)?, args))
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    /// Mark as virtual
    pub fn as_virtual(mut self) -> Self {
        self.modifiers.is_virtual = true;
        self
    }

    /// Mark as abstract (and therefore virtual)
    pub fn as_abstract(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self.modifiers.is_virtual = true;
        self
    }

    /// Mark as a special-name method
    pub fn as_special_name(mut self) -> Self {
        self.modifiers.is_special_name = true;
        self
    }

    pub(crate) fn set_declaring_type(&mut self, ty: Arc<str>) {
        self.declaring_type = Some(ty);
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered parameter types
    pub fn params(&self) -> &[TypeHandle] {
        &self.params
    }

    /// Declared return type
    pub fn return_type(&self) -> &TypeHandle {
        &self.return_type
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Modifiers
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Whether the method is public
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Whether the method is static
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }

    /// Whether a body is attached
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Name of the declaring type
    pub fn declaring_type(&self) -> &str {
        declaring(&self.declaring_type)
    }

    /// Call the method after validating the arguments
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> AdaptResult<Value> {
        check_arguments(&self.name, &self.params, args)?;
        match &self.body {
            Some(body) => body(receiver, args),
            None => Err(abstract_member(MemberKind::Method, &self.name, &self.declaring_type)),
        }
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .field("visibility", &self.visibility)
            .field("modifiers", &self.modifiers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

// ============================================================================
// Properties
// ============================================================================

/// Property descriptor
///
/// Readability and writability are declared separately from the accessor
/// bodies so that abstract properties can state their shape.
#[derive(Clone)]
pub struct PropertyInfo {
    name: Arc<str>,
    ty: TypeHandle,
    visibility: Visibility,
    modifiers: Modifiers,
    readable: bool,
    writable: bool,
    declaring_type: Option<Arc<str>>,
    getter: Option<GetterBody>,
    setter: Option<SetterBody>,
}

impl PropertyInfo {
    /// Declare a public instance property with no accessors
    pub fn new(name: impl Into<Arc<str>>, ty: TypeHandle) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            readable: false,
            writable: false,
            declaring_type: None,
            getter: None,
            setter: None,
        }
    }

    /// Declare a getter without a body
    pub fn readable(mut self) -> Self {
        self.readable = true;
        self
    }

    /// Declare a setter without a body
    pub fn writable(mut self) -> Self {
        self.writable = true;
        self
    }

    /// Attach a getter
    pub fn with_getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Value) -> AdaptResult<Value> + Send + Sync + 'static,
    {
        self.readable = true;
        self.getter = Some(Arc::new(getter));
        self
    }

    /// Attach a setter
    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&Value, Value) -> AdaptResult<()> + Send + Sync + 'static,
    {
        self.writable = true;
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Attach a getter that receives the receiver's payload as `T`
    pub fn with_typed_getter<T, F>(self, getter: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> AdaptResult<Value> + Send + Sync + 'static,
    {
        let name = self.name.clone();
        self.with_getter(move |receiver| getter(downcast_receiver::<T>(&name, receiver)?))
    }

    /// Attach a setter that receives the receiver's payload as `T`
    pub fn with_typed_setter<T, F>(self, setter: F) -> Self
    where
        T: Any,
        F: Fn(&T, Value) -> AdaptResult<()> + Send + Sync + 'static,
    {
        let name = self.name.clone();
        self.with_setter(move |receiver, value| {
            setter(downcast_receiver::<T>(&name, receiver)?, value)
        })
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    /// Mark as virtual
    pub fn as_virtual(mut self) -> Self {
        self.modifiers.is_virtual = true;
        self
    }

    /// Mark as abstract (and therefore virtual)
    pub fn as_abstract(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self.modifiers.is_virtual = true;
        self
    }

    pub(crate) fn set_declaring_type(&mut self, ty: Arc<str>) {
        self.declaring_type = Some(ty);
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Property type
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Modifiers
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Whether the property is public
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Whether the property declares a getter
    pub fn can_read(&self) -> bool {
        self.readable
    }

    /// Whether the property declares a setter
    pub fn can_write(&self) -> bool {
        self.writable
    }

    /// Whether accessor bodies are attached for every declared accessor
    pub fn has_body(&self) -> bool {
        (!self.readable || self.getter.is_some()) && (!self.writable || self.setter.is_some())
    }

    /// Name of the declaring type
    pub fn declaring_type(&self) -> &str {
        declaring(&self.declaring_type)
    }

    /// Read the property
    pub fn get(&self, receiver: &Value) -> AdaptResult<Value> {
        if !self.readable {
            return Err(AdaptError::NotReadable {
                member: self.name.to_string(),
                type_name: self.declaring_type().to_string(),
            });
        }
        match &self.getter {
            Some(getter) => getter(receiver),
            None => Err(abstract_member(MemberKind::Property, &self.name, &self.declaring_type)),
        }
    }

    /// Write the property
    pub fn set(&self, receiver: &Value, value: Value) -> AdaptResult<()> {
        if !self.writable {
            return Err(AdaptError::NotWritable {
                member: self.name.to_string(),
                type_name: self.declaring_type().to_string(),
            });
        }
        check_value(&self.name, &self.ty, &value)?;
        match &self.setter {
            Some(setter) => setter(receiver, value),
            None => Err(abstract_member(MemberKind::Property, &self.name, &self.declaring_type)),
        }
    }
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .field("modifiers", &self.modifiers)
            .finish()
    }
}

// ============================================================================
// Indexers
// ============================================================================

/// Indexed property descriptor, registered under [`INDEXER_NAME`]
#[derive(Clone)]
pub struct IndexerInfo {
    params: Vec<TypeHandle>,
    ty: TypeHandle,
    visibility: Visibility,
    modifiers: Modifiers,
    readable: bool,
    writable: bool,
    declaring_type: Option<Arc<str>>,
    getter: Option<IndexGetterBody>,
    setter: Option<IndexSetterBody>,
}

impl IndexerInfo {
    /// Declare a public indexer with the given index parameter types
    pub fn new(params: Vec<TypeHandle>, ty: TypeHandle) -> Self {
        Self {
            params,
            ty,
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            readable: false,
            writable: false,
            declaring_type: None,
            getter: None,
            setter: None,
        }
    }

    /// Declare a getter without a body
    pub fn readable(mut self) -> Self {
        self.readable = true;
        self
    }

    /// Declare a setter without a body
    pub fn writable(mut self) -> Self {
        self.writable = true;
        self
    }

    /// Attach a getter
    pub fn with_getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> AdaptResult<Value> + Send + Sync + 'static,
    {
        self.readable = true;
        self.getter = Some(Arc::new(getter));
        self
    }

    /// Attach a setter
    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&Value, &[Value], Value) -> AdaptResult<()> + Send + Sync + 'static,
    {
        self.writable = true;
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Attach a getter that receives the receiver's payload as `T`
    pub fn with_typed_getter<T, F>(self, getter: F) -> Self
    where
        T: Any,
        F: Fn(&T, &[Value]) -> AdaptResult<Value> + Send + Sync + 'static,
    {
        self.with_getter(move |receiver, index| {
            getter(downcast_receiver::<T>(INDEXER_NAME, receiver)?, index)
        })
    }

    /// Attach a setter that receives the receiver's payload as `T`
    pub fn with_typed_setter<T, F>(self, setter: F) -> Self
    where
        T: Any,
        F: Fn(&T, &[Value], Value) -> AdaptResult<()> + Send + Sync + 'static,
    {
        self.with_setter(move |receiver, index, value| {
            setter(downcast_receiver::<T>(INDEXER_NAME, receiver)?, index, value)
        })
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as virtual
    pub fn as_virtual(mut self) -> Self {
        self.modifiers.is_virtual = true;
        self
    }

    /// Mark as abstract (and therefore virtual)
    pub fn as_abstract(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self.modifiers.is_virtual = true;
        self
    }

    pub(crate) fn set_declaring_type(&mut self, ty: Arc<str>) {
        self.declaring_type = Some(ty);
    }

    /// Always [`INDEXER_NAME`]
    pub fn name(&self) -> &str {
        INDEXER_NAME
    }

    /// Ordered index parameter types
    pub fn params(&self) -> &[TypeHandle] {
        &self.params
    }

    /// Element type
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Modifiers
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Whether the indexer is public
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Whether the indexer declares a getter
    pub fn can_read(&self) -> bool {
        self.readable
    }

    /// Whether the indexer declares a setter
    pub fn can_write(&self) -> bool {
        self.writable
    }

    /// Whether accessor bodies are attached for every declared accessor
    pub fn has_body(&self) -> bool {
        (!self.readable || self.getter.is_some()) && (!self.writable || self.setter.is_some())
    }

    /// Name of the declaring type
    pub fn declaring_type(&self) -> &str {
        declaring(&self.declaring_type)
    }

    /// Read an element
    pub fn get(&self, receiver: &Value, index: &[Value]) -> AdaptResult<Value> {
        if !self.readable {
            return Err(AdaptError::NotReadable {
                member: INDEXER_NAME.to_string(),
                type_name: self.declaring_type().to_string(),
            });
        }
        check_arguments(INDEXER_NAME, &self.params, index)?;
        match &self.getter {
            Some(getter) => getter(receiver, index),
            None => Err(abstract_member(MemberKind::Indexer, INDEXER_NAME, &self.declaring_type)),
        }
    }

    /// Write an element
    pub fn set(&self, receiver: &Value, index: &[Value], value: Value) -> AdaptResult<()> {
        if !self.writable {
            return Err(AdaptError::NotWritable {
                member: INDEXER_NAME.to_string(),
                type_name: self.declaring_type().to_string(),
            });
        }
        check_arguments(INDEXER_NAME, &self.params, index)?;
        check_value(INDEXER_NAME, &self.ty, &value)?;
        match &self.setter {
            Some(setter) => setter(receiver, index, value),
            None => Err(abstract_member(MemberKind::Indexer, INDEXER_NAME, &self.declaring_type)),
        }
    }
}

impl fmt::Debug for IndexerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexerInfo")
            .field("params", &self.params)
            .field("ty", &self.ty)
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .finish()
    }
}

// ============================================================================
// Fields
// ============================================================================

/// Field descriptor
///
/// Field storage lives in the object's payload, so a field is registered
/// with accessor closures just like a property. A field without a setter is
/// read-only.
#[derive(Clone)]
pub struct FieldInfo {
    name: Arc<str>,
    ty: TypeHandle,
    visibility: Visibility,
    modifiers: Modifiers,
    declaring_type: Option<Arc<str>>,
    getter: Option<GetterBody>,
    setter: Option<SetterBody>,
}

impl FieldInfo {
    /// Declare a public instance field
    pub fn new(name: impl Into<Arc<str>>, ty: TypeHandle) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            declaring_type: None,
            getter: None,
            setter: None,
        }
    }

    /// Attach the read accessor
    pub fn with_getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Value) -> AdaptResult<Value> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    /// Attach the write accessor
    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&Value, Value) -> AdaptResult<()> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    pub(crate) fn set_declaring_type(&mut self, ty: Arc<str>) {
        self.declaring_type = Some(ty);
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field type
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Modifiers
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Whether the field can be written
    pub fn is_readonly(&self) -> bool {
        self.setter.is_none()
    }

    /// Name of the declaring type
    pub fn declaring_type(&self) -> &str {
        declaring(&self.declaring_type)
    }

    /// Read the field
    pub fn get(&self, receiver: &Value) -> AdaptResult<Value> {
        match &self.getter {
            Some(getter) => getter(receiver),
            None => Err(AdaptError::NotReadable {
                member: self.name.to_string(),
                type_name: self.declaring_type().to_string(),
            }),
        }
    }

    /// Write the field
    pub fn set(&self, receiver: &Value, value: Value) -> AdaptResult<()> {
        check_value(&self.name, &self.ty, &value)?;
        match &self.setter {
            Some(setter) => setter(receiver, value),
            None => Err(AdaptError::NotWritable {
                member: self.name.to_string(),
                type_name: self.declaring_type().to_string(),
            }),
        }
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("visibility", &self.visibility)
            .field("is_static", &self.modifiers.is_static)
            .finish()
    }
}

// ============================================================================
// Constructors
// ============================================================================

/// Constructor descriptor
#[derive(Clone)]
pub struct ConstructorInfo {
    params: Vec<TypeHandle>,
    visibility: Visibility,
    declaring_type: Option<Arc<str>>,
    body: ConstructorBody,
}

impl ConstructorInfo {
    /// Declare a public constructor
    pub fn new<F>(params: Vec<TypeHandle>, body: F) -> Self
    where
        F: Fn(&[Value]) -> AdaptResult<Value> + Send + Sync + 'static,
    {
        Self {
            params,
            visibility: Visibility::Public,
            declaring_type: None,
            body: Arc::new(body),
        }
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub(crate) fn set_declaring_type(&mut self, ty: Arc<str>) {
        self.declaring_type = Some(ty);
    }

    /// Ordered parameter types
    pub fn params(&self) -> &[TypeHandle] {
        &self.params
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Name of the declaring type
    pub fn declaring_type(&self) -> &str {
        declaring(&self.declaring_type)
    }

    /// Create a new instance
    pub fn construct(&self, args: &[Value]) -> AdaptResult<Value> {
        check_arguments(self.declaring_type(), &self.params, args)?;
        (self.body)(args)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("declaring_type", &self.declaring_type())
            .field("params", &self.params)
            .finish()
    }
}

// ============================================================================
// Events
// ============================================================================

/// Event descriptor
#[derive(Clone)]
pub struct EventInfo {
    name: Arc<str>,
    handler_type: TypeHandle,
    visibility: Visibility,
    modifiers: Modifiers,
    declaring_type: Option<Arc<str>>,
    add: Option<EventAccessor>,
    remove: Option<EventAccessor>,
}

impl EventInfo {
    /// Declare a public event accepting handlers of `handler_type`
    pub fn new(name: impl Into<Arc<str>>, handler_type: TypeHandle) -> Self {
        Self {
            name: name.into(),
            handler_type,
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            declaring_type: None,
            add: None,
            remove: None,
        }
    }

    /// Attach add and remove accessors
    pub fn with_accessors<A, R>(mut self, add: A, remove: R) -> Self
    where
        A: Fn(&Value, &Handler) -> AdaptResult<()> + Send + Sync + 'static,
        R: Fn(&Value, &Handler) -> AdaptResult<()> + Send + Sync + 'static,
    {
        self.add = Some(Arc::new(add));
        self.remove = Some(Arc::new(remove));
        self
    }

    /// Attach accessors that receive the receiver's payload as `T`
    pub fn with_typed_accessors<T, A, R>(self, add: A, remove: R) -> Self
    where
        T: Any,
        A: Fn(&T, &Handler) -> AdaptResult<()> + Send + Sync + 'static,
        R: Fn(&T, &Handler) -> AdaptResult<()> + Send + Sync + 'static,
    {
        let add_name = self.name.clone();
        let remove_name = self.name.clone();
        self.with_accessors(
            move |receiver, handler| add(downcast_receiver::<T>(&add_name, receiver)?, handler),
            move |receiver, handler| {
                remove(downcast_receiver::<T>(&remove_name, receiver)?, handler)
            },
        )
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as virtual
    pub fn as_virtual(mut self) -> Self {
        self.modifiers.is_virtual = true;
        self
    }

    /// Mark as abstract (and therefore virtual)
    pub fn as_abstract(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self.modifiers.is_virtual = true;
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    pub(crate) fn set_declaring_type(&mut self, ty: Arc<str>) {
        self.declaring_type = Some(ty);
    }

    /// Event name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted handler type
    pub fn handler_type(&self) -> &TypeHandle {
        &self.handler_type
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Modifiers
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Whether the event is public
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Whether accessors are attached
    pub fn has_body(&self) -> bool {
        self.add.is_some() && self.remove.is_some()
    }

    /// Name of the declaring type
    pub fn declaring_type(&self) -> &str {
        declaring(&self.declaring_type)
    }

    fn run(&self, accessor: &Option<EventAccessor>, receiver: &Value, handler: &Handler) -> AdaptResult<()> {
        if !self.handler_type.is_assignable_from(handler.handler_type()) {
            return Err(AdaptError::ArgumentMismatch {
                member: self.name.to_string(),
                message: format!(
                    "handler is {}, expected {}",
                    handler.handler_type(),
                    self.handler_type
                ),
            });
        }
        match accessor {
            Some(accessor) => accessor(receiver, handler),
            None => Err(abstract_member(MemberKind::Event, &self.name, &self.declaring_type)),
        }
    }

    /// Subscribe `handler`
    pub fn add_handler(&self, receiver: &Value, handler: &Handler) -> AdaptResult<()> {
        self.run(&self.add, receiver, handler)
    }

    /// Unsubscribe `handler`
    pub fn remove_handler(&self, receiver: &Value, handler: &Handler) -> AdaptResult<()> {
        self.run(&self.remove, receiver, handler)
    }
}

impl fmt::Debug for EventInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventInfo")
            .field("name", &self.name)
            .field("handler_type", &self.handler_type)
            .field("has_body", &self.has_body())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Buffer;

    struct Doubler;

    #[test]
    fn test_method_invoke_checks_arguments() {
        let method = MethodInfo::new("double", vec![TypeHandle::i32()], TypeHandle::i32())
            .with_typed_body::<Doubler, _>(|_, args| Ok(Value::I32(args[0].as_i32().unwrap_or(0) * 2)));

        let ty = crate::builder::TypeBuilder::class("Doubler").build().unwrap();
        let receiver = Value::object(&ty, Doubler);

        assert_eq!(method.invoke(&receiver, &[Value::I32(4)]).unwrap(), Value::I32(8));
        assert!(matches!(
            method.invoke(&receiver, &[Value::I64(4)]),
            Err(AdaptError::ArgumentMismatch { .. })
        ));
        assert!(matches!(
            method.invoke(&receiver, &[]),
            Err(AdaptError::ArgumentMismatch { .. })
        ));
        assert!(matches!(
            method.invoke(&Value::from("nope"), &[Value::I32(1)]),
            Err(AdaptError::ReceiverMismatch { .. })
        ));
    }

    #[test]
    fn test_abstract_method() {
        let method = MethodInfo::new("run", vec![], TypeHandle::void()).as_abstract();
        assert!(method.modifiers().is_overridable());
        assert!(!method.has_body());
        assert!(matches!(
            method.invoke(&Value::Null, &[]),
            Err(AdaptError::AbstractMember { kind: MemberKind::Method, .. })
        ));
    }

    #[test]
    fn test_static_is_not_overridable() {
        let method = MethodInfo::new("make", vec![], TypeHandle::object())
            .as_static()
            .as_virtual();
        assert!(!method.modifiers().is_overridable());
    }

    #[test]
    fn test_property_access_rules() {
        let read_only = PropertyInfo::new("Length", TypeHandle::i32()).with_getter(|_| Ok(Value::I32(3)));
        assert!(read_only.can_read());
        assert!(!read_only.can_write());
        assert_eq!(read_only.get(&Value::Null).unwrap(), Value::I32(3));
        assert!(matches!(
            read_only.set(&Value::Null, Value::I32(1)),
            Err(AdaptError::NotWritable { .. })
        ));

        let declared = PropertyInfo::new("Name", TypeHandle::string()).readable().writable();
        assert!(!declared.has_body());
        assert!(matches!(
            declared.get(&Value::Null),
            Err(AdaptError::AbstractMember { kind: MemberKind::Property, .. })
        ));
        assert!(matches!(
            declared.set(&Value::Null, Value::I32(1)),
            Err(AdaptError::ArgumentMismatch { .. })
        ));
    }

    #[test]
    fn test_indexer_checks_index_and_value() {
        let indexer = IndexerInfo::new(vec![TypeHandle::i32()], TypeHandle::string())
            .with_getter(|_, index| Ok(Value::from(format!("#{}", index[0]))))
            .with_setter(|_, _, _| Ok(()));

        assert_eq!(indexer.name(), INDEXER_NAME);
        assert_eq!(indexer.get(&Value::Null, &[Value::I32(2)]).unwrap(), Value::from("#2"));
        assert!(indexer.get(&Value::Null, &[Value::from("2")]).is_err());
        assert!(indexer
            .set(&Value::Null, &[Value::I32(2)], Value::from(Buffer::new(1)))
            .is_err());
        // null is a valid string
        indexer.set(&Value::Null, &[Value::I32(2)], Value::Null).unwrap();
    }

    #[test]
    fn test_event_rejects_wrong_handler_type() {
        let click = crate::builder::TypeBuilder::class("ClickHandler")
            .parent(&TypeHandle::handler())
            .build()
            .unwrap();
        let event = EventInfo::new("Clicked", click.clone()).with_accessors(|_, _| Ok(()), |_, _| Ok(()));

        let plain = Handler::new(|_| Ok(Value::Null));
        assert!(event.add_handler(&Value::Null, &plain).is_err());

        let typed = Handler::with_type(&click, |_| Ok(Value::Null));
        event.add_handler(&Value::Null, &typed).unwrap();
        event.remove_handler(&Value::Null, &typed).unwrap();
    }

    #[test]
    fn test_constructor_checks_arguments() {
        let ctor = ConstructorInfo::new(vec![TypeHandle::i32()], |args| Ok(args[0].clone()));
        assert_eq!(ctor.construct(&[Value::I32(1)]).unwrap(), Value::I32(1));
        assert!(ctor.construct(&[]).is_err());
    }
}
