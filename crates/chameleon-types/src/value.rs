//! Values carried through adapters
//!
//! [`Value`] is the argument and result carrier for every forwarded call.
//! Value-typed payloads are stored inline; references (`Str`, `Buffer`,
//! `Object`, `Handler`) are shared.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{AdaptError, AdaptResult};
use crate::handler::Handler;
use crate::ty::TypeHandle;

// ============================================================================
// Buffer
// ============================================================================

/// Shared, mutable byte buffer
///
/// Clones refer to the same storage, so a callee can fill a buffer the caller
/// passed in.
#[derive(Clone, Default)]
pub struct Buffer(Arc<RwLock<Vec<u8>>>);

impl Buffer {
    /// Create a zero-filled buffer
    pub fn new(len: usize) -> Self {
        Buffer(Arc::new(RwLock::new(vec![0; len])))
    }

    /// Wrap existing bytes
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Buffer(Arc::new(RwLock::new(bytes)))
    }

    /// Current length
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Borrow the bytes
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.0.read()
    }

    /// Borrow the bytes mutably
    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.0.write()
    }

    /// Copy the bytes out
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.read().clone()
    }

    /// Check whether two handles share storage
    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer(len={})", self.len())
    }
}

// ============================================================================
// ObjectRef
// ============================================================================

struct ObjectInner {
    ty: TypeHandle,
    payload: Box<dyn Any + Send + Sync>,
}

/// Shared reference to a reflected object: its runtime type plus a Rust payload
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectInner>);

impl ObjectRef {
    /// Wrap a payload as an instance of `ty`
    pub fn new<T: Any + Send + Sync>(ty: &TypeHandle, payload: T) -> Self {
        ObjectRef(Arc::new(ObjectInner {
            ty: ty.clone(),
            payload: Box::new(payload),
        }))
    }

    /// The object's runtime type
    pub fn runtime_type(&self) -> &TypeHandle {
        &self.0.ty
    }

    /// Borrow the payload as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.payload.downcast_ref::<T>()
    }

    /// Check whether the payload is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.0.payload.is::<T>()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({} @ {:p})", self.0.ty, Arc::as_ptr(&self.0))
    }
}

// ============================================================================
// Value
// ============================================================================

/// Variant argument and result carrier
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// Absent reference, also the result of void members
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 64-bit float
    F64(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Shared byte buffer
    Buffer(Buffer),
    /// Reflected object
    Object(ObjectRef),
    /// Event handler
    Handler(Handler),
}

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Wrap a payload as an object of type `ty`
    pub fn object<T: Any + Send + Sync>(ty: &TypeHandle, payload: T) -> Self {
        Value::Object(ObjectRef::new(ty, payload))
    }

    /// Runtime type of this value
    pub fn type_of(&self) -> TypeHandle {
        match self {
            Value::Null => TypeHandle::null(),
            Value::Bool(_) => TypeHandle::bool(),
            Value::I32(_) => TypeHandle::i32(),
            Value::I64(_) => TypeHandle::i64(),
            Value::F64(_) => TypeHandle::f64(),
            Value::Str(_) => TypeHandle::string(),
            Value::Buffer(_) => TypeHandle::buffer(),
            Value::Object(obj) => obj.runtime_type().clone(),
            Value::Handler(handler) => handler.handler_type().clone(),
        }
    }

    /// Check if this is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as boolean if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i32 if this is an i32
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as i64 if this is an i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is an f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrow as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as buffer
    pub fn as_buffer(&self) -> Option<&Buffer> {
        match self {
            Value::Buffer(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow as object reference
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow as handler
    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }

    fn conversion(&self, expected: &str) -> AdaptError {
        AdaptError::Conversion {
            expected: expected.to_string(),
            actual: self.type_of().name().to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I32(i) => write!(f, "{}", i),
            Value::I64(i) => write!(f, "{}", i),
            Value::F64(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Buffer(b) => write!(f, "<buffer len={}>", b.len()),
            Value::Object(obj) => write!(f, "<{}>", obj.runtime_type()),
            Value::Handler(h) => write!(f, "<{}>", h.handler_type()),
        }
    }
}

// ===== Conversions into Value =====

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::I32(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::F64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Buffer> for Value {
    fn from(b: Buffer) -> Self {
        Value::Buffer(b)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<Handler> for Value {
    fn from(h: Handler) -> Self {
        Value::Handler(h)
    }
}

// ===== Conversions out of Value =====

impl TryFrom<Value> for bool {
    type Error = AdaptError;

    fn try_from(value: Value) -> AdaptResult<Self> {
        value.as_bool().ok_or_else(|| value.conversion("bool"))
    }
}

impl TryFrom<Value> for i32 {
    type Error = AdaptError;

    fn try_from(value: Value) -> AdaptResult<Self> {
        value.as_i32().ok_or_else(|| value.conversion("i32"))
    }
}

impl TryFrom<Value> for i64 {
    type Error = AdaptError;

    fn try_from(value: Value) -> AdaptResult<Self> {
        value.as_i64().ok_or_else(|| value.conversion("i64"))
    }
}

impl TryFrom<Value> for f64 {
    type Error = AdaptError;

    fn try_from(value: Value) -> AdaptResult<Self> {
        value.as_f64().ok_or_else(|| value.conversion("f64"))
    }
}

impl TryFrom<Value> for String {
    type Error = AdaptError;

    fn try_from(value: Value) -> AdaptResult<Self> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(other.conversion("string")),
        }
    }
}

impl TryFrom<Value> for Buffer {
    type Error = AdaptError;

    fn try_from(value: Value) -> AdaptResult<Self> {
        match value {
            Value::Buffer(b) => Ok(b),
            other => Err(other.conversion("buffer")),
        }
    }
}

impl TryFrom<Value> for ObjectRef {
    type Error = AdaptError;

    fn try_from(value: Value) -> AdaptResult<Self> {
        match value {
            Value::Object(obj) => Ok(obj),
            other => Err(other.conversion("object")),
        }
    }
}

impl TryFrom<Value> for Handler {
    type Error = AdaptError;

    fn try_from(value: Value) -> AdaptResult<Self> {
        match value {
            Value::Handler(h) => Ok(h),
            other => Err(other.conversion("handler")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_of_primitives() {
        assert_eq!(Value::Null.type_of(), TypeHandle::null());
        assert_eq!(Value::from(true).type_of(), TypeHandle::bool());
        assert_eq!(Value::from(1i32).type_of(), TypeHandle::i32());
        assert_eq!(Value::from(1i64).type_of(), TypeHandle::i64());
        assert_eq!(Value::from(1.5).type_of(), TypeHandle::f64());
        assert_eq!(Value::from("x").type_of(), TypeHandle::string());
        assert_eq!(Value::from(Buffer::new(2)).type_of(), TypeHandle::buffer());
    }

    #[test]
    fn test_object_payload() {
        struct Counter(u32);
        let ty = crate::builder::TypeBuilder::class("Counter").build().unwrap();
        let value = Value::object(&ty, Counter(7));

        assert_eq!(value.type_of(), ty);
        let obj = value.as_object().unwrap();
        assert!(obj.is::<Counter>());
        assert_eq!(obj.downcast_ref::<Counter>().unwrap().0, 7);
        assert!(obj.downcast_ref::<String>().is_none());

        // Equality is identity
        let other = Value::object(&ty, Counter(7));
        assert_eq!(value, value.clone());
        assert_ne!(value, other);
    }

    #[test]
    fn test_buffer_is_shared() {
        let buf = Buffer::new(4);
        let alias = buf.clone();
        alias.write()[1] = 9;
        assert_eq!(buf.to_vec(), vec![0, 9, 0, 0]);
        assert!(buf.ptr_eq(&alias));
        assert_ne!(buf, Buffer::new(4));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(i32::try_from(Value::I32(4)).unwrap(), 4);
        assert_eq!(String::try_from(Value::from("hi")).unwrap(), "hi");

        let err = i32::try_from(Value::from("hi")).unwrap_err();
        assert_eq!(
            err,
            AdaptError::Conversion {
                expected: "i32".to_string(),
                actual: "string".to_string(),
            }
        );
    }
}
