//! Adapter objects
//!
//! An adapter object is an ordinary [`Value::Object`] of the generated type.
//! Its payload holds the underlying instance and, for intercepted types, the
//! policy slot the factory fills after construction.
//!
//! ```rust,ignore
//! if let Some(inner) = try_unwrap_adapter(&value) {
//!     // `inner` is the wrapped instance
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use chameleon_types::{
    downcast_receiver, AdaptError, AdaptResult, Handler, MemberKind, TypeHandle, Value, INDEXER_NAME,
};
use once_cell::sync::OnceCell;

use super::AdapterType;
use crate::intercept::{DefaultInterceptor, Interceptor};
use crate::reflect::Reflector;

static DEFAULT_POLICY: DefaultInterceptor = DefaultInterceptor;

/// Payload of every adapter object
pub(crate) struct AdapterState {
    pub(crate) instance: Value,
    pub(crate) interceptor: OnceCell<Arc<dyn Interceptor>>,
}

impl AdapterState {
    pub(crate) fn new(instance: Value) -> Self {
        Self {
            instance,
            interceptor: OnceCell::new(),
        }
    }

    /// Borrow the state of an adapter receiver
    pub(crate) fn of<'a>(member: &str, receiver: &'a Value) -> AdaptResult<&'a AdapterState> {
        downcast_receiver::<AdapterState>(member, receiver)
    }

    /// Fill the policy slot of a freshly constructed adapter
    pub(crate) fn attach(&self, adapter: &str, policy: Arc<dyn Interceptor>) -> AdaptResult<()> {
        self.interceptor.set(policy).map_err(|_| {
            AdaptError::Invocation(format!("interception policy of {} is already attached", adapter))
        })
    }

    /// The attached policy
    pub(crate) fn policy(&self, adapter: &str) -> AdaptResult<&dyn Interceptor> {
        self.interceptor
            .get()
            .map(|p| &**p)
            .ok_or_else(|| AdaptError::InterceptorMissing {
                type_name: adapter.to_string(),
            })
    }

    /// The attached policy, or the reflective default for non-intercepted types
    pub(crate) fn policy_or_default(&self, adapter: &str, intercepted: bool) -> AdaptResult<&dyn Interceptor> {
        if intercepted {
            self.policy(adapter)
        } else {
            Ok(&DEFAULT_POLICY)
        }
    }
}

/// Typed handle to an adapter object
///
/// Calls resolve against the adapter type's dispatch table first and fall
/// back to members the generated type inherits from a class contract.
#[derive(Clone)]
pub struct Adapter {
    value: Value,
    ty: Arc<AdapterType>,
}

impl Adapter {
    pub(crate) fn new(value: Value, ty: Arc<AdapterType>) -> Self {
        Self { value, ty }
    }

    /// The adapter object, typed as the generated type
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Consume the handle, returning the adapter object
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Generated type and dispatch table
    pub fn adapter_type(&self) -> &Arc<AdapterType> {
        &self.ty
    }

    /// Runtime type of the adapter object
    pub fn runtime_type(&self) -> TypeHandle {
        self.value.type_of()
    }

    fn state(&self) -> AdaptResult<&AdapterState> {
        AdapterState::of(self.ty.name(), &self.value)
    }

    /// The wrapped instance
    pub fn underlying(&self) -> AdaptResult<&Value> {
        Ok(&self.state()?.instance)
    }

    /// The attached interception policy, if any
    pub fn interceptor(&self) -> Option<Arc<dyn Interceptor>> {
        self.state().ok().and_then(|s| s.interceptor.get().cloned())
    }

    fn inherited(&self) -> Reflector {
        Reflector::new(self.ty.descriptor())
    }

    fn missing(&self, kind: MemberKind, member: &str) -> AdaptError {
        AdaptError::missing(kind, member, self.ty.descriptor())
    }

    /// Call a contract method
    pub fn invoke(&self, method: &str, args: &[Value]) -> AdaptResult<Value> {
        let arg_types: Vec<TypeHandle> = args.iter().map(Value::type_of).collect();
        let info = match self.ty.find_method(method, &arg_types) {
            Some(info) => info,
            None => self
                .inherited()
                .get_method(method, &arg_types)
                .ok_or_else(|| self.missing(MemberKind::Method, method))?,
        };
        info.invoke(&self.value, args)
    }

    /// Read a contract property
    pub fn get(&self, property: &str) -> AdaptResult<Value> {
        let info = match self.ty.find_property(property) {
            Some(info) => info,
            None => self
                .inherited()
                .get_property(property)
                .ok_or_else(|| self.missing(MemberKind::Property, property))?,
        };
        info.get(&self.value)
    }

    /// Write a contract property
    pub fn set(&self, property: &str, value: Value) -> AdaptResult<()> {
        let info = match self.ty.find_property(property) {
            Some(info) => info,
            None => self
                .inherited()
                .get_property(property)
                .ok_or_else(|| self.missing(MemberKind::Property, property))?,
        };
        info.set(&self.value, value)
    }

    /// Read through a contract indexer
    pub fn get_indexed(&self, index: &[Value]) -> AdaptResult<Value> {
        let index_types: Vec<TypeHandle> = index.iter().map(Value::type_of).collect();
        let info = match self.ty.find_indexer(&index_types) {
            Some(info) => info,
            None => self
                .inherited()
                .get_indexer(&index_types)
                .ok_or_else(|| self.missing(MemberKind::Indexer, INDEXER_NAME))?,
        };
        info.get(&self.value, index)
    }

    /// Write through a contract indexer
    pub fn set_indexed(&self, index: &[Value], value: Value) -> AdaptResult<()> {
        let index_types: Vec<TypeHandle> = index.iter().map(Value::type_of).collect();
        let info = match self.ty.find_indexer(&index_types) {
            Some(info) => info,
            None => self
                .inherited()
                .get_indexer(&index_types)
                .ok_or_else(|| self.missing(MemberKind::Indexer, INDEXER_NAME))?,
        };
        info.set(&self.value, index, value)
    }

    /// Subscribe to a contract event
    pub fn hook(&self, event: &str, handler: &Handler) -> AdaptResult<()> {
        let info = match self.ty.find_event(event) {
            Some(info) => info,
            None => self
                .inherited()
                .get_event(event)
                .ok_or_else(|| self.missing(MemberKind::Event, event))?,
        };
        info.add_handler(&self.value, handler)
    }

    /// Unsubscribe from a contract event
    pub fn unhook(&self, event: &str, handler: &Handler) -> AdaptResult<()> {
        let info = match self.ty.find_event(event) {
            Some(info) => info,
            None => self
                .inherited()
                .get_event(event)
                .ok_or_else(|| self.missing(MemberKind::Event, event))?,
        };
        info.remove_handler(&self.value, handler)
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("type", &self.ty.descriptor())
            .field("underlying", &self.state().map(|s| &s.instance).ok())
            .finish()
    }
}

impl From<Adapter> for Value {
    fn from(adapter: Adapter) -> Self {
        adapter.value
    }
}

// ============================================================================
// Unwrapping
// ============================================================================

fn state_of(value: &Value) -> Option<&AdapterState> {
    value.as_object().and_then(|obj| obj.downcast_ref::<AdapterState>())
}

/// Check if a value is an adapter object
pub fn is_adapter(value: &Value) -> bool {
    state_of(value).is_some()
}

/// The instance wrapped by an adapter object, or `None` if `value` is not one
pub fn try_unwrap_adapter(value: &Value) -> Option<Value> {
    state_of(value).map(|state| state.instance.clone())
}

/// Unwrap nested adapters down to the innermost instance
pub fn unwrap_adapter_deep(value: &Value) -> Value {
    let mut current = value.clone();
    while let Some(inner) = try_unwrap_adapter(&current) {
        current = inner;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use chameleon_types::TypeBuilder;

    #[test]
    fn test_policy_attaches_once() {
        let ty = TypeBuilder::class("Plain").build().unwrap();
        let state = AdapterState::new(Value::object(&ty, ()));
        assert!(matches!(
            state.policy("PlainProxy"),
            Err(AdaptError::InterceptorMissing { .. })
        ));

        state.attach("PlainProxy", Arc::new(DefaultInterceptor)).unwrap();
        assert!(state.policy("PlainProxy").is_ok());

        let err = state.attach("PlainProxy", Arc::new(DefaultInterceptor)).unwrap_err();
        assert!(err.to_string().contains("PlainProxy"));
    }

    #[test]
    fn test_default_policy_only_without_interception() {
        let ty = TypeBuilder::class("Plain").build().unwrap();
        let state = AdapterState::new(Value::object(&ty, ()));
        assert!(state.policy_or_default("PlainAdapter", false).is_ok());
        assert!(state.policy_or_default("PlainProxy", true).is_err());
    }
}
