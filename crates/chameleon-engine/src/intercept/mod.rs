//! Interception policies
//!
//! An [`Interceptor`] sees every access made through an intercepted adapter
//! before it reaches the underlying instance. Every capability has a default
//! body that forwards reflectively, so a policy only overrides what it needs.
//!
//! | Capability    | Triggered by                          |
//! |---------------|---------------------------------------|
//! | `invoke`      | contract method call                  |
//! | `get` / `set` | contract property read / write        |
//! | `get_indexed` | contract indexer read                 |
//! | `set_indexed` | contract indexer write                |
//! | `hook`        | event subscription                    |
//! | `unhook`      | event unsubscription                  |

pub mod forward;

use std::sync::Arc;

use chameleon_types::{AdaptResult, Handler, Value};
use tracing::debug;

/// Policy object consulted by intercepted adapters
///
/// `instance` is always the underlying value, never the adapter.
pub trait Interceptor: Send + Sync {
    /// Intercept a method call
    fn invoke(&self, instance: &Value, method: &str, args: &[Value]) -> AdaptResult<Value> {
        forward::invoke(instance, method, args)
    }

    /// Intercept a property read
    fn get(&self, instance: &Value, property: &str) -> AdaptResult<Value> {
        forward::get(instance, property)
    }

    /// Intercept a property write
    fn set(&self, instance: &Value, property: &str, value: Value) -> AdaptResult<()> {
        forward::set(instance, property, value)
    }

    /// Intercept an indexer read
    fn get_indexed(&self, instance: &Value, index: &[Value]) -> AdaptResult<Value> {
        forward::get_indexed(instance, index)
    }

    /// Intercept an indexer write
    fn set_indexed(&self, instance: &Value, index: &[Value], value: Value) -> AdaptResult<()> {
        forward::set_indexed(instance, index, value)
    }

    /// Intercept an event subscription
    fn hook(&self, instance: &Value, event: &str, handler: &Handler) -> AdaptResult<()> {
        forward::hook(instance, event, handler)
    }

    /// Intercept an event unsubscription
    fn unhook(&self, instance: &Value, event: &str, handler: &Handler) -> AdaptResult<()> {
        forward::unhook(instance, event, handler)
    }
}

/// Policy that only forwards
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultInterceptor;

impl Interceptor for DefaultInterceptor {}

/// Policy that logs every access at debug level, then delegates
pub struct TracingInterceptor {
    inner: Arc<dyn Interceptor>,
}

impl TracingInterceptor {
    /// Log, then forward reflectively
    pub fn new() -> Self {
        Self::wrap(Arc::new(DefaultInterceptor))
    }

    /// Log, then delegate to `inner`
    pub fn wrap(inner: Arc<dyn Interceptor>) -> Self {
        Self { inner }
    }
}

impl Default for TracingInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Interceptor for TracingInterceptor {
    fn invoke(&self, instance: &Value, method: &str, args: &[Value]) -> AdaptResult<Value> {
        debug!(ty = %instance.type_of(), method, args = args.len(), "invoke");
        self.inner.invoke(instance, method, args)
    }

    fn get(&self, instance: &Value, property: &str) -> AdaptResult<Value> {
        debug!(ty = %instance.type_of(), property, "get");
        self.inner.get(instance, property)
    }

    fn set(&self, instance: &Value, property: &str, value: Value) -> AdaptResult<()> {
        debug!(ty = %instance.type_of(), property, value = %value, "set");
        self.inner.set(instance, property, value)
    }

    fn get_indexed(&self, instance: &Value, index: &[Value]) -> AdaptResult<Value> {
        debug!(ty = %instance.type_of(), index = ?index, "get_indexed");
        self.inner.get_indexed(instance, index)
    }

    fn set_indexed(&self, instance: &Value, index: &[Value], value: Value) -> AdaptResult<()> {
        debug!(ty = %instance.type_of(), index = ?index, value = %value, "set_indexed");
        self.inner.set_indexed(instance, index, value)
    }

    fn hook(&self, instance: &Value, event: &str, handler: &Handler) -> AdaptResult<()> {
        debug!(ty = %instance.type_of(), event, "hook");
        self.inner.hook(instance, event, handler)
    }

    fn unhook(&self, instance: &Value, event: &str, handler: &Handler) -> AdaptResult<()> {
        debug!(ty = %instance.type_of(), event, "unhook");
        self.inner.unhook(instance, event, handler)
    }
}
