//! Event handlers and event sources

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::AdaptResult;
use crate::ty::TypeHandle;
use crate::value::Value;

type HandlerFn = dyn Fn(&[Value]) -> AdaptResult<Value> + Send + Sync;

/// Shareable event callback
///
/// Clones compare equal to each other; two handlers built from separate
/// closures never do.
#[derive(Clone)]
pub struct Handler {
    ty: TypeHandle,
    f: Arc<HandlerFn>,
}

impl Handler {
    /// Create a handler of the base handler type
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> AdaptResult<Value> + Send + Sync + 'static,
    {
        Self::with_type(&TypeHandle::handler(), f)
    }

    /// Create a handler of a specific delegate type
    pub fn with_type<F>(ty: &TypeHandle, f: F) -> Self
    where
        F: Fn(&[Value]) -> AdaptResult<Value> + Send + Sync + 'static,
    {
        Self {
            ty: ty.clone(),
            f: Arc::new(f),
        }
    }

    /// Delegate type
    pub fn handler_type(&self) -> &TypeHandle {
        &self.ty
    }

    /// Call the handler
    pub fn call(&self, args: &[Value]) -> AdaptResult<Value> {
        (self.f)(args)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        // Compare data pointers only; vtable pointers are not unique.
        std::ptr::eq(
            Arc::as_ptr(&self.f) as *const (),
            Arc::as_ptr(&other.f) as *const (),
        )
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({} @ {:p})", self.ty, Arc::as_ptr(&self.f) as *const ())
    }
}

/// Subscriber list backing an event
#[derive(Default)]
pub struct EventSource {
    handlers: Mutex<Vec<Handler>>,
}

impl EventSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler
    pub fn add(&self, handler: &Handler) {
        self.handlers.lock().push(handler.clone());
    }

    /// Unsubscribe the most recently added occurrence of `handler`
    ///
    /// Returns `false` when the handler was not subscribed.
    pub fn remove(&self, handler: &Handler) -> bool {
        let mut handlers = self.handlers.lock();
        match handlers.iter().rposition(|h| h == handler) {
            Some(pos) => {
                handlers.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Call every subscriber in subscription order, stopping at the first failure
    pub fn raise(&self, args: &[Value]) -> AdaptResult<()> {
        let snapshot = self.handlers.lock().clone();
        for handler in &snapshot {
            handler.call(args)?;
        }
        Ok(())
    }

    /// Number of subscriptions
    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Check if nothing is subscribed
    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }
}

impl fmt::Debug for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventSource({} handlers)", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_handler_identity() {
        let a = Handler::new(|_| Ok(Value::Null));
        let b = Handler::new(|_| Ok(Value::Null));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.handler_type(), &TypeHandle::handler());
    }

    #[test]
    fn test_event_source_raise_and_remove() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let handler = Handler::new(move |args| {
            counter.fetch_add(args.len(), Ordering::SeqCst);
            Ok(Value::Null)
        });

        let source = EventSource::new();
        source.add(&handler);
        source.add(&handler);
        source.raise(&[Value::I32(1)]).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        assert!(source.remove(&handler));
        assert_eq!(source.len(), 1);
        assert!(source.remove(&handler));
        assert!(!source.remove(&handler));
        assert!(source.is_empty());
    }
}
