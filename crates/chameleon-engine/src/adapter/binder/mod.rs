//! Member binders
//!
//! One binder per member kind turns a contract member into a generated member
//! whose bodies forward to the underlying instance. The strategy is decided
//! once, here, and captured by the bodies.

mod event;
mod indexer;
mod method;
mod property;

pub(crate) use event::EventBinder;
pub(crate) use indexer::IndexerBinder;
pub(crate) use method::MethodBinder;
pub(crate) use property::PropertyBinder;

use std::sync::Arc;

use chameleon_types::{AdaptError, AdaptResult, TypeHandle, Value};
use dashmap::DashMap;
use tracing::trace;

use super::{BindingKind, MemberBinding};
use crate::config::BindingOptions;
use crate::reflect::Reflector;

/// Inputs shared by every binder for one adapter type
pub(crate) struct BindContext {
    pub(crate) adapter_name: Arc<str>,
    pub(crate) underlying: Reflector,
    pub(crate) intercepted: bool,
    pub(crate) options: BindingOptions,
}

/// Forwarding strategy for one accessor
pub(crate) enum Strategy<T> {
    Direct(Arc<T>),
    Dynamic,
    Intercepted,
}

impl<T> Strategy<T> {
    pub(crate) fn kind(&self) -> BindingKind {
        match self {
            Strategy::Direct(_) => BindingKind::Direct,
            Strategy::Dynamic => BindingKind::Dynamic,
            Strategy::Intercepted => BindingKind::Intercepted,
        }
    }
}

impl BindContext {
    /// Decide how `accessor` reaches the underlying instance
    ///
    /// Interception wins over everything; otherwise a direct candidate is used
    /// when direct binding is enabled and one exists.
    pub(crate) fn choose<T, F>(&self, accessor: &str, find_direct: F) -> Strategy<T>
    where
        F: FnOnce() -> Option<Arc<T>>,
    {
        let strategy = if self.intercepted {
            Strategy::Intercepted
        } else if !self.options.direct_binding {
            Strategy::Dynamic
        } else {
            find_direct().map_or(Strategy::Dynamic, Strategy::Direct)
        };
        trace!(
            adapter = %self.adapter_name,
            member = accessor,
            binding = %strategy.kind(),
            "member bound"
        );
        strategy
    }
}

/// Member resolved at synthesis time, re-dispatched for derived instances
///
/// An adapter type bound against `T` also accepts instances of types deriving
/// from `T`. Those calls go to the most derived member with the target's
/// signature, resolved once per runtime type.
pub(crate) struct DirectTarget<M> {
    bound: TypeHandle,
    target: Arc<M>,
    overrides: DashMap<u64, Arc<M>>,
}

impl<M> DirectTarget<M> {
    pub(crate) fn new(bound: &TypeHandle, target: Arc<M>) -> Self {
        Self {
            bound: bound.clone(),
            target,
            overrides: DashMap::new(),
        }
    }

    /// The member to call on `instance`
    ///
    /// `find` receives the instance's runtime type and the bound member; when
    /// it finds nothing the bound member is used.
    pub(crate) fn resolve<F>(&self, instance: &Value, find: F) -> Arc<M>
    where
        F: FnOnce(&Reflector, &M) -> Option<Arc<M>>,
    {
        let runtime = instance.type_of();
        if runtime == self.bound {
            return self.target.clone();
        }
        if let Some(resolved) = self.overrides.get(&runtime.id()) {
            return resolved.clone();
        }
        let resolved = find(&Reflector::new(&runtime), &self.target).unwrap_or_else(|| self.target.clone());
        trace!(bound = %self.bound, runtime = %runtime, "direct target re-dispatched");
        self.overrides.insert(runtime.id(), resolved.clone());
        resolved
    }
}

/// Generated member plus the binding decisions behind it
pub(crate) struct Bound<M> {
    pub(crate) member: M,
    pub(crate) bindings: Vec<MemberBinding>,
}

/// Binds one kind of contract member
pub(crate) trait MemberBinder {
    /// Member descriptor kind
    type Member;

    /// Produce the generated member for `contract_member`
    fn bind(&self, ctx: &BindContext, contract_member: &Self::Member) -> AdaptResult<Bound<Self::Member>>;
}

/// Post-processing of forwarded results
#[derive(Clone)]
pub(crate) struct ReturnCheck {
    member: Arc<str>,
    expected: TypeHandle,
    enabled: bool,
}

impl ReturnCheck {
    pub(crate) fn new(member: &Arc<str>, expected: &TypeHandle, options: BindingOptions) -> Self {
        Self {
            member: member.clone(),
            expected: expected.clone(),
            enabled: options.check_return_types,
        }
    }

    /// Void members yield `Null`; others are checked against the declared type
    pub(crate) fn apply(&self, value: Value) -> AdaptResult<Value> {
        if self.expected.is_void() {
            return Ok(Value::Null);
        }
        if self.enabled {
            let actual = value.type_of();
            if !self.expected.is_assignable_from(&actual) {
                return Err(AdaptError::ReturnTypeMismatch {
                    member: self.member.to_string(),
                    expected: self.expected.name().to_string(),
                    actual: actual.name().to_string(),
                });
            }
        }
        Ok(value)
    }
}
