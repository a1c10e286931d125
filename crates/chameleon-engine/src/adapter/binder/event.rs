//! Event binding
//!
//! Events never bind directly: add and remove always go through a policy,
//! the attached one for intercepted types and the reflective default
//! otherwise.

use std::sync::Arc;

use chameleon_types::{AdaptResult, EventInfo, MemberKind};
use tracing::trace;

use super::{BindContext, Bound, MemberBinder};
use crate::adapter::instance::AdapterState;
use crate::adapter::{BindingKind, MemberBinding};

pub(crate) struct EventBinder;

impl MemberBinder for EventBinder {
    type Member = EventInfo;

    fn bind(&self, ctx: &BindContext, contract: &EventInfo) -> AdaptResult<Bound<EventInfo>> {
        let name: Arc<str> = Arc::from(contract.name());
        let kind = if ctx.intercepted {
            BindingKind::Intercepted
        } else {
            BindingKind::DefaultPolicy
        };
        trace!(adapter = %ctx.adapter_name, member = %name, binding = %kind, "event bound");

        let intercepted = ctx.intercepted;
        let (add_name, add_adapter) = (name.clone(), ctx.adapter_name.clone());
        let (remove_name, remove_adapter) = (name.clone(), ctx.adapter_name.clone());

        let generated = EventInfo::new(name.clone(), contract.handler_type().clone())
            .with_visibility(contract.visibility())
            .as_virtual()
            .with_accessors(
                move |receiver, handler| {
                    let state = AdapterState::of(&add_name, receiver)?;
                    state
                        .policy_or_default(&add_adapter, intercepted)?
                        .hook(&state.instance, &add_name, handler)
                },
                move |receiver, handler| {
                    let state = AdapterState::of(&remove_name, receiver)?;
                    state
                        .policy_or_default(&remove_adapter, intercepted)?
                        .unhook(&state.instance, &remove_name, handler)
                },
            );

        Ok(Bound {
            member: generated,
            bindings: vec![
                MemberBinding::new(MemberKind::Event, format!("add_{}", name), kind),
                MemberBinding::new(MemberKind::Event, format!("remove_{}", name), kind),
            ],
        })
    }
}
