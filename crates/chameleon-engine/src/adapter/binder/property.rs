//! Property binding
//!
//! Getter and setter are bound independently: a read-only underlying property
//! can serve the getter directly while the setter binds dynamically.

use std::sync::Arc;

use chameleon_types::{AdaptResult, MemberKind, PropertyInfo};

use super::{BindContext, Bound, DirectTarget, MemberBinder, ReturnCheck, Strategy};
use crate::adapter::instance::AdapterState;
use crate::adapter::MemberBinding;
use crate::intercept::forward;
use crate::reflect::Reflector;

pub(crate) struct PropertyBinder;

impl PropertyBinder {
    fn candidate(ctx: &BindContext, name: &str) -> Option<Arc<PropertyInfo>> {
        ctx.underlying
            .properties()
            .into_iter()
            .find(|p| p.name() == name && p.is_public() && !p.modifiers().is_static && p.has_body())
    }

    fn find_getter(ctx: &BindContext, contract: &PropertyInfo) -> Option<Arc<PropertyInfo>> {
        Self::candidate(ctx, contract.name()).filter(|p| p.can_read())
    }

    /// The setter's single parameter is the property type
    fn find_setter(ctx: &BindContext, contract: &PropertyInfo) -> Option<Arc<PropertyInfo>> {
        Self::candidate(ctx, contract.name()).filter(|p| {
            p.can_write()
                && (p.ty() == contract.ty()
                    || (ctx.options.assignable_match && p.ty().is_assignable_from(contract.ty())))
        })
    }

    /// Most derived readable property shadowing the bound one
    fn find_getter_override(runtime: &Reflector, bound: &PropertyInfo) -> Option<Arc<PropertyInfo>> {
        runtime
            .properties()
            .into_iter()
            .find(|p| p.name() == bound.name() && p.is_public() && p.has_body() && p.can_read())
    }

    fn find_setter_override(runtime: &Reflector, bound: &PropertyInfo) -> Option<Arc<PropertyInfo>> {
        runtime.properties().into_iter().find(|p| {
            p.name() == bound.name() && p.is_public() && p.has_body() && p.can_write() && p.ty() == bound.ty()
        })
    }
}

impl MemberBinder for PropertyBinder {
    type Member = PropertyInfo;

    fn bind(&self, ctx: &BindContext, contract: &PropertyInfo) -> AdaptResult<Bound<PropertyInfo>> {
        let name: Arc<str> = Arc::from(contract.name());
        let mut generated = PropertyInfo::new(name.clone(), contract.ty().clone())
            .with_visibility(contract.visibility())
            .as_virtual();
        let mut bindings = Vec::new();

        if contract.can_read() {
            let accessor = format!("get_{}", name);
            let strategy = ctx.choose(&accessor, || Self::find_getter(ctx, contract));
            let mut binding = MemberBinding::new(MemberKind::Property, accessor, strategy.kind());
            let check = ReturnCheck::new(&name, contract.ty(), ctx.options);
            let name = name.clone();

            generated = match strategy {
                Strategy::Direct(target) => {
                    binding = binding.with_target(target.declaring_type(), target.name());
                    let direct = DirectTarget::new(ctx.underlying.reflected_type(), target);
                    generated.with_getter(move |receiver| {
                        let state = AdapterState::of(&name, receiver)?;
                        let property = direct.resolve(&state.instance, Self::find_getter_override);
                        check.apply(property.get(&state.instance)?)
                    })
                }
                Strategy::Dynamic => generated.with_getter(move |receiver| {
                    let state = AdapterState::of(&name, receiver)?;
                    check.apply(forward::get(&state.instance, &name)?)
                }),
                Strategy::Intercepted => {
                    let adapter = ctx.adapter_name.clone();
                    generated.with_getter(move |receiver| {
                        let state = AdapterState::of(&name, receiver)?;
                        check.apply(state.policy(&adapter)?.get(&state.instance, &name)?)
                    })
                }
            };
            bindings.push(binding);
        }

        if contract.can_write() {
            let accessor = format!("set_{}", name);
            let strategy = ctx.choose(&accessor, || Self::find_setter(ctx, contract));
            let mut binding = MemberBinding::new(MemberKind::Property, accessor, strategy.kind());
            let name = name.clone();

            generated = match strategy {
                Strategy::Direct(target) => {
                    binding = binding.with_target(target.declaring_type(), target.name());
                    let direct = DirectTarget::new(ctx.underlying.reflected_type(), target);
                    generated.with_setter(move |receiver, value| {
                        let state = AdapterState::of(&name, receiver)?;
                        direct
                            .resolve(&state.instance, Self::find_setter_override)
                            .set(&state.instance, value)
                    })
                }
                Strategy::Dynamic => generated.with_setter(move |receiver, value| {
                    let state = AdapterState::of(&name, receiver)?;
                    forward::set(&state.instance, &name, value)
                }),
                Strategy::Intercepted => {
                    let adapter = ctx.adapter_name.clone();
                    generated.with_setter(move |receiver, value| {
                        let state = AdapterState::of(&name, receiver)?;
                        state.policy(&adapter)?.set(&state.instance, &name, value)
                    })
                }
            };
            bindings.push(binding);
        }

        Ok(Bound {
            member: generated,
            bindings,
        })
    }
}
