//! Method binding

use std::sync::Arc;

use chameleon_types::{AdaptResult, MemberKind, MethodInfo};

use super::{BindContext, Bound, DirectTarget, MemberBinder, ReturnCheck, Strategy};
use crate::adapter::instance::AdapterState;
use crate::adapter::MemberBinding;
use crate::intercept::forward;
use crate::reflect::{Reflector, SignatureMatcher};

pub(crate) struct MethodBinder;

impl MethodBinder {
    /// Public instance methods with a body and the contract's name, exact
    /// signature first, then assignable
    fn find_direct(ctx: &BindContext, contract: &MethodInfo) -> Option<Arc<MethodInfo>> {
        let candidates: Vec<_> = ctx
            .underlying
            .methods_named(contract.name())
            .into_iter()
            .filter(|m| m.is_public() && !m.is_static() && m.has_body())
            .collect();
        SignatureMatcher::best_match(
            &candidates,
            contract.params(),
            |m| m.params(),
            ctx.options.assignable_match,
        )
        .cloned()
    }

    /// Most derived public instance method with the bound method's exact
    /// signature
    fn find_override(runtime: &Reflector, bound: &MethodInfo) -> Option<Arc<MethodInfo>> {
        runtime.methods_named(bound.name()).into_iter().find(|m| {
            m.is_public()
                && !m.is_static()
                && m.has_body()
                && SignatureMatcher::equals(m.params(), bound.params())
        })
    }
}

impl MemberBinder for MethodBinder {
    type Member = MethodInfo;

    fn bind(&self, ctx: &BindContext, contract: &MethodInfo) -> AdaptResult<Bound<MethodInfo>> {
        let name: Arc<str> = Arc::from(contract.name());
        let check = ReturnCheck::new(&name, contract.return_type(), ctx.options);
        let strategy = ctx.choose(&name, || Self::find_direct(ctx, contract));
        let mut binding = MemberBinding::new(MemberKind::Method, contract.name(), strategy.kind());

        let generated = MethodInfo::new(name.clone(), contract.params().to_vec(), contract.return_type().clone())
            .with_visibility(contract.visibility())
            .as_virtual();

        let generated = match strategy {
            Strategy::Direct(target) => {
                binding = binding.with_target(target.declaring_type(), target.name());
                let direct = DirectTarget::new(ctx.underlying.reflected_type(), target);
                generated.with_body(move |receiver, args| {
                    let state = AdapterState::of(&name, receiver)?;
                    let method = direct.resolve(&state.instance, Self::find_override);
                    check.apply(method.invoke(&state.instance, args)?)
                })
            }
            Strategy::Dynamic => {
                let params = contract.params().to_vec();
                generated.with_body(move |receiver, args| {
                    let state = AdapterState::of(&name, receiver)?;
                    check.apply(forward::invoke_with(&state.instance, &name, &params, args)?)
                })
            }
            Strategy::Intercepted => {
                let adapter = ctx.adapter_name.clone();
                generated.with_body(move |receiver, args| {
                    let state = AdapterState::of(&name, receiver)?;
                    check.apply(state.policy(&adapter)?.invoke(&state.instance, &name, args)?)
                })
            }
        };

        Ok(Bound {
            member: generated,
            bindings: vec![binding],
        })
    }
}
