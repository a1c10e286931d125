//! Indexer binding
//!
//! Index parameter types are taken from the contract; dynamic accessors
//! resolve the underlying indexer by those declared types on every call.

use std::sync::Arc;

use chameleon_types::{AdaptResult, IndexerInfo, MemberKind, INDEXER_NAME};

use super::{BindContext, Bound, DirectTarget, MemberBinder, ReturnCheck, Strategy};
use crate::adapter::instance::AdapterState;
use crate::adapter::MemberBinding;
use crate::intercept::forward;
use crate::reflect::{Reflector, SignatureMatcher};

pub(crate) struct IndexerBinder;

impl IndexerBinder {
    fn find<F>(ctx: &BindContext, contract: &IndexerInfo, usable: F) -> Option<Arc<IndexerInfo>>
    where
        F: Fn(&IndexerInfo) -> bool,
    {
        let candidates: Vec<_> = ctx
            .underlying
            .indexers()
            .into_iter()
            .filter(|i| i.is_public() && i.has_body() && usable(i))
            .collect();
        SignatureMatcher::best_match(
            &candidates,
            contract.params(),
            |i| i.params(),
            ctx.options.assignable_match,
        )
        .cloned()
    }

    /// Most derived indexer with the bound indexer's exact index types
    fn find_override<F>(runtime: &Reflector, bound: &IndexerInfo, usable: F) -> Option<Arc<IndexerInfo>>
    where
        F: Fn(&IndexerInfo) -> bool,
    {
        runtime.indexers().into_iter().find(|i| {
            i.is_public() && i.has_body() && usable(i) && SignatureMatcher::equals(i.params(), bound.params())
        })
    }
}

impl MemberBinder for IndexerBinder {
    type Member = IndexerInfo;

    fn bind(&self, ctx: &BindContext, contract: &IndexerInfo) -> AdaptResult<Bound<IndexerInfo>> {
        let name: Arc<str> = Arc::from(INDEXER_NAME);
        let params = contract.params().to_vec();
        let mut generated = IndexerInfo::new(params.clone(), contract.ty().clone())
            .with_visibility(contract.visibility())
            .as_virtual();
        let mut bindings = Vec::new();

        if contract.can_read() {
            let accessor = format!("get_{}", INDEXER_NAME);
            let strategy = ctx.choose(&accessor, || Self::find(ctx, contract, |i| i.can_read()));
            let mut binding = MemberBinding::new(MemberKind::Indexer, accessor, strategy.kind());
            let check = ReturnCheck::new(&name, contract.ty(), ctx.options);
            let name = name.clone();

            generated = match strategy {
                Strategy::Direct(target) => {
                    binding = binding.with_target(target.declaring_type(), INDEXER_NAME);
                    let direct = DirectTarget::new(ctx.underlying.reflected_type(), target);
                    generated.with_getter(move |receiver, index| {
                        let state = AdapterState::of(&name, receiver)?;
                        let indexer = direct.resolve(&state.instance, |runtime, bound| {
                            Self::find_override(runtime, bound, |i| i.can_read())
                        });
                        check.apply(indexer.get(&state.instance, index)?)
                    })
                }
                Strategy::Dynamic => {
                    let params = params.clone();
                    generated.with_getter(move |receiver, index| {
                        let state = AdapterState::of(&name, receiver)?;
                        check.apply(forward::get_indexed_with(&state.instance, &params, index)?)
                    })
                }
                Strategy::Intercepted => {
                    let adapter = ctx.adapter_name.clone();
                    generated.with_getter(move |receiver, index| {
                        let state = AdapterState::of(&name, receiver)?;
                        check.apply(state.policy(&adapter)?.get_indexed(&state.instance, index)?)
                    })
                }
            };
            bindings.push(binding);
        }

        if contract.can_write() {
            let accessor = format!("set_{}", INDEXER_NAME);
            let element = contract.ty().clone();
            let strategy = ctx.choose(&accessor, || {
                Self::find(ctx, contract, |i| {
                    i.can_write()
                        && (i.ty() == &element
                            || (ctx.options.assignable_match && i.ty().is_assignable_from(&element)))
                })
            });
            let mut binding = MemberBinding::new(MemberKind::Indexer, accessor, strategy.kind());

            generated = match strategy {
                Strategy::Direct(target) => {
                    binding = binding.with_target(target.declaring_type(), INDEXER_NAME);
                    let direct = DirectTarget::new(ctx.underlying.reflected_type(), target);
                    generated.with_setter(move |receiver, index, value| {
                        let state = AdapterState::of(&name, receiver)?;
                        let indexer = direct.resolve(&state.instance, |runtime, bound| {
                            Self::find_override(runtime, bound, |i| i.can_write() && i.ty() == bound.ty())
                        });
                        indexer.set(&state.instance, index, value)
                    })
                }
                Strategy::Dynamic => generated.with_setter(move |receiver, index, value| {
                    let state = AdapterState::of(&name, receiver)?;
                    forward::set_indexed_with(&state.instance, &params, index, value)
                }),
                Strategy::Intercepted => {
                    let adapter = ctx.adapter_name.clone();
                    generated.with_setter(move |receiver, index, value| {
                        let state = AdapterState::of(&name, receiver)?;
                        state.policy(&adapter)?.set_indexed(&state.instance, index, value)
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
