//! Adapter type synthesis
//!
//! Builds one generated type: a sealed class named after the underlying type,
//! a constructor taking the underlying value, and one forwarding member per
//! applicable contract member, bound in the order methods, properties,
//! indexers, events.

use std::sync::Arc;

use chameleon_types::{
    AdaptError, AdaptResult, ConstructorInfo, EventInfo, IndexerInfo, MethodInfo, Modifiers,
    PropertyInfo, TypeBuilder, TypeHandle, TypeKind, Value, Visibility,
};
use tracing::debug;

use super::binder::{
    BindContext, Bound, EventBinder, IndexerBinder, MemberBinder, MethodBinder, PropertyBinder,
};
use super::instance::AdapterState;
use super::AdapterType;
use crate::config::BindingOptions;
use crate::reflect::Reflector;

/// Check that `contract` can be adapted to
///
/// Value types, sealed classes and the null/void pseudo-types are rejected.
pub fn validate_contract(contract: &TypeHandle) -> AdaptResult<()> {
    let reason = match contract.kind() {
        TypeKind::Value => Some("it is a value type"),
        TypeKind::Class if contract.is_sealed() => Some("the class is sealed"),
        TypeKind::Null | TypeKind::Void => Some("it has no members"),
        _ => None,
    };
    match reason {
        Some(reason) => Err(AdaptError::InvalidContract(format!(
            "an adapter for type [{}, {}] cannot be created because {}",
            contract.name(),
            contract.module(),
            reason
        ))),
        None => Ok(()),
    }
}

/// Suffix of generated type names
pub(crate) fn type_suffix(intercepted: bool) -> &'static str {
    if intercepted {
        "Proxy"
    } else {
        "Adapter"
    }
}

/// Generated type name, `<module>_<Underlying><suffix>` with dots in the
/// module replaced so same-named types from different modules stay distinct
pub(crate) fn adapter_type_name(underlying: &TypeHandle, intercepted: bool) -> String {
    format!(
        "{}_{}{}",
        underlying.module().replace('.', "_"),
        underlying.name(),
        type_suffix(intercepted)
    )
}

/// Class contracts forward only members a derived type may replace
fn forwarded(contract: &TypeHandle, visibility: Visibility, modifiers: Modifiers) -> bool {
    if modifiers.is_static {
        return false;
    }
    if contract.is_interface() {
        return !modifiers.is_special_name;
    }
    visibility != Visibility::Private && modifiers.is_overridable()
}

/// Contract members to generate, flattened over the contract's hierarchy
struct ContractMembers {
    methods: Vec<Arc<MethodInfo>>,
    properties: Vec<Arc<PropertyInfo>>,
    indexers: Vec<Arc<IndexerInfo>>,
    events: Vec<Arc<EventInfo>>,
}

impl ContractMembers {
    fn collect(contract: &TypeHandle) -> Self {
        let reflector = Reflector::new(contract);
        Self {
            methods: reflector
                .methods()
                .into_iter()
                .filter(|m| forwarded(contract, m.visibility(), m.modifiers()))
                .collect(),
            properties: reflector
                .properties()
                .into_iter()
                .filter(|p| forwarded(contract, p.visibility(), p.modifiers()))
                .collect(),
            indexers: reflector
                .indexers()
                .into_iter()
                .filter(|i| forwarded(contract, i.visibility(), i.modifiers()))
                .collect(),
            events: reflector
                .events()
                .into_iter()
                .filter(|e| forwarded(contract, e.visibility(), e.modifiers()))
                .collect(),
        }
    }
}

/// Inputs of one synthesis
pub(crate) struct Synthesizer<'a> {
    pub(crate) contract: &'a TypeHandle,
    pub(crate) underlying: &'a TypeHandle,
    pub(crate) intercepted: bool,
    pub(crate) options: BindingOptions,
    pub(crate) module_name: &'a str,
}

impl Synthesizer<'_> {
    /// Build the adapter type; `serial` is assigned by the owning module
    pub(crate) fn synthesize(&self) -> AdaptResult<AdapterType> {
        validate_contract(self.contract)?;
        if matches!(self.underlying.kind(), TypeKind::Null | TypeKind::Void) {
            return Err(AdaptError::InvalidType(format!(
                "{} can not be adapted",
                self.underlying.name()
            )));
        }

        let name = adapter_type_name(self.underlying, self.intercepted);
        let builder = TypeBuilder::class(&name).in_module(self.module_name).sealed();
        let builder = if self.contract.is_class() {
            builder.parent(self.contract)
        } else {
            builder.implements(self.contract)
        };
        let descriptor = builder.build()?;
        self.define_constructor(&descriptor)?;

        let ctx = BindContext {
            adapter_name: Arc::from(name.as_str()),
            underlying: Reflector::new(self.underlying),
            intercepted: self.intercepted,
            options: self.options,
        };
        let members = ContractMembers::collect(self.contract);
        let mut bindings = Vec::new();

        let mut methods = Vec::with_capacity(members.methods.len());
        for contract_method in &members.methods {
            let Bound { member, bindings: b } = MethodBinder.bind(&ctx, contract_method)?;
            methods.push(descriptor.define_method(member)?);
            bindings.extend(b);
        }

        let mut properties = Vec::with_capacity(members.properties.len());
        for contract_property in &members.properties {
            let Bound { member, bindings: b } = PropertyBinder.bind(&ctx, contract_property)?;
            properties.push(descriptor.define_property(member)?);
            bindings.extend(b);
        }

        let mut indexers = Vec::with_capacity(members.indexers.len());
        for contract_indexer in &members.indexers {
            let Bound { member, bindings: b } = IndexerBinder.bind(&ctx, contract_indexer)?;
            indexers.push(descriptor.define_indexer(member)?);
            bindings.extend(b);
        }

        let mut events = Vec::with_capacity(members.events.len());
        for contract_event in &members.events {
            let Bound { member, bindings: b } = EventBinder.bind(&ctx, contract_event)?;
            events.push(descriptor.define_event(member)?);
            bindings.extend(b);
        }

        debug!(
            adapter = %descriptor.full_name(),
            contract = %self.contract.full_name(),
            underlying = %self.underlying.full_name(),
            intercepted = self.intercepted,
            members = bindings.len(),
            "adapter type synthesized"
        );

        Ok(AdapterType {
            descriptor,
            contract: self.contract.clone(),
            underlying: self.underlying.clone(),
            intercepted: self.intercepted,
            options: self.options,
            methods,
            properties,
            indexers,
            events,
            bindings,
            serial: 0,
        })
    }

    /// The constructor refers to its own type weakly so the type can be dropped
    fn define_constructor(&self, descriptor: &TypeHandle) -> AdaptResult<()> {
        let own_type = descriptor.downgrade();
        let name = descriptor.name().to_string();
        descriptor.define_constructor(ConstructorInfo::new(
            vec![self.underlying.clone()],
            move |args| {
                let ty = own_type
                    .upgrade()
                    .ok_or_else(|| AdaptError::Invocation(format!("adapter type {} was dropped", name)))?;
                let instance = args.first().cloned().unwrap_or_default();
                if instance.is_null() {
                    return Err(AdaptError::NullInstance);
                }
                Ok(Value::object(&ty, AdapterState::new(instance)))
            },
        ))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::BindingKind;

    fn synthesize(contract: &TypeHandle, underlying: &TypeHandle, intercepted: bool) -> AdaptResult<AdapterType> {
        Synthesizer {
            contract,
            underlying,
            intercepted,
            options: BindingOptions::default(),
            module_name: "adapters.test",
        }
        .synthesize()
    }

    #[test]
    fn test_rejects_value_and_sealed_contracts() {
        let point = TypeBuilder::value_type("Point").build().unwrap();
        let err = validate_contract(&point).unwrap_err();
        assert!(err.to_string().contains("value type"));

        let sealed = TypeBuilder::class("Final").sealed().build().unwrap();
        let err = validate_contract(&sealed).unwrap_err();
        assert!(err.to_string().contains("sealed"));

        assert!(validate_contract(&TypeHandle::void()).is_err());
    }

    #[test]
    fn test_generated_type_shape() {
        let contract = TypeBuilder::interface("Pinger")
            .method(MethodInfo::new("Ping", vec![], TypeHandle::void()))
            .method(MethodInfo::new("get_Raw", vec![], TypeHandle::i32()).as_special_name())
            .build()
            .unwrap();
        let underlying = TypeBuilder::class("Host").in_module("net").build().unwrap();

        let adapter = synthesize(&contract, &underlying, false).unwrap();
        assert_eq!(adapter.name(), "net_HostAdapter");
        assert_eq!(adapter.descriptor().module(), "adapters.test");
        assert!(adapter.descriptor().is_sealed());
        assert!(contract.is_assignable_from(adapter.descriptor()));
        assert_eq!(adapter.descriptor().declared_constructors().len(), 1);

        // Special-name methods are skipped
        assert_eq!(adapter.bindings().len(), 1);
        assert_eq!(adapter.bindings()[0].binding, BindingKind::Dynamic);

        let proxy = synthesize(&contract, &underlying, true).unwrap();
        assert_eq!(proxy.name(), "net_HostProxy");
        assert_eq!(proxy.bindings()[0].binding, BindingKind::Intercepted);
    }

    #[test]
    fn test_class_contract_forwards_only_overridable() {
        let contract = TypeBuilder::class("Job")
            .abstract_class()
            .method(MethodInfo::new("Step", vec![], TypeHandle::i32()).as_abstract())
            .method(MethodInfo::new("Name", vec![], TypeHandle::string()).as_virtual().with_body(|_, _| Ok(Value::from("job"))))
            .method(MethodInfo::new("Run", vec![], TypeHandle::i32()).with_body(|_, _| Ok(Value::I32(0))))
            .method(
                MethodInfo::new("Secret", vec![], TypeHandle::i32())
                    .as_virtual()
                    .with_visibility(Visibility::Private)
                    .with_body(|_, _| Ok(Value::I32(0))),
            )
            .build()
            .unwrap();
        let underlying = TypeBuilder::class("Worker").build().unwrap();

        let adapter = synthesize(&contract, &underlying, false).unwrap();
        let names: Vec<_> = adapter.bindings().iter().map(|b| b.member.as_str()).collect();
        assert_eq!(names, vec!["Step", "Name"]);
        assert!(adapter.descriptor().is_subclass_of(&contract));
    }

    #[test]
    fn test_rejects_null_underlying() {
        let contract = TypeBuilder::interface("Empty").build().unwrap();
        assert!(matches!(
            synthesize(&contract, &TypeHandle::null(), false),
            Err(AdaptError::InvalidType(_))
        ));
    }

    #[test]
    fn test_names_include_underlying_module() {
        let contract = TypeBuilder::interface("Named").build().unwrap();
        let a = TypeBuilder::class("Thing").in_module("a").build().unwrap();
        let b = TypeBuilder::class("Thing").in_module("vendor.b").build().unwrap();

        let first = synthesize(&contract, &a, false).unwrap();
        let second = synthesize(&contract, &b, false).unwrap();
        assert_eq!(first.name(), "a_ThingAdapter");
        assert_eq!(second.name(), "vendor_b_ThingAdapter");
    }
}
