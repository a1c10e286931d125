//! Adapter Type Synthesis
//!
//! An adapter type is a real type: a sealed class deriving from a class
//! contract (or implementing an interface contract) whose members forward to
//! an underlying instance held by each adapter object. Each member body is a
//! closure that captures its binding strategy, so a generated type is a
//! dispatch table built once per
//! (contract, underlying type, interception flag, options) key.
//!
//! ## Binding strategies
//!
//! | Strategy        | Chosen when                                        | Per-call cost        |
//! |-----------------|----------------------------------------------------|----------------------|
//! | `Direct`        | a compatible public member exists at synthesis     | one call             |
//! | `Dynamic`       | no compatible member was found                     | lookup + call        |
//! | `Intercepted`   | the factory has an interception policy             | policy call          |
//! | `DefaultPolicy` | events of a non-intercepted adapter                | reflective forward   |

pub(crate) mod binder;
mod factory;
mod instance;
mod module;
mod report;
mod synthesizer;

pub use factory::AdapterFactory;
pub use instance::{is_adapter, try_unwrap_adapter, unwrap_adapter_deep, Adapter};
pub use module::AdapterModule;
pub use report::{ModuleReport, TypeReport};
pub use synthesizer::validate_contract;

use std::fmt;
use std::sync::Arc;

use chameleon_types::{
    AdaptError, AdaptResult, EventInfo, IndexerInfo, MemberKind, MethodInfo, PropertyInfo,
    TypeHandle, Value,
};
use serde::{Deserialize, Serialize};

use crate::config::BindingOptions;
use crate::reflect::{Reflector, SignatureMatcher};

/// Cache key of a generated adapter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdapterKey {
    /// Contract type id
    pub contract: u64,
    /// Underlying runtime type id
    pub underlying: u64,
    /// Whether members route through an interception policy
    pub intercepted: bool,
    /// Binding options in effect
    pub options: BindingOptions,
}

/// How a generated member reaches the underlying instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    /// Calls a member resolved at synthesis time
    Direct,
    /// Resolves by name and declared signature on every call
    Dynamic,
    /// Calls the interception policy
    Intercepted,
    /// Calls the reflective default policy
    DefaultPolicy,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Direct => write!(f, "direct"),
            BindingKind::Dynamic => write!(f, "dynamic"),
            BindingKind::Intercepted => write!(f, "intercepted"),
            BindingKind::DefaultPolicy => write!(f, "default-policy"),
        }
    }
}

/// Binding decision for one generated member or accessor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBinding {
    /// Kind of contract member
    pub kind: MemberKind,
    /// Member name, accessors as `get_Length`, `set_Item`, `add_Changed`
    pub member: String,
    /// Chosen strategy
    pub binding: BindingKind,
    /// `Type.Member` of the direct target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl MemberBinding {
    pub(crate) fn new(kind: MemberKind, member: impl Into<String>, binding: BindingKind) -> Self {
        Self {
            kind,
            member: member.into(),
            binding,
            target: None,
        }
    }

    pub(crate) fn with_target(mut self, declaring_type: &str, name: &str) -> Self {
        self.target = Some(format!("{}.{}", declaring_type, name));
        self
    }
}

/// Generated adapter type plus its dispatch table
pub struct AdapterType {
    pub(crate) descriptor: TypeHandle,
    pub(crate) contract: TypeHandle,
    pub(crate) underlying: TypeHandle,
    pub(crate) intercepted: bool,
    pub(crate) options: BindingOptions,
    pub(crate) methods: Vec<Arc<MethodInfo>>,
    pub(crate) properties: Vec<Arc<PropertyInfo>>,
    pub(crate) indexers: Vec<Arc<IndexerInfo>>,
    pub(crate) events: Vec<Arc<EventInfo>>,
    pub(crate) bindings: Vec<MemberBinding>,
    pub(crate) serial: u64,
}

impl AdapterType {
    /// The generated type
    pub fn descriptor(&self) -> &TypeHandle {
        &self.descriptor
    }

    /// Generated type name, `<module>_<Underlying>Adapter` or `<module>_<Underlying>Proxy`
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Contract the type satisfies
    pub fn contract(&self) -> &TypeHandle {
        &self.contract
    }

    /// Underlying runtime type the members were bound against
    pub fn underlying(&self) -> &TypeHandle {
        &self.underlying
    }

    /// Whether members route through an interception policy
    pub fn is_intercepted(&self) -> bool {
        self.intercepted
    }

    /// Binding options the type was generated with
    pub fn options(&self) -> BindingOptions {
        self.options
    }

    /// Binding decision per generated member, in binding order
    pub fn bindings(&self) -> &[MemberBinding] {
        &self.bindings
    }

    /// Binding decision for a member or accessor name
    pub fn binding(&self, member: &str) -> Option<&MemberBinding> {
        self.bindings.iter().find(|b| b.member == member)
    }

    /// Position of this type in its module's generation order, starting at 1
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Construct an adapter object around `instance` through the generated
    /// constructor
    pub fn instantiate(&self, instance: Value) -> AdaptResult<Value> {
        if instance.is_null() {
            return Err(AdaptError::NullInstance);
        }
        let arg_types = [instance.type_of()];
        let constructor = Reflector::new(&self.descriptor)
            .get_constructor(&arg_types)
            .ok_or_else(|| AdaptError::missing(MemberKind::Constructor, self.name(), &self.descriptor))?;
        constructor.construct(&[instance])
    }

    // ===== Dispatch table =====

    pub(crate) fn find_method(&self, name: &str, arg_types: &[TypeHandle]) -> Option<Arc<MethodInfo>> {
        let matches: Vec<_> = self.methods.iter().filter(|m| m.name() == name).cloned().collect();
        if matches.len() == 1 && arg_types.is_empty() {
            return matches.into_iter().next();
        }
        SignatureMatcher::best_match(&matches, arg_types, |m| m.params(), true).cloned()
    }

    pub(crate) fn find_property(&self, name: &str) -> Option<Arc<PropertyInfo>> {
        self.properties.iter().find(|p| p.name() == name).cloned()
    }

    pub(crate) fn find_indexer(&self, arg_types: &[TypeHandle]) -> Option<Arc<IndexerInfo>> {
        SignatureMatcher::best_match(&self.indexers, arg_types, |i| i.params(), true).cloned()
    }

    pub(crate) fn find_event(&self, name: &str) -> Option<Arc<EventInfo>> {
        self.events.iter().find(|e| e.name() == name).cloned()
    }
}

impl fmt::Debug for AdapterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterType")
            .field("descriptor", &self.descriptor)
            .field("contract", &self.contract)
            .field("underlying", &self.underlying)
            .field("intercepted", &self.intercepted)
            .field("bindings", &self.bindings.len())
            .field("serial", &self.serial)
            .finish()
    }
}
