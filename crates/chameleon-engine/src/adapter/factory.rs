//! Adapter factory
//!
//! Public entry point: validates a contract once, then resolves or generates
//! adapter types per underlying runtime type and instantiates them.
//!
//! ## Interception policy
//!
//! The policy should be set before the first adapter is created. Replacing it
//! later is allowed but only affects adapters created afterwards; adapters
//! already handed out keep the policy they were wired with, and switching
//! between "no policy" and "some policy" selects a different generated type.
//! A warning is logged when a policy is replaced on a module that already
//! holds generated types.

use std::path::Path;
use std::sync::Arc;

use chameleon_types::{AdaptError, AdaptResult, TypeHandle, TypeRegistry, Value};
use parking_lot::RwLock;
use tracing::warn;

use super::instance::{Adapter, AdapterState};
use super::module::AdapterModule;
use super::synthesizer::validate_contract;
use super::AdapterType;
use crate::config::{AdapterConfig, BindingOptions};
use crate::intercept::Interceptor;

/// Creates adapters that present arbitrary instances as one contract
pub struct AdapterFactory {
    contract: TypeHandle,
    module: Arc<AdapterModule>,
    options: BindingOptions,
    interceptor: RwLock<Option<Arc<dyn Interceptor>>>,
}

impl AdapterFactory {
    /// Create a factory for `contract` with default options
    pub fn new(contract: &TypeHandle) -> AdaptResult<Self> {
        Self::with_options(contract, BindingOptions::default())
    }

    /// Create a factory for `contract` with explicit options
    pub fn with_options(contract: &TypeHandle, options: BindingOptions) -> AdaptResult<Self> {
        validate_contract(contract)?;
        Ok(Self {
            contract: contract.clone(),
            module: AdapterModule::for_contract(contract),
            options,
            interceptor: RwLock::new(None),
        })
    }

    /// Create a factory using the options of a loaded configuration
    pub fn from_config(contract: &TypeHandle, config: &AdapterConfig) -> AdaptResult<Self> {
        Self::with_options(contract, config.binding)
    }

    /// Create a factory for the contract registered as `name`
    pub fn from_registry(registry: &TypeRegistry, name: &str) -> AdaptResult<Self> {
        let contract = registry.get(name).ok_or_else(|| {
            AdaptError::InvalidContract(format!(
                "type {} not found in module {}",
                name,
                registry.module_name()
            ))
        })?;
        Self::new(&contract)
    }

    /// Attach a policy, returning the factory
    pub fn with_interceptor(self, policy: Arc<dyn Interceptor>) -> Self {
        self.set_interceptor(Some(policy));
        self
    }

    /// Replace or clear the interception policy
    pub fn set_interceptor(&self, policy: Option<Arc<dyn Interceptor>>) {
        let mut slot = self.interceptor.write();
        if self.module.generated_count() > 0 && (slot.is_some() || policy.is_some()) {
            warn!(
                module = %self.module.name(),
                generated = self.module.generated_count(),
                "interception policy replaced after adapter types were generated"
            );
        }
        *slot = policy;
    }

    /// Current interception policy
    pub fn interceptor(&self) -> Option<Arc<dyn Interceptor>> {
        self.interceptor.read().clone()
    }

    /// Contract served by this factory
    pub fn contract(&self) -> &TypeHandle {
        &self.contract
    }

    /// Binding options
    pub fn options(&self) -> BindingOptions {
        self.options
    }

    /// Module holding the generated types
    pub fn module(&self) -> &Arc<AdapterModule> {
        &self.module
    }

    /// Adapter type for the runtime type of `instance`
    pub fn adapter_type_for(&self, instance: &Value) -> AdaptResult<Arc<AdapterType>> {
        if instance.is_null() {
            return Err(AdaptError::NullInstance);
        }
        self.adapter_type_for_type(&instance.type_of())
    }

    /// Adapter type for an underlying type, generated ahead of any instance
    pub fn adapter_type_for_type(&self, underlying: &TypeHandle) -> AdaptResult<Arc<AdapterType>> {
        let intercepted = self.interceptor.read().is_some();
        self.module.get_or_synthesize(underlying, intercepted, self.options)
    }

    /// Wrap `instance` in an adapter satisfying the contract
    pub fn create_adapter(&self, instance: Value) -> AdaptResult<Adapter> {
        if instance.is_null() {
            return Err(AdaptError::NullInstance);
        }
        // One snapshot decides both the generated type and the wiring.
        let policy = self.interceptor();
        let adapter_type = self
            .module
            .get_or_synthesize(&instance.type_of(), policy.is_some(), self.options)?;

        let value = adapter_type.instantiate(instance)?;
        if let Some(policy) = policy {
            AdapterState::of(adapter_type.name(), &value)?.attach(adapter_type.name(), policy)?;
        }
        Ok(Adapter::new(value, adapter_type))
    }

    /// Export the module's generated types and bindings as JSON
    pub fn save_report(&self, path: &Path) -> AdaptResult<()> {
        self.module.report().save(path)
    }
}

impl std::fmt::Debug for AdapterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterFactory")
            .field("contract", &self.contract)
            .field("options", &self.options)
            .field("intercepted", &self.interceptor.read().is_some())
            .finish()
    }
}
