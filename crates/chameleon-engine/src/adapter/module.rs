//! Adapter modules
//!
//! One module per contract owns every adapter type generated for it. Modules
//! live in a process-wide registry and are never torn down.
//!
//! ## Thread Safety
//!
//! Each cache slot is a `OnceCell` obtained atomically through the map's entry
//! API. Synthesis for one key runs at most once; concurrent first requests for
//! that key block on the cell, requests for other keys proceed independently.
//! A failed synthesis leaves the cell empty so a later request retries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chameleon_types::{AdaptResult, TypeHandle};
use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use super::report::{ModuleReport, TypeReport};
use super::synthesizer::Synthesizer;
use super::{AdapterKey, AdapterType};
use crate::config::BindingOptions;

/// Prefix of generated module names
pub const MODULE_PREFIX: &str = "adapters";

type Slot = Arc<OnceCell<Arc<AdapterType>>>;

static MODULES: Lazy<DashMap<u64, Arc<AdapterModule>>> = Lazy::new(DashMap::new);

/// Generated types for one contract
pub struct AdapterModule {
    name: String,
    contract: TypeHandle,
    types: DashMap<AdapterKey, Slot>,
    generated: AtomicU64,
}

impl AdapterModule {
    /// The module for `contract`, created on first request
    pub(crate) fn for_contract(contract: &TypeHandle) -> Arc<AdapterModule> {
        MODULES
            .entry(contract.id())
            .or_insert_with(|| {
                let module = AdapterModule {
                    name: format!("{}.{}", MODULE_PREFIX, contract.full_name()),
                    contract: contract.clone(),
                    types: DashMap::new(),
                    generated: AtomicU64::new(0),
                };
                debug!(module = %module.name, "adapter module created");
                Arc::new(module)
            })
            .clone()
    }

    /// Module name, `adapters.<contract module>.<contract name>`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contract whose adapters this module holds
    pub fn contract(&self) -> &TypeHandle {
        &self.contract
    }

    /// Number of adapter types successfully generated
    pub fn generated_count(&self) -> u64 {
        self.generated.load(Ordering::Acquire)
    }

    /// Resolve the adapter type for a key, synthesizing it on first request
    pub(crate) fn get_or_synthesize(
        &self,
        underlying: &TypeHandle,
        intercepted: bool,
        options: BindingOptions,
    ) -> AdaptResult<Arc<AdapterType>> {
        let key = AdapterKey {
            contract: self.contract.id(),
            underlying: underlying.id(),
            intercepted,
            options,
        };
        // The map guard is released at the end of this statement.
        let slot: Slot = self.types.entry(key).or_default().clone();

        slot.get_or_try_init(|| -> AdaptResult<Arc<AdapterType>> {
            let mut adapter = Synthesizer {
                contract: &self.contract,
                underlying,
                intercepted,
                options,
                module_name: &self.name,
            }
            .synthesize()?;
            adapter.serial = self.generated.fetch_add(1, Ordering::AcqRel) + 1;
            Ok(Arc::new(adapter))
        })
        .cloned()
    }

    /// Generated types in generation order
    pub fn types(&self) -> Vec<Arc<AdapterType>> {
        let mut types: Vec<_> = self
            .types
            .iter()
            .filter_map(|entry| entry.value().get().cloned())
            .collect();
        types.sort_by_key(|t| t.serial);
        types
    }

    /// Serializable summary of every generated type and its bindings
    pub fn report(&self) -> ModuleReport {
        ModuleReport {
            module: self.name.clone(),
            contract: self.contract.full_name(),
            generated: self.generated_count(),
            types: self.types().iter().map(|t| TypeReport::from(t.as_ref())).collect(),
        }
    }
}

impl std::fmt::Debug for AdapterModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterModule")
            .field("name", &self.name)
            .field("generated", &self.generated_count())
            .finish()
    }
}
