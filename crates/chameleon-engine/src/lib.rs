//! Chameleon Adapter Engine
//!
//! Presents an object whose type is only known at run time as an implementation
//! of a known contract (an interface or an extensible class):
//! - **Reflection**: signature matching and member lookup (`reflect` module)
//! - **Interception**: pluggable policies that see every forwarded access (`intercept` module)
//! - **Adapters**: type synthesis, member binding, caching and the factory (`adapter` module)
//! - **Configuration**: binding options loaded from TOML (`config` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use chameleon_engine::AdapterFactory;
//!
//! let factory = AdapterFactory::new(&readable)?;
//! let stream = factory.create_adapter(vendor_stream)?;
//! let length = stream.get("Length")?;
//! stream.invoke("Read", &[buffer.into(), 0.into(), length])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Adapter synthesis, binding, caching and instantiation
pub mod adapter;

/// Binding options and TOML configuration
pub mod config;

/// Interception policies and reflective forwarding
pub mod intercept;

/// Signature matching and member lookup
pub mod reflect;

// ============================================================================
// Re-exports
// ============================================================================

pub use adapter::{
    is_adapter, try_unwrap_adapter, unwrap_adapter_deep, validate_contract, Adapter,
    AdapterFactory, AdapterKey, AdapterModule, AdapterType, BindingKind, MemberBinding,
    ModuleReport, TypeReport,
};
pub use config::{AdapterConfig, BindingOptions};
pub use intercept::{DefaultInterceptor, Interceptor, TracingInterceptor};
pub use reflect::{Reflector, SignatureMatcher};

pub use chameleon_types as types;
