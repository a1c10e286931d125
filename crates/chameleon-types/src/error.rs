//! Adapter errors

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ty::TypeHandle;

/// Kind of member an error or binding refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    /// A method
    Method,
    /// A plain property
    Property,
    /// An indexed property
    Indexer,
    /// An event
    Event,
    /// A field
    Field,
    /// A constructor
    Constructor,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Method => write!(f, "method"),
            MemberKind::Property => write!(f, "property"),
            MemberKind::Indexer => write!(f, "indexer"),
            MemberKind::Event => write!(f, "event"),
            MemberKind::Field => write!(f, "field"),
            MemberKind::Constructor => write!(f, "constructor"),
        }
    }
}

/// Errors raised while describing types, synthesizing adapters, or forwarding calls
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdaptError {
    /// The contract type cannot be adapted to
    #[error("Invalid contract: {0}")]
    InvalidContract(String),

    /// A type definition is malformed
    #[error("Invalid type definition: {0}")]
    InvalidType(String),

    /// An adapter was requested for an absent instance
    #[error("Cannot create an adapter for a null instance")]
    NullInstance,

    /// No member with the requested name and signature exists on the runtime type
    #[error("member not found: {member} ({kind}) for type [{type_name}, {module}]")]
    MissingMember {
        /// Kind of member that was looked up
        kind: MemberKind,
        /// Member name
        member: String,
        /// Name of the type that was searched
        type_name: String,
        /// Module the searched type originates from
        module: String,
    },

    /// Arguments do not fit the member's parameter list
    #[error("Argument mismatch calling {member}: {message}")]
    ArgumentMismatch {
        /// Member being called
        member: String,
        /// What went wrong
        message: String,
    },

    /// A forwarded call returned a value the contract does not allow
    #[error("{member} returned {actual}, expected {expected}")]
    ReturnTypeMismatch {
        /// Member being called
        member: String,
        /// Declared return type
        expected: String,
        /// Runtime type of the returned value
        actual: String,
    },

    /// A member without a body was invoked
    #[error("{kind} {member} on type {type_name} is abstract")]
    AbstractMember {
        /// Kind of member
        kind: MemberKind,
        /// Member name
        member: String,
        /// Declaring type
        type_name: String,
    },

    /// A property or indexer has no getter
    #[error("{member} on type {type_name} is not readable")]
    NotReadable {
        /// Property name
        member: String,
        /// Declaring type
        type_name: String,
    },

    /// A property or indexer has no setter
    #[error("{member} on type {type_name} is not writable")]
    NotWritable {
        /// Property name
        member: String,
        /// Declaring type
        type_name: String,
    },

    /// A member body received a receiver of the wrong concrete type
    #[error("Receiver for {member} is not a {expected}")]
    ReceiverMismatch {
        /// Member being called
        member: String,
        /// Expected payload type
        expected: String,
    },

    /// A value could not be converted to the requested Rust type
    #[error("Cannot convert {actual} to {expected}")]
    Conversion {
        /// Requested type
        expected: String,
        /// Runtime type of the value
        actual: String,
    },

    /// A type with this name already exists in the module
    #[error("Type {name} is already defined in module {module}")]
    DuplicateType {
        /// Type name
        name: String,
        /// Module name
        module: String,
    },

    /// A member with the same name and signature already exists on the type
    #[error("{kind} {member} is already defined on type {type_name}")]
    DuplicateMember {
        /// Kind of member
        kind: MemberKind,
        /// Member name
        member: String,
        /// Declaring type
        type_name: String,
    },

    /// An intercepted adapter was used before its policy was attached
    #[error("Adapter type {type_name} has no interception policy attached")]
    InterceptorMissing {
        /// Generated adapter type name
        type_name: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O failure while exporting diagnostics
    #[error("I/O error: {0}")]
    Io(String),

    /// Failure raised by a member body
    #[error("{0}")]
    Invocation(String),
}

impl AdaptError {
    /// Build a missing-member error naming the searched type and its module
    pub fn missing(kind: MemberKind, member: impl Into<String>, ty: &TypeHandle) -> Self {
        AdaptError::MissingMember {
            kind,
            member: member.into(),
            type_name: ty.name().to_string(),
            module: ty.module().to_string(),
        }
    }

    /// Check whether this is a missing-member failure
    pub fn is_missing_member(&self) -> bool {
        matches!(self, AdaptError::MissingMember { .. })
    }
}

impl From<std::io::Error> for AdaptError {
    fn from(err: std::io::Error) -> Self {
        AdaptError::Io(err.to_string())
    }
}

/// Result alias used across the adapter crates
pub type AdaptResult<T> = Result<T, AdaptError>;
