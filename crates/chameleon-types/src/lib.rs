//! Chameleon Type Model
//!
//! Runtime type descriptors, member metadata, the variant value carrier and
//! assignability rules that adapter synthesis reflects over.

#![warn(missing_docs)]

pub mod builder;
pub mod error;
pub mod handler;
pub mod member;
pub mod registry;
pub mod subtyping;
pub mod ty;
pub mod value;

pub use builder::{TypeBuilder, DEFAULT_MODULE};
pub use error::{AdaptError, AdaptResult, MemberKind};
pub use handler::{EventSource, Handler};
pub use member::{
    check_arguments, downcast_receiver, ConstructorInfo, EventInfo, FieldInfo, IndexerInfo,
    MethodInfo, Modifiers, PropertyInfo, Visibility, INDEXER_NAME,
};
pub use registry::TypeRegistry;
pub use ty::{TypeHandle, TypeKind, WeakTypeHandle, BUILTIN_MODULE};
pub use value::{Buffer, ObjectRef, Value};
