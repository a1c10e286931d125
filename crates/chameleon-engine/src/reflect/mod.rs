//! Reflection over runtime types
//!
//! [`SignatureMatcher`] ranks parameter lists; [`Reflector`] finds members on a
//! type using exact-then-assignable resolution.

pub mod reflector;
pub mod signature;

pub use reflector::Reflector;
pub use signature::SignatureMatcher;
