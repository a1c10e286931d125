//! Assignability between runtime types
//!
//! `target.is_assignable_from(source)` holds when a value whose runtime type is
//! `source` may be supplied where `target` is expected.

use rustc_hash::FxHashSet;

use crate::ty::{TypeHandle, TypeKind};

impl TypeHandle {
    /// Check whether a value of type `source` can be used where `self` is expected
    pub fn is_assignable_from(&self, source: &TypeHandle) -> bool {
        // Reflexivity: T <: T
        if self == source {
            return true;
        }

        // Nothing converts to or from void
        if self.is_void() || source.is_void() {
            return false;
        }

        // Everything, value types included, can be held as object
        if *self == TypeHandle::object() {
            return true;
        }

        // null fits any reference type
        if source.kind() == TypeKind::Null {
            return self.is_reference_type();
        }

        // Value types only match themselves or the interfaces they implement
        if self.is_value_type() {
            return false;
        }

        source.inherits_from(self)
    }

    /// Check whether `self` is a subtype of `target`
    pub fn is_assignable_to(&self, target: &TypeHandle) -> bool {
        target.is_assignable_from(self)
    }

    /// Strict subclass check along the parent chain
    pub fn is_subclass_of(&self, ancestor: &TypeHandle) -> bool {
        let mut current = self.parent();
        while let Some(ty) = current {
            if ty == ancestor {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    /// Check whether this type implements (or, for an interface, extends) `interface`
    pub fn implements(&self, interface: &TypeHandle) -> bool {
        interface.is_interface() && self != interface && self.inherits_from(interface)
    }

    /// Walk the parent chain and all interfaces reachable from `self`
    fn inherits_from(&self, target: &TypeHandle) -> bool {
        let mut visited = FxHashSet::default();
        let mut pending = vec![self.clone()];

        while let Some(ty) = pending.pop() {
            if &ty == target {
                return true;
            }
            if !visited.insert(ty.id()) {
                continue;
            }
            if let Some(parent) = ty.parent() {
                pending.push(parent.clone());
            }
            pending.extend(ty.interfaces().iter().cloned());
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::TypeBuilder;
    use crate::ty::TypeHandle;

    #[test]
    fn test_reflexive_and_object() {
        let i32_ty = TypeHandle::i32();
        assert!(i32_ty.is_assignable_from(&i32_ty));
        assert!(TypeHandle::object().is_assignable_from(&i32_ty));
        assert!(TypeHandle::object().is_assignable_from(&TypeHandle::string()));
        assert!(!TypeHandle::object().is_assignable_from(&TypeHandle::void()));
    }

    #[test]
    fn test_no_numeric_widening() {
        assert!(!TypeHandle::i64().is_assignable_from(&TypeHandle::i32()));
        assert!(!TypeHandle::f64().is_assignable_from(&TypeHandle::i32()));
    }

    #[test]
    fn test_null_only_into_references() {
        let null = TypeHandle::null();
        assert!(TypeHandle::string().is_assignable_from(&null));
        assert!(TypeHandle::object().is_assignable_from(&null));
        assert!(!TypeHandle::i32().is_assignable_from(&null));
    }

    #[test]
    fn test_class_chain_and_interfaces() {
        let readable = TypeBuilder::interface("Readable").build().unwrap();
        let seekable = TypeBuilder::interface("Seekable")
            .implements(&readable)
            .build()
            .unwrap();
        let base = TypeBuilder::class("Stream").implements(&seekable).build().unwrap();
        let file = TypeBuilder::class("FileStream").parent(&base).build().unwrap();

        assert!(base.is_assignable_from(&file));
        assert!(!file.is_assignable_from(&base));
        assert!(file.is_subclass_of(&base));
        assert!(file.is_subclass_of(&TypeHandle::object()));

        // Interfaces are reachable transitively through parents and extension
        assert!(readable.is_assignable_from(&file));
        assert!(seekable.is_assignable_from(&file));
        assert!(file.implements(&readable));
        assert!(seekable.implements(&readable));
        assert!(!readable.implements(&readable));
    }

    #[test]
    fn test_value_type_with_interface() {
        let comparable = TypeBuilder::interface("Comparable").build().unwrap();
        let point = TypeBuilder::value_type("Point")
            .implements(&comparable)
            .build()
            .unwrap();
        assert!(comparable.is_assignable_from(&point));
        assert!(!point.is_assignable_from(&comparable));
    }
}
