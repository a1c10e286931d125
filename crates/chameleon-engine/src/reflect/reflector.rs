//! Member lookup over a runtime type
//!
//! Lookups span public and non-public, instance and static members and
//! flatten the hierarchy: a member redeclared on a derived type shadows the
//! base declaration. Every `get_*` call counts as one reflective lookup on the
//! reflected type.

use std::sync::Arc;

use chameleon_types::{
    ConstructorInfo, EventInfo, FieldInfo, IndexerInfo, MethodInfo, PropertyInfo, TypeHandle,
};
use rustc_hash::FxHashSet;
use tracing::trace;

use super::signature::SignatureMatcher;

/// Reflective view of one type
#[derive(Debug, Clone)]
pub struct Reflector {
    ty: TypeHandle,
}

impl Reflector {
    /// Reflect over `ty`
    pub fn new(ty: &TypeHandle) -> Self {
        Self { ty: ty.clone() }
    }

    /// The reflected type
    pub fn reflected_type(&self) -> &TypeHandle {
        &self.ty
    }

    /// The type followed by its ancestors, most derived first
    ///
    /// Classes walk the parent chain; interfaces walk extended interfaces
    /// breadth-first.
    pub fn hierarchy(&self) -> Vec<TypeHandle> {
        if self.ty.is_interface() {
            let mut seen = FxHashSet::default();
            let mut order = vec![self.ty.clone()];
            seen.insert(self.ty.id());
            let mut i = 0;
            while i < order.len() {
                for base in order[i].interfaces().to_vec() {
                    if seen.insert(base.id()) {
                        order.push(base);
                    }
                }
                i += 1;
            }
            order
        } else {
            let mut order = vec![self.ty.clone()];
            let mut current = self.ty.parent().cloned();
            while let Some(ty) = current {
                current = ty.parent().cloned();
                order.push(ty);
            }
            order
        }
    }

    fn flatten<T, D, S>(&self, declared: D, same: S) -> Vec<Arc<T>>
    where
        D: Fn(&TypeHandle) -> Vec<Arc<T>>,
        S: Fn(&T, &T) -> bool,
    {
        let mut members: Vec<Arc<T>> = Vec::new();
        for ty in self.hierarchy() {
            for member in declared(&ty) {
                if !members.iter().any(|m| same(m, &member)) {
                    members.push(member);
                }
            }
        }
        members
    }

    // ===== Enumeration =====

    /// All methods, derived declarations shadowing base ones
    pub fn methods(&self) -> Vec<Arc<MethodInfo>> {
        self.flatten(TypeHandle::declared_methods, |a, b| {
            a.name() == b.name() && SignatureMatcher::equals(a.params(), b.params())
        })
    }

    /// All properties
    pub fn properties(&self) -> Vec<Arc<PropertyInfo>> {
        self.flatten(TypeHandle::declared_properties, |a, b| a.name() == b.name())
    }

    /// All indexers
    pub fn indexers(&self) -> Vec<Arc<IndexerInfo>> {
        self.flatten(TypeHandle::declared_indexers, |a, b| {
            SignatureMatcher::equals(a.params(), b.params())
        })
    }

    /// All fields
    pub fn fields(&self) -> Vec<Arc<FieldInfo>> {
        self.flatten(TypeHandle::declared_fields, |a, b| a.name() == b.name())
    }

    /// All events
    pub fn events(&self) -> Vec<Arc<EventInfo>> {
        self.flatten(TypeHandle::declared_events, |a, b| a.name() == b.name())
    }

    /// Methods named `name`, in hierarchy order
    pub fn methods_named(&self, name: &str) -> Vec<Arc<MethodInfo>> {
        self.methods().into_iter().filter(|m| m.name() == name).collect()
    }

    // ===== Lookup =====

    fn note(&self, kind: &str, name: &str) {
        self.ty.note_lookup();
        trace!(ty = %self.ty, kind, member = name, "reflective lookup");
    }

    /// Field by name
    pub fn get_field(&self, name: &str) -> Option<Arc<FieldInfo>> {
        self.note("field", name);
        self.fields().into_iter().find(|f| f.name() == name)
    }

    /// Property by name
    pub fn get_property(&self, name: &str) -> Option<Arc<PropertyInfo>> {
        self.note("property", name);
        self.properties().into_iter().find(|p| p.name() == name)
    }

    /// Constructor accepting `arg_types`: exact, else assignable
    ///
    /// Only the reflected type's own constructors are considered.
    pub fn get_constructor(&self, arg_types: &[TypeHandle]) -> Option<Arc<ConstructorInfo>> {
        self.note("constructor", "new");
        let constructors = self.ty.declared_constructors();
        SignatureMatcher::best_match(&constructors, arg_types, |c| c.params(), true).cloned()
    }

    /// Method by name and argument types
    ///
    /// When exactly one method carries the name and no argument types are
    /// given, that method is returned regardless of its parameters. Otherwise
    /// the first exact match wins, then the first assignable one.
    pub fn get_method(&self, name: &str, arg_types: &[TypeHandle]) -> Option<Arc<MethodInfo>> {
        self.note("method", name);
        let matches = self.methods_named(name);
        if matches.len() == 1 && arg_types.is_empty() {
            return matches.into_iter().next();
        }
        SignatureMatcher::best_match(&matches, arg_types, |m| m.params(), true).cloned()
    }

    /// Indexer accepting `arg_types`: exact, else assignable
    pub fn get_indexer(&self, arg_types: &[TypeHandle]) -> Option<Arc<IndexerInfo>> {
        self.note("indexer", chameleon_types::INDEXER_NAME);
        let indexers = self.indexers();
        SignatureMatcher::best_match(&indexers, arg_types, |i| i.params(), true).cloned()
    }

    /// Event by name
    pub fn get_event(&self, name: &str) -> Option<Arc<EventInfo>> {
        self.note("event", name);
        self.events().into_iter().find(|e| e.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chameleon_types::{TypeBuilder, Value, Visibility};

    fn returns(v: i32) -> impl Fn(&Value, &[Value]) -> chameleon_types::AdaptResult<Value> {
        move |_, _| Ok(Value::I32(v))
    }

    #[test]
    fn test_single_candidate_fast_path() {
        let ty = TypeBuilder::class("Calc")
            .method(MethodInfo::new("Add", vec![TypeHandle::i32(), TypeHandle::i32()], TypeHandle::i32()))
            .build()
            .unwrap();
        let reflector = Reflector::new(&ty);
        assert!(reflector.get_method("Add", &[]).is_some());
        assert!(reflector.get_method("Add", &[TypeHandle::string()]).is_none());
        assert!(reflector.get_method("Sub", &[]).is_none());
    }

    #[test]
    fn test_overloads_exact_then_assignable() {
        let ty = TypeBuilder::class("Printer")
            .method(MethodInfo::new("Print", vec![TypeHandle::object()], TypeHandle::i32()).with_body(returns(1)))
            .method(MethodInfo::new("Print", vec![TypeHandle::string()], TypeHandle::i32()).with_body(returns(2)))
            .build()
            .unwrap();
        let reflector = Reflector::new(&ty);

        let exact = reflector.get_method("Print", &[TypeHandle::string()]).unwrap();
        assert_eq!(exact.params(), &[TypeHandle::string()]);

        let widened = reflector.get_method("Print", &[TypeHandle::buffer()]).unwrap();
        assert_eq!(widened.params(), &[TypeHandle::object()]);

        // Two same-name candidates and no argument types: arity 0 required
        assert!(reflector.get_method("Print", &[]).is_none());
    }

    #[test]
    fn test_inherited_and_shadowed() {
        let base = TypeBuilder::class("Base")
            .method(MethodInfo::new("Name", vec![], TypeHandle::i32()).as_virtual().with_body(returns(1)))
            .method(MethodInfo::new("Hidden", vec![], TypeHandle::i32()).with_visibility(Visibility::Private))
            .build()
            .unwrap();
        let derived = TypeBuilder::class("Derived")
            .parent(&base)
            .method(MethodInfo::new("Name", vec![], TypeHandle::i32()).with_body(returns(2)))
            .build()
            .unwrap();
        let reflector = Reflector::new(&derived);

        let name = reflector.get_method("Name", &[]).unwrap();
        assert_eq!(name.declaring_type(), "Derived");
        assert_eq!(name.invoke(&Value::Null, &[]).unwrap(), Value::I32(2));

        // Non-public members are visible to reflection
        assert!(reflector.get_method("Hidden", &[]).is_some());
        assert_eq!(reflector.methods().len(), 2);
        assert_eq!(reflector.hierarchy(), vec![derived, base, TypeHandle::object()]);
    }

    #[test]
    fn test_interface_hierarchy_is_flattened() {
        let readable = TypeBuilder::interface("Readable")
            .property(PropertyInfo::new("Length", TypeHandle::i32()).readable())
            .build()
            .unwrap();
        let stream = TypeBuilder::interface("Stream")
            .implements(&readable)
            .method(MethodInfo::new("Close", vec![], TypeHandle::void()))
            .build()
            .unwrap();
        let reflector = Reflector::new(&stream);
        assert!(reflector.get_property("Length").is_some());
        assert!(reflector.get_method("Close", &[]).is_some());
    }

    #[test]
    fn test_lookups_are_counted() {
        let ty = TypeBuilder::class("Counted").build().unwrap();
        let reflector = Reflector::new(&ty);
        let before = ty.lookup_count();
        reflector.get_property("Missing");
        reflector.get_event("Missing");
        reflector.methods();
        assert_eq!(ty.lookup_count(), before + 2);
    }

    #[test]
    fn test_constructor_and_indexer() {
        let ty = TypeBuilder::class("Table")
            .constructor(ConstructorInfo::new(vec![TypeHandle::object()], |_| Ok(Value::Null)))
            .indexer(IndexerInfo::new(vec![TypeHandle::string()], TypeHandle::i32()).readable())
            .build()
            .unwrap();
        let reflector = Reflector::new(&ty);
        assert!(reflector.get_constructor(&[TypeHandle::string()]).is_some());
        assert!(reflector.get_constructor(&[]).is_none());
        assert!(reflector.get_indexer(&[TypeHandle::string()]).is_some());
        assert!(reflector.get_indexer(&[TypeHandle::i32()]).is_none());
    }
}
