//! Reflective forwarding
//!
//! Each operation resolves the member against the instance's runtime type at
//! call time and fails with a missing-member error naming the member, the
//! searched type and its module.

use chameleon_types::{AdaptError, AdaptResult, Handler, MemberKind, TypeHandle, Value, INDEXER_NAME};

use crate::reflect::Reflector;

fn runtime_types(args: &[Value]) -> Vec<TypeHandle> {
    args.iter().map(Value::type_of).collect()
}

/// Call `method` on `instance`, resolving by the given parameter types
pub fn invoke_with(
    instance: &Value,
    method: &str,
    arg_types: &[TypeHandle],
    args: &[Value],
) -> AdaptResult<Value> {
    let ty = instance.type_of();
    match Reflector::new(&ty).get_method(method, arg_types) {
        Some(info) => info.invoke(instance, args),
        None => Err(AdaptError::missing(MemberKind::Method, method, &ty)),
    }
}

/// Call `method` on `instance`, resolving by the runtime types of `args`
pub fn invoke(instance: &Value, method: &str, args: &[Value]) -> AdaptResult<Value> {
    invoke_with(instance, method, &runtime_types(args), args)
}

/// Read `property`
pub fn get(instance: &Value, property: &str) -> AdaptResult<Value> {
    let ty = instance.type_of();
    match Reflector::new(&ty).get_property(property) {
        Some(info) => info.get(instance),
        None => Err(AdaptError::missing(MemberKind::Property, property, &ty)),
    }
}

/// Write `property`
pub fn set(instance: &Value, property: &str, value: Value) -> AdaptResult<()> {
    let ty = instance.type_of();
    match Reflector::new(&ty).get_property(property) {
        Some(info) => info.set(instance, value),
        None => Err(AdaptError::missing(MemberKind::Property, property, &ty)),
    }
}

/// Read an element through the indexer matching the given index types
pub fn get_indexed_with(instance: &Value, index_types: &[TypeHandle], index: &[Value]) -> AdaptResult<Value> {
    let ty = instance.type_of();
    match Reflector::new(&ty).get_indexer(index_types) {
        Some(info) => info.get(instance, index),
        None => Err(AdaptError::missing(MemberKind::Indexer, INDEXER_NAME, &ty)),
    }
}

/// Read an element through the indexer matching the runtime index types
pub fn get_indexed(instance: &Value, index: &[Value]) -> AdaptResult<Value> {
    get_indexed_with(instance, &runtime_types(index), index)
}

/// Write an element through the indexer matching the given index types
pub fn set_indexed_with(
    instance: &Value,
    index_types: &[TypeHandle],
    index: &[Value],
    value: Value,
) -> AdaptResult<()> {
    let ty = instance.type_of();
    match Reflector::new(&ty).get_indexer(index_types) {
        Some(info) => info.set(instance, index, value),
        None => Err(AdaptError::missing(MemberKind::Indexer, INDEXER_NAME, &ty)),
    }
}

/// Write an element through the indexer matching the runtime index types
pub fn set_indexed(instance: &Value, index: &[Value], value: Value) -> AdaptResult<()> {
    set_indexed_with(instance, &runtime_types(index), index, value)
}

/// Subscribe `handler` to `event`
pub fn hook(instance: &Value, event: &str, handler: &Handler) -> AdaptResult<()> {
    let ty = instance.type_of();
    match Reflector::new(&ty).get_event(event) {
        Some(info) => info.add_handler(instance, handler),
        None => Err(AdaptError::missing(MemberKind::Event, event, &ty)),
    }
}

/// Unsubscribe `handler` from `event`
pub fn unhook(instance: &Value, event: &str, handler: &Handler) -> AdaptResult<()> {
    let ty = instance.type_of();
    match Reflector::new(&ty).get_event(event) {
        Some(info) => info.remove_handler(instance, handler),
        None => Err(AdaptError::missing(MemberKind::Event, event, &ty)),
    }
}
