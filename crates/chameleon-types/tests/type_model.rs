//! Integration tests for the type model
//!
//! Builds small hierarchies the way host code registers its types and checks
//! member behavior through the public API only.

use std::sync::Arc;

use chameleon_types::{
    AdaptError, Buffer, EventInfo, EventSource, FieldInfo, Handler, IndexerInfo, MemberKind,
    MethodInfo, PropertyInfo, TypeBuilder, TypeHandle, TypeRegistry, Value,
};
use parking_lot::Mutex;

struct MemoryStream {
    data: Vec<u8>,
    position: Mutex<usize>,
    changed: EventSource,
}

fn memory_stream_type(registry: &TypeRegistry) -> TypeHandle {
    let i32_ty = TypeHandle::i32();
    registry
        .define(
            registry
                .class("MemoryStream")
                .method(
                    MethodInfo::new(
                        "Read",
                        vec![TypeHandle::buffer(), i32_ty.clone(), i32_ty.clone()],
                        i32_ty.clone(),
                    )
                    .with_typed_body::<MemoryStream, _>(|stream, args| {
                        let target = Buffer::try_from(args[0].clone())?;
                        let offset = i32::try_from(args[1].clone())? as usize;
                        let count = i32::try_from(args[2].clone())? as usize;
                        let mut position = stream.position.lock();
                        let available = stream.data.len().saturating_sub(*position).min(count);
                        target.write()[offset..offset + available]
                            .copy_from_slice(&stream.data[*position..*position + available]);
                        *position += available;
                        stream.changed.raise(&[Value::I32(*position as i32)])?;
                        Ok(Value::I32(available as i32))
                    }),
                )
                .property(
                    PropertyInfo::new("Length", i32_ty.clone())
                        .with_typed_getter::<MemoryStream, _>(|s| Ok(Value::I32(s.data.len() as i32))),
                )
                .property(
                    PropertyInfo::new("Position", i32_ty.clone())
                        .with_typed_getter::<MemoryStream, _>(|s| Ok(Value::I32(*s.position.lock() as i32)))
                        .with_typed_setter::<MemoryStream, _>(|s, v| {
                            *s.position.lock() = i32::try_from(v)? as usize;
                            Ok(())
                        }),
                )
                .indexer(
                    IndexerInfo::new(vec![i32_ty.clone()], i32_ty.clone()).with_typed_getter::<MemoryStream, _>(
                        |s, index| {
                            let i = i32::try_from(index[0].clone())? as usize;
                            s.data
                                .get(i)
                                .map(|b| Value::I32(*b as i32))
                                .ok_or_else(|| AdaptError::Invocation(format!("index {} out of range", i)))
                        },
                    ),
                )
                .event(
                    EventInfo::new("PositionChanged", TypeHandle::handler()).with_typed_accessors::<MemoryStream, _, _>(
                        |s, h| {
                            s.changed.add(h);
                            Ok(())
                        },
                        |s, h| {
                            s.changed.remove(h);
                            Ok(())
                        },
                    ),
                )
                .field(FieldInfo::new("Capacity", i32_ty).with_getter(|_| Ok(Value::I32(4096)))),
        )
        .unwrap()
}

fn new_stream(ty: &TypeHandle, data: &[u8]) -> Value {
    Value::object(
        ty,
        MemoryStream {
            data: data.to_vec(),
            position: Mutex::new(0),
            changed: EventSource::new(),
        },
    )
}

#[test]
fn test_registered_members_are_callable() {
    let registry = TypeRegistry::new("io");
    let ty = memory_stream_type(&registry);
    let stream = new_stream(&ty, b"hello");

    let read = &ty.declared_methods()[0];
    assert_eq!(read.declaring_type(), "MemoryStream");

    let buffer = Buffer::new(8);
    let n = read
        .invoke(&stream, &[Value::from(buffer.clone()), Value::I32(0), Value::I32(3)])
        .unwrap();
    assert_eq!(n, Value::I32(3));
    assert_eq!(&buffer.to_vec()[..3], b"hel");

    let props = ty.declared_properties();
    assert_eq!(props[0].get(&stream).unwrap(), Value::I32(5));
    assert_eq!(props[1].get(&stream).unwrap(), Value::I32(3));
    props[1].set(&stream, Value::I32(1)).unwrap();
    assert_eq!(props[1].get(&stream).unwrap(), Value::I32(1));

    let indexer = &ty.declared_indexers()[0];
    assert_eq!(indexer.get(&stream, &[Value::I32(4)]).unwrap(), Value::I32(b'o' as i32));
    assert!(matches!(
        indexer.get(&stream, &[Value::I32(9)]),
        Err(AdaptError::Invocation(_))
    ));
    assert!(matches!(
        indexer.set(&stream, &[Value::I32(0)], Value::I32(1)),
        Err(AdaptError::NotWritable { .. })
    ));

    let capacity = &ty.declared_fields()[0];
    assert!(capacity.is_readonly());
    assert_eq!(capacity.get(&stream).unwrap(), Value::I32(4096));
}

#[test]
fn test_event_subscription() {
    let registry = TypeRegistry::new("io");
    let ty = memory_stream_type(&registry);
    let stream = new_stream(&ty, b"abc");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler = Handler::new(move |args| {
        sink.lock().push(args[0].clone());
        Ok(Value::Null)
    });

    let event = &ty.declared_events()[0];
    event.add_handler(&stream, &handler).unwrap();

    let read = &ty.declared_methods()[0];
    let buffer = Value::from(Buffer::new(4));
    read.invoke(&stream, &[buffer.clone(), Value::I32(0), Value::I32(2)]).unwrap();

    event.remove_handler(&stream, &handler).unwrap();
    read.invoke(&stream, &[buffer, Value::I32(0), Value::I32(1)]).unwrap();

    assert_eq!(*seen.lock(), vec![Value::I32(2)]);
}

#[test]
fn test_open_types_accept_late_members() {
    let ty = TypeBuilder::class("Late").build().unwrap();
    assert!(ty.declared_methods().is_empty());

    ty.define_method(
        MethodInfo::new("Ping", vec![], TypeHandle::string()).with_body(|_, _| Ok(Value::from("pong"))),
    )
    .unwrap();

    let ping = &ty.declared_methods()[0];
    assert_eq!(ping.invoke(&Value::Null, &[]).unwrap(), Value::from("pong"));
}

#[test]
fn test_wrong_receiver_reports_member() {
    let registry = TypeRegistry::new("io");
    let ty = memory_stream_type(&registry);
    let other = TypeBuilder::class("Other").build().unwrap();
    let not_a_stream = Value::object(&other, 5u32);

    let err = ty.declared_properties()[0].get(&not_a_stream).unwrap_err();
    match err {
        AdaptError::ReceiverMismatch { member, .. } => assert_eq!(member, "Length"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_abstract_accessors() {
    let contract = TypeBuilder::interface("Named")
        .property(PropertyInfo::new("Name", TypeHandle::string()).readable())
        .build()
        .unwrap();

    let err = contract.declared_properties()[0].get(&Value::Null).unwrap_err();
    assert!(matches!(
        err,
        AdaptError::AbstractMember {
            kind: MemberKind::Property,
            ..
        }
    ));
}
