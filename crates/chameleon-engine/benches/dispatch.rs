use std::sync::Arc;

use chameleon_engine::{AdapterFactory, BindingOptions, DefaultInterceptor};
use chameleon_types::{MethodInfo, PropertyInfo, TypeBuilder, TypeHandle, Value};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

struct Counter {
    value: i32,
}

fn counter_type() -> TypeHandle {
    TypeBuilder::class("Counter")
        .in_module("bench")
        .method(
            MethodInfo::new("Add", vec![TypeHandle::i32()], TypeHandle::i32()).with_typed_body::<Counter, _>(
                |counter, args| Ok(Value::I32(counter.value + args[0].as_i32().unwrap_or(0))),
            ),
        )
        .property(
            PropertyInfo::new("Value", TypeHandle::i32())
                .with_typed_getter::<Counter, _>(|counter| Ok(Value::I32(counter.value))),
        )
        .build()
        .unwrap()
}

fn adder_contract() -> TypeHandle {
    TypeBuilder::interface("Adder")
        .in_module("bench")
        .method(MethodInfo::new("Add", vec![TypeHandle::i32()], TypeHandle::i32()))
        .property(PropertyInfo::new("Value", TypeHandle::i32()).readable())
        .build()
        .unwrap()
}

fn factories(contract: &TypeHandle) -> Vec<(&'static str, AdapterFactory)> {
    let dynamic = BindingOptions {
        direct_binding: false,
        ..BindingOptions::default()
    };
    vec![
        ("direct", AdapterFactory::new(contract).unwrap()),
        ("dynamic", AdapterFactory::with_options(contract, dynamic).unwrap()),
        (
            "intercepted",
            AdapterFactory::new(contract)
                .unwrap()
                .with_interceptor(Arc::new(DefaultInterceptor)),
        ),
    ]
}

fn bench_invoke(c: &mut Criterion) {
    let mut group = c.benchmark_group("invoke");
    let contract = adder_contract();
    let counter_ty = counter_type();

    for (name, factory) in factories(&contract) {
        let adapter = factory
            .create_adapter(Value::object(&counter_ty, Counter { value: 1 }))
            .unwrap();
        group.bench_with_input(BenchmarkId::new("add", name), &adapter, |b, adapter| {
            b.iter(|| adapter.invoke("Add", black_box(&[Value::I32(2)])).unwrap());
        });
    }

    group.finish();
}

fn bench_property(c: &mut Criterion) {
    let mut group = c.benchmark_group("property");
    let contract = adder_contract();
    let counter_ty = counter_type();

    for (name, factory) in factories(&contract) {
        let adapter = factory
            .create_adapter(Value::object(&counter_ty, Counter { value: 1 }))
            .unwrap();
        group.bench_with_input(BenchmarkId::new("get", name), &adapter, |b, adapter| {
            b.iter(|| adapter.get(black_box("Value")).unwrap());
        });
    }

    group.finish();
}

fn bench_create_adapter(c: &mut Criterion) {
    let contract = adder_contract();
    let counter_ty = counter_type();
    let factory = AdapterFactory::new(&contract).unwrap();

    c.bench_function("create_adapter_cached", |b| {
        b.iter(|| {
            factory
                .create_adapter(black_box(Value::object(&counter_ty, Counter { value: 0 })))
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_invoke, bench_property, bench_create_adapter);
criterion_main!(benches);
