//! Benchmarks for the hot paths of the bridge: scalar conversion, struct
//! marshaling and the generic call path.
//!
//! ```bash
//! cargo bench --bench call_benchmarks
//! ```
//!
//! With `--features profile-with-puffin` the bridge's profiling scopes are
//! recorded, one puffin frame per benchmark.

use autobind::prelude::*;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

fn add(a: i32, b: i32) -> i32 {
    a + b
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn declare_vec3(registry: &mut Registry) -> TypeId {
    let vec3 = registry.register_type("Vec3", 12);
    let f32_id = registry.type_of::<f32>();
    registry.declare_struct(vec3).unwrap();
    for (i, name) in ["x", "y", "z"].into_iter().enumerate() {
        registry
            .add_member(vec3, Some(name), f32_id, i * 4)
            .unwrap();
    }
    vec3
}

fn bench_scalars(c: &mut Criterion) {
    setup_profiler();
    let registry = Registry::open();
    let mut stack = ValueStack::new();
    let mut group = c.benchmark_group("scalar");

    group.bench_function("push_read_i32", |b| {
        b.iter(|| {
            registry.push_value(&mut stack, black_box(42i32)).unwrap();
            let value = registry.read_value::<i32>(&mut stack, -1).unwrap();
            stack.pop(1);
            black_box(value)
        })
    });

    group.bench_function("push_read_f64", |b| {
        b.iter(|| {
            registry.push_value(&mut stack, black_box(0.5f64)).unwrap();
            let value = registry.read_value::<f64>(&mut stack, -1).unwrap();
            stack.pop(1);
            black_box(value)
        })
    });

    group.finish();
    end_profiling_frame();
}

fn bench_structs(c: &mut Criterion) {
    let mut registry = Registry::open();
    let vec3 = declare_vec3(&mut registry);
    let src: Vec<u8> = [1.0f32, 2.0, 3.0]
        .iter()
        .flat_map(|v| v.to_ne_bytes())
        .collect();
    let mut dst = [0u8; 12];
    let mut stack = ValueStack::new();

    c.bench_function("struct/vec3_round_trip", |b| {
        b.iter(|| {
            registry.push(&mut stack, vec3, black_box(&src)).unwrap();
            registry.read(&mut stack, vec3, &mut dst, -1).unwrap();
            stack.pop(1);
            black_box(dst)
        })
    });
    end_profiling_frame();
}

fn bench_calls(c: &mut Criterion) {
    let mut registry = Registry::open();
    let add_addr = registry
        .register_fn(add as fn(i32, i32) -> i32, Some("add"))
        .unwrap();
    registry
        .register_fn(lerp as fn(f64, f64, f64) -> f64, Some("lerp"))
        .unwrap();
    let mut stack = ValueStack::new();
    let mut group = c.benchmark_group("call");

    group.bench_function("add_by_address", |b| {
        b.iter(|| {
            stack.push_all([Dynamic::Int(2), Dynamic::Int(3)]);
            registry.call(&mut stack, black_box(add_addr)).unwrap();
            black_box(stack.take_top())
        })
    });

    group.bench_function("lerp_by_name", |b| {
        b.iter(|| {
            stack.push_all([0.0, 10.0, 0.25].map(Dynamic::Float));
            registry
                .call_by_name(&mut stack, black_box("lerp"))
                .unwrap();
            black_box(stack.take_top())
        })
    });

    group.finish();
    end_profiling_frame();
}

criterion_group!(benches, bench_scalars, bench_structs, bench_calls);
criterion_main!(benches);
