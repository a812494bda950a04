//! Performance benchmarks for the shape engine
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Transition-graph hits when many objects are built the same way
//! - Lookup cost per representation
//! - Inline-cache hit path versus a shape lookup

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quicksilver_shape::{
    PropertyCache, PropertyDescriptor, PropertyName, Shape, ShapeConfig, ShapedObject,
};
use std::rc::Rc;

fn names(count: usize) -> Vec<PropertyName> {
    (0..count)
        .map(|i| PropertyName::from(format!("prop{}", i).as_str()))
        .collect()
}

fn build(root: &Shape, names: &[PropertyName]) -> Shape {
    names.iter().fold(root.clone(), |shape, name| {
        shape.add_property(name.clone(), PropertyDescriptor::DEFAULT_DATA)
    })
}

/// Benchmark: Building objects that share one transition chain
fn bench_transition_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition");
    let root = Shape::root(Rc::new(ShapeConfig::default()));
    let keys = names(16);
    build(&root, &keys);

    group.throughput(Throughput::Elements(keys.len() as u64));
    group.bench_function("warm_chain_16", |b| {
        b.iter(|| black_box(build(&root, &keys)))
    });

    group.finish();
}

/// Benchmark: find_property across representations
fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    let root = Shape::root(Rc::new(ShapeConfig::default()));

    for size in [8usize, 64, 256].iter() {
        let keys = names(*size);
        let shape = build(&root, &keys);
        let probe = keys[size / 2].clone();
        group.bench_with_input(
            BenchmarkId::new(shape.kind().to_string(), size),
            size,
            |b, _| b.iter(|| black_box(shape.find_property(black_box(&probe)))),
        );
    }

    group.finish();
}

/// Benchmark: Reads through the inline cache
fn bench_inline_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("inline_cache");
    let keys = names(8);
    let mut obj: ShapedObject<u64> = ShapedObject::new(Shape::empty());
    for (i, key) in keys.iter().enumerate() {
        obj.set(key.clone(), i as u64);
    }
    let probe = keys[5].clone();

    group.bench_function("cached_read", |b| {
        let mut cache = PropertyCache::new();
        b.iter(|| black_box(cache.get_property(&obj, black_box(&probe)).copied()))
    });

    group.bench_function("uncached_read", |b| {
        b.iter(|| black_box(obj.get(black_box(&probe)).copied()))
    });

    group.finish();
}

/// Benchmark: Unique linear shapes grow in place
fn bench_dictionary_growth(c: &mut Criterion) {
    let keys = names(64);
    c.bench_function("dictionary_growth_64", |b| {
        b.iter(|| {
            let mut obj: ShapedObject<usize> = ShapedObject::new(Shape::empty());
            obj.prevent_sharing();
            for (i, key) in keys.iter().enumerate() {
                obj.set(key.clone(), i);
            }
            black_box(obj.len())
        })
    });
}

criterion_group!(
    benches,
    bench_transition_hits,
    bench_lookup,
    bench_inline_cache,
    bench_dictionary_growth,
);

criterion_main!(benches);
