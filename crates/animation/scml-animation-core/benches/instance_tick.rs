use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use scml_animation_core::{Config, Document, EntityId, Transform};
use scml_test_fixtures::documents;

fn load() -> Arc<Document> {
    let json = documents::json("stick_figure").expect("load stick_figure fixture");
    Arc::new(Document::from_scon_json(&json).expect("stick_figure should load"))
}

fn instance_tick(c: &mut Criterion) {
    let doc = load();
    let base = Transform::from_position(320.0, 240.0);
    let quiet = Config {
        log_warnings: false,
        ..Config::default()
    };

    c.bench_function("transforms_cached", |b| {
        let mut inst = doc
            .create_instance_with_config(EntityId(0), quiet.clone())
            .unwrap();
        inst.select_by_name("wave").unwrap();
        inst.advance(250);
        b.iter(|| {
            black_box(inst.transforms(black_box(&base)).objects.len());
        })
    });

    c.bench_function("advance_and_transforms", |b| {
        let mut inst = doc
            .create_instance_with_config(EntityId(0), quiet.clone())
            .unwrap();
        inst.select_by_name("wave").unwrap();
        b.iter(|| {
            inst.advance(black_box(16));
            black_box(inst.transforms(&base).objects.len());
        })
    });

    c.bench_function("transforms_uncached", |b| {
        let cfg = Config {
            cache_transforms: false,
            ..quiet.clone()
        };
        let mut inst = doc.create_instance_with_config(EntityId(0), cfg).unwrap();
        inst.select_by_name("wave").unwrap();
        inst.advance(250);
        b.iter(|| {
            black_box(inst.transforms(black_box(&base)).objects.len());
        })
    });
}

criterion_group!(benches, instance_tick);
criterion_main!(benches);
