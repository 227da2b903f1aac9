//! Criterion benchmarks for the fusion engine update path.
//!
//! Run with: cargo bench
//! Run specific group: cargo bench -- geometry_updates

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use polarfuse::{FusionConfig, FusionEngine, ObjectProperties, PolarReading};

/// An engine with both sensor tables populated and valid.
fn primed_engine() -> FusionEngine {
    let config = FusionConfig::default().with_separation(2.0);
    let mut engine = FusionEngine::new(config).unwrap();
    for id in 0..polarfuse::SENSOR_OBJECTS {
        let props = ObjectProperties {
            birth: id as f64,
            lifetime: 1.0,
            alive: 1,
            valid: 1,
            zombie: 0,
        };
        engine.update_properties('l', id, props);
        engine.update_properties('r', id, props);
    }
    engine
}

/// A spread of readings cycling through both sensors and several bearings.
fn readings() -> Vec<(char, usize, PolarReading)> {
    let mut out = Vec::new();
    for step in 0..64 {
        let id = step % 8;
        let tag = if step % 2 == 0 { 'l' } else { 'r' };
        out.push((
            tag,
            id,
            PolarReading {
                angle_deg: 60.0 + 10.0 * (id as f64),
                dist: 2.0 + 0.5 * (id as f64) + 0.01 * (step % 4) as f64,
                width: 0.5,
                depth: 0.3,
            },
        ));
    }
    out
}

fn bench_geometry_updates(c: &mut Criterion) {
    let stream = readings();

    c.bench_function("geometry_updates/stream_64", |b| {
        b.iter_batched(
            primed_engine,
            |mut engine| {
                for (tag, id, reading) in &stream {
                    engine.update_geometry(*tag, *id, *reading);
                }
                engine
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("geometry_updates/reconfirm_single", |b| {
        b.iter_batched(
            || {
                let mut engine = primed_engine();
                engine.update_geometry('l', 0, stream[0].2);
                engine
            },
            |mut engine| {
                engine.update_geometry('l', 0, stream[0].2);
                engine
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_geometry_updates);
criterion_main!(benches);
