//! Benchmarks for shader generation and the CPU reference math.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;

use driftfield::field::VectorField;
use driftfield::integrator::{position_pass_source, step_particle, velocity_pass_source};
use driftfield::params::SimulationParameters;

fn bench_field_to_wgsl(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_to_wgsl");

    for selector in 0..VectorField::COUNT {
        let field = VectorField::from_selector(selector);
        group.bench_function(field.name(), |b| {
            b.iter(|| black_box(field.to_wgsl()))
        });
    }

    group.finish();
}

fn bench_pass_sources(c: &mut Criterion) {
    let mut group = c.benchmark_group("pass_source");

    // Curl noise carries the full noise library; attractors are tiny.
    group.bench_function("velocity_curl_noise", |b| {
        let field = VectorField::from_selector(0);
        b.iter(|| black_box(velocity_pass_source(&field)))
    });

    group.bench_function("velocity_lorenz", |b| {
        let field = VectorField::from_selector(1);
        b.iter(|| black_box(velocity_pass_source(&field)))
    });

    group.bench_function("position", |b| {
        b.iter(|| black_box(position_pass_source()))
    });

    group.finish();
}

fn bench_cpu_reference(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_step");

    for selector in [0u32, 1, 6] {
        let params = SimulationParameters {
            field: VectorField::from_selector(selector),
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::new("field", params.field.name()),
            &params,
            |b, params| {
                b.iter(|| {
                    let mut pos = Vec3::new(0.1, 0.2, 0.3);
                    let mut vel = Vec3::ZERO;
                    for step in 0..100 {
                        let (p, v) =
                            step_particle(params, pos, vel, step as f32 / 60.0, 1.0 / 60.0);
                        pos = p;
                        vel = v;
                    }
                    black_box((pos, vel))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_field_to_wgsl,
    bench_pass_sources,
    bench_cpu_reference,
);
criterion_main!(benches);
