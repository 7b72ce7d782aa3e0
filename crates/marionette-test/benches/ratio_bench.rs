//! Benchmarks for landmark geometry

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use marionette_face::{EnvelopeMapper, Point2, RatioCalculator};
use marionette_test::{FacePose, FaceScript};
use std::time::Duration;

fn bench_compute_points(c: &mut Criterion) {
    let calculator = RatioCalculator::new();
    let frame = FacePose::new(0.3, 0.28, 0.4).landmarks(Point2::new(320.0, 240.0));

    c.bench_function("ratio_compute_points", |b| {
        b.iter(|| black_box(calculator.compute_points(black_box(&frame))))
    });
}

fn bench_compute_stream(c: &mut Criterion) {
    let calculator = RatioCalculator::new();
    let script = FaceScript::default();
    let frames: Vec<_> = (0..300u64)
        .map(|i| {
            script
                .pose_at(Duration::from_millis(i * 33))
                .landmark_set(Point2::new(320.0, 240.0))
        })
        .collect();

    let mut group = c.benchmark_group("ratio_stream");
    group.throughput(Throughput::Elements(frames.len() as u64));
    group.bench_function("300_frames", |b| {
        b.iter(|| {
            for frame in &frames {
                black_box(calculator.compute(frame)).ok();
            }
        })
    });
    group.finish();
}

fn bench_envelope(c: &mut Criterion) {
    let mapper = EnvelopeMapper::new();

    c.bench_function("envelope_map", |b| {
        b.iter(|| black_box(mapper.map(black_box(-23.5))))
    });
}

criterion_group!(benches, bench_compute_points, bench_compute_stream, bench_envelope);
criterion_main!(benches);
