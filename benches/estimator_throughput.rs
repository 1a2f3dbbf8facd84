//! Benchmarks for the acquisition hot path
//!
//! Covers the work done once per acquisition cycle on the device:
//! - Reference estimator over windows of 100 to 400 samples
//! - Buffer fill from a sensor that always has data (no pacing delays)
//! - Record encoding for the collector

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use vitalink::sensor::WaveformSensor;
use vitalink::sim::SimulatedPpg;
use vitalink::test_utils::ScriptedWaveform;
use vitalink::{
    Estimator, FillPolicy, PeakRatioEstimator, RawEstimate, SampleBuffer, TelemetryRecord,
    VitalEstimate,
};

fn simulated_window(len: usize) -> (Vec<u32>, Vec<u32>) {
    let mut sensor = SimulatedPpg::new(72.0, 0.6);
    let mut ir = Vec::with_capacity(len);
    let mut red = Vec::with_capacity(len);
    for _ in 0..len {
        let sample = sensor.read_sample();
        ir.push(sample.channel_a);
        red.push(sample.channel_b);
        sensor.advance();
    }
    (ir, red)
}

fn bench_estimator(c: &mut Criterion) {
    let estimator = PeakRatioEstimator::default();
    let mut group = c.benchmark_group("peak_ratio_estimator");

    for len in [100usize, 200, 400] {
        let (ir, red) = simulated_window(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| black_box(estimator.estimate(black_box(&ir), black_box(&red))))
        });
    }

    // No finger: early exit on the DC check
    let ir = vec![1_200u32; 100];
    let red = vec![900u32; 100];
    group.bench_function("no_finger", |b| {
        b.iter(|| black_box(estimator.estimate(black_box(&ir), black_box(&red))))
    });

    group.finish();
}

fn bench_buffer_fill(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("tokio runtime");
    let policy = FillPolicy::immediate(1);
    let mut sensor = ScriptedWaveform::always_ready();
    let mut buffer = SampleBuffer::with_capacity(100);

    c.bench_function("fill_100_samples", |b| {
        b.iter(|| runtime.block_on(async { black_box(buffer.try_fill(&mut sensor, &policy).await) }))
    });
}

fn bench_record_encoding(c: &mut Criterion) {
    let estimate = VitalEstimate::from(RawEstimate::new(72, true, 98, true));
    let record = TelemetryRecord::new(1, &estimate, 36.5, "2025-06-01T12:00:00");

    c.bench_function("record_to_json", |b| b.iter(|| black_box(record.to_json())));
}

criterion_group!(benches, bench_estimator, bench_buffer_fill, bench_record_encoding);
criterion_main!(benches);
