//! Criterion benchmarks for ymdur-core components
//!
//! Run with: cargo bench -p ymdur-core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ymdur_core::{
    AnalysisParams, Instrument, MeasureConfig, RegisterLog, analyze, channel_rms,
    measure_with_chip,
};

/// Exponentially decaying curve of `len` slices.
fn decaying_curve(len: usize, half_life: f64) -> Vec<f64> {
    (0..len)
        .map(|i| 20_000.0 * 0.5_f64.powf(i as f64 / half_life))
        .collect()
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("Analyze");
    let params = AnalysisParams::default();

    for len in [150, 900, 6000] {
        let on = decaying_curve(len, len as f64 / 4.0);
        let off = decaying_curve(len, 20.0);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| analyze(black_box(&on), black_box(&off), &params));
        });
    }

    group.finish();
}

fn bench_slice_rms(c: &mut Criterion) {
    let frames = MeasureConfig::default().frames_per_slice();
    let buffer: Vec<i16> = (0..frames * 2)
        .map(|i| ((i as f32 * 0.05).sin() * 12_000.0) as i16)
        .collect();

    c.bench_function("slice_rms_294_frames", |b| {
        b.iter(|| channel_rms(black_box(&buffer), 0));
    });
}

fn bench_pipeline_silent(c: &mut Criterion) {
    // Silent chip: both capture loops run to their limits.
    let config = MeasureConfig {
        max_key_on_secs: 1.0,
        max_key_off_secs: 1.0,
        ..Default::default()
    };
    let instrument = Instrument::default();

    c.bench_function("pipeline_silent_2s", |b| {
        b.iter(|| measure_with_chip(RegisterLog::new(), black_box(&instrument), &config));
    });
}

criterion_group!(benches, bench_analyze, bench_slice_rms, bench_pipeline_silent);
criterion_main!(benches);
