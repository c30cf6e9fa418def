use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hydrozynq_dsp::correlate::{cross_correlate, required_capacity};
use hydrozynq_dsp::iir::filter as iir_filter;
use hydrozynq_dsp::normalize::normalize;
use hydrozynq_dsp::params::highpass_cascade;
use hydrozynq_dsp::sample::SampleFrame;

const FS: u32 = 5_000_000;

fn synthetic_ping(len: usize) -> Vec<SampleFrame> {
    (0..len)
        .map(|i| {
            let phase = 2.0 * core::f64::consts::PI * 40_000.0 * i as f64 / FS as f64;
            let v = (8_000.0 * phase.sin()) as i16;
            [v, v, v, v]
        })
        .collect()
}

fn normalize_bench(c: &mut Criterion) {
    let buf = synthetic_ping(1500);
    c.bench_function("normalize_1500_frames", |b| {
        b.iter(|| {
            let mut buf = buf.clone();
            normalize(black_box(&mut buf)).unwrap();
        })
    });
}

fn iir_bench(c: &mut Criterion) {
    let buf = synthetic_ping(1500);
    let cascade = highpass_cascade();
    c.bench_function("iir_filter_1500_frames_5_sections", |b| {
        b.iter(|| {
            let mut buf = buf.clone();
            iir_filter(black_box(&mut buf), black_box(&cascade)).unwrap();
        })
    });
}

fn cross_correlate_bench(c: &mut Criterion) {
    let ping = synthetic_ping(1500);
    let mut xcorr = vec![0.0f32; required_capacity(FS)];
    c.bench_function("cross_correlate_1500_frames", |b| {
        b.iter(|| {
            cross_correlate(black_box(&ping), black_box(&mut xcorr), black_box(FS)).unwrap();
        })
    });
}

criterion_group!(dsp, normalize_bench, iir_bench, cross_correlate_bench);
criterion_main!(dsp);
