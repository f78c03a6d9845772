use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use evotrace_core::RecordLayout;
use evotrace_stats::compress::{Compressor, Zlib};
use evotrace_stats::entropy::shannon_entropy;
use evotrace_stats::repeat::longest_repeated_substring;
use evotrace_stats::{AnalysisConfig, Pipeline};
use evotrace_trace::generator::{generate_trace, SynthParams};
use evotrace_trace::writer::encode_trace;

/// Last program of a deterministic synthetic run (stable across runs).
fn evolved_program(len: usize) -> Vec<u8> {
    let params = SynthParams {
        program_length: len,
        generations: 64,
        mutations_per_generation: len / 32,
        seed: 2024,
    };
    generate_trace(params, RecordLayout::Plain)
        .last()
        .map(|r| r.program)
        .unwrap_or_default()
}

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("program_kernels");
    for &k in &[12usize, 16usize] {
        let n = 1usize << k;
        let program = evolved_program(n);
        group.throughput(Throughput::Bytes(n as u64));

        group.bench_function(BenchmarkId::new("z_repeat", format!("2^{k}")), |b| {
            b.iter(|| longest_repeated_substring(black_box(&program)));
        });
        group.bench_function(BenchmarkId::new("entropy", format!("2^{k}")), |b| {
            b.iter(|| shannon_entropy(black_box(&program)));
        });
        let zlib = Zlib::default();
        group.bench_function(BenchmarkId::new("zlib9_len", format!("2^{k}")), |b| {
            b.iter(|| zlib.compressed_len(black_box(&program)));
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let params = SynthParams {
        program_length: 4096,
        generations: 256,
        mutations_per_generation: 16,
        seed: 7,
    };
    let recs: Vec<_> = generate_trace(params, RecordLayout::Counted).collect();
    let bytes = encode_trace(&params.header(), RecordLayout::Counted, &recs).unwrap_or_default();

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    for repeats in [false, true] {
        let cfg = AnalysisConfig {
            repeats,
            ..AnalysisConfig::default()
        };
        group.bench_function(BenchmarkId::new("rows", format!("repeats={repeats}")), |b| {
            b.iter(|| {
                let p = Pipeline::open(black_box(bytes.as_slice()), cfg);
                p.map(|p| p.filter_map(Result::ok).count()).unwrap_or(0)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_kernels, bench_pipeline);
criterion_main!(benches);
