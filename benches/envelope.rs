use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use packwrap::{Compress, Decoder, Encoder};
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
struct LogLine {
    time: u64,
    level: String,
    source: String,
    message: String,
}

fn logs(count: usize) -> Vec<LogLine> {
    (0..count)
        .map(|i| LogLine {
            time: 1_700_000_000 + i as u64,
            level: if i % 10 == 0 { "WARN" } else { "INFO" }.to_string(),
            source: format!("worker-{}", i % 8),
            message: format!("processed batch {} with {} items", i, i % 97),
        })
        .collect()
}

fn settings() -> [(&'static str, Compress); 4] {
    [
        ("none", Compress::None),
        ("lz4", Compress::Lz4),
        ("zstd-1", Compress::new_zstd(1)),
        ("zstd-3", Compress::new_zstd(3)),
    ]
}

fn encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for count in [10usize, 1000] {
        let lines = logs(count);
        let raw_len = rmp_serde::to_vec_named(&lines).unwrap().len();
        group.throughput(Throughput::Bytes(raw_len as u64));
        for (name, setting) in settings() {
            let encoder = Encoder::new().compression(setting);
            group.bench_with_input(BenchmarkId::new(name, count), &lines, |b, lines| {
                b.iter(|| encoder.encode(lines).unwrap())
            });
        }
    }
    group.finish();
}

fn decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for count in [10usize, 1000] {
        let lines = logs(count);
        let raw_len = rmp_serde::to_vec_named(&lines).unwrap().len();
        group.throughput(Throughput::Bytes(raw_len as u64));
        for (name, setting) in settings() {
            let enc = Encoder::new().compression(setting).encode(&lines).unwrap();
            let decoder = Decoder::new().engine(setting.ext_type().unwrap_or_default());
            group.bench_with_input(BenchmarkId::new(name, count), &enc, |b, enc| {
                b.iter(|| decoder.decode::<Vec<LogLine>>(enc).unwrap())
            });
        }
    }
    group.finish();
}

criterion_group!(benches, encode, decode);
criterion_main!(benches);
