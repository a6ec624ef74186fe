use std::io::Cursor;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use inwatch_decoder::EventDecoder;
use inwatch_tests::{ChunkedSource, mixed_stream};

fn bench_decode_whole(c: &mut Criterion) {
    let fixture = mixed_stream(1_000);

    let mut group = c.benchmark_group("decode_whole");
    group.throughput(Throughput::Bytes(fixture.bytes.len() as u64));
    for capacity in [272usize, 4096, 65_536] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &cap| {
            b.iter(|| {
                let mut decoder =
                    EventDecoder::with_capacity(Cursor::new(fixture.bytes.as_slice()), cap).unwrap();
                decoder.events().map(Result::unwrap).count()
            });
        });
    }
    group.finish();
}

fn bench_decode_chunked(c: &mut Criterion) {
    let fixture = mixed_stream(1_000);

    let mut group = c.benchmark_group("decode_chunked");
    group.throughput(Throughput::Bytes(fixture.bytes.len() as u64));
    for chunk in [1usize, 7, 64, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let source = ChunkedSource::uniform(fixture.bytes.clone(), chunk);
                let mut decoder = EventDecoder::new(source).unwrap();
                decoder.events().map(Result::unwrap).count()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode_whole, bench_decode_chunked);
criterion_main!(benches);
