use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use srf_decoder::{DecodeSession, Feed};
use srf_tests::{amp_slice, cube_curtain, decode_in_chunks};
use srf_types::Header;

fn bench_decode_whole(c: &mut Criterion) {
    let curtain = cube_curtain();
    let slice = amp_slice();

    c.bench_function("decode_curtain_whole", |b| {
        b.iter(|| {
            let mut session = DecodeSession::new();
            match session.feed(Some(&curtain)).unwrap() {
                Feed::Ready(result) => result,
                Feed::Pending => panic!("incomplete"),
            }
        });
    });

    c.bench_function("decode_slice_whole", |b| {
        b.iter(|| decode_in_chunks(&slice, slice.len()).unwrap());
    });
}

fn bench_decode_chunked(c: &mut Criterion) {
    let payload = cube_curtain();
    let mut group = c.benchmark_group("decode_chunked");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for chunk in [16usize, 256, 4096, 65536] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            b.iter(|| decode_in_chunks(&payload, chunk).unwrap());
        });
    }

    group.finish();
}

fn bench_header_only(c: &mut Criterion) {
    let raw = srf_tests::cube_curtain_encoder().raw_header();
    let bytes = raw.to_msgpack().unwrap();

    c.bench_function("header_validate", |b| {
        b.iter(|| Header::from_msgpack(&bytes).unwrap());
    });
}

criterion_group!(benches, bench_decode_whole, bench_decode_chunked, bench_header_only);
criterion_main!(benches);
