//! Throughput Benchmark for sessiond
//!
//! This benchmark measures the cache store and the packet codec under the
//! workloads the daemon sees: inserts, lookups, sweeps and decoding.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use sessiond::protocol::{parse_packet, Packet, PacketKind, KEY_LEN, MAX_VALUE_LEN};
use sessiond::storage::CacheStore;

const NOW: u64 = 1_700_000_000;

fn key(i: u64) -> Bytes {
    let mut key = [0u8; KEY_LEN];
    key[..8].copy_from_slice(&i.to_be_bytes());
    Bytes::copy_from_slice(&key)
}

fn populated(n: u64, spread: u64) -> CacheStore {
    let mut store = CacheStore::new();
    for i in 0..n {
        store.insert_at(key(i), Bytes::from_static(b"session"), 300 + i % spread, NOW);
    }
    store
}

/// Benchmark NEW
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(1));

    group.bench_function("insert_fresh", |b| {
        let mut store = CacheStore::new();
        let value = Bytes::from(vec![b'x'; 256]);
        let mut i = 0u64;
        b.iter(|| {
            // Keys outlive the run; the cap keeps the store bounded
            store.insert_at(key(i), value.clone(), 300 + i % 600, NOW);
            i += 1;
        });
    });

    group.bench_function("insert_duplicate", |b| {
        let mut store = populated(10_000, 600);
        let mut i = 0u64;
        b.iter(|| {
            black_box(store.insert_at(key(i % 10_000), Bytes::from_static(b"other"), 300, NOW));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET
fn bench_find(c: &mut Criterion) {
    let store = populated(100_000, 600);

    let mut group = c.benchmark_group("find");
    group.throughput(Throughput::Elements(1));

    group.bench_function("find_hit", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(store.find(&key(i % 100_000)));
            i += 1;
        });
    });

    group.bench_function("find_miss", |b| {
        let mut i = 100_000u64;
        b.iter(|| {
            black_box(store.find(&key(i)));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark the maintenance sweep
fn bench_cleanup(c: &mut Criterion) {
    let mut group = c.benchmark_group("cleanup");

    group.bench_function("cleanup_nothing_expired", |b| {
        let mut store = populated(100_000, 600);
        b.iter(|| black_box(store.cleanup(NOW)));
    });

    group.bench_function("cleanup_half_expired", |b| {
        b.iter_batched(
            || populated(20_000, 600),
            |mut store| black_box(store.cleanup(NOW + 600)),
            BatchSize::LargeInput,
        );
    });

    group.bench_function("insert_at_cap", |b| {
        b.iter_batched(
            || {
                let mut store = CacheStore::with_capacity(10_000);
                for i in 0..10_000 {
                    store.insert_at(key(i), Bytes::from_static(b"v"), 300 + i % 600, NOW);
                }
                store
            },
            |mut store| black_box(store.insert_at(key(u64::MAX), Bytes::from_static(b"v"), 1_000, NOW)),
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

/// Benchmark the wire codec
fn bench_codec(c: &mut Criterion) {
    let small = Packet::request(PacketKind::Get, b"session-id", Bytes::new(), 0)
        .unwrap()
        .serialize();
    let full = Packet::request(PacketKind::New, b"session-id", vec![b'x'; MAX_VALUE_LEN], 300)
        .unwrap()
        .serialize();

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Elements(1));

    group.bench_function("parse_header_only", |b| {
        b.iter(|| black_box(parse_packet(black_box(&small)).unwrap()));
    });

    group.bench_function("parse_full_value", |b| {
        b.iter(|| black_box(parse_packet(black_box(&full)).unwrap()));
    });

    let packet = parse_packet(&full).unwrap();
    group.bench_function("serialize_full_value", |b| {
        b.iter(|| black_box(packet.serialize()));
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_find, bench_cleanup, bench_codec);

criterion_main!(benches);
