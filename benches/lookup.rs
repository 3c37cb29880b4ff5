#![allow(unused)]
extern crate pinscope;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use pinscope::{HashValue, PreloadedDatabase};
use std::hint::black_box;

const HOSTS: &[&str] = &[
    "www.google.com",
    "maps.google.com",
    "thehackernews.com",
    "api.twitter.com",
    "a.very.deep.subdomain.of.dropbox.com",
    "unknown.example",
];

/// Benchmark policy lookups in the built-in database
///
/// Mixes exact entries, inherited subdomain policies and misses.
fn bench_lookup(c: &mut Criterion) {
    let db = PreloadedDatabase::builtin();

    let mut group = c.benchmark_group("preload_lookup");
    group.throughput(Throughput::Elements(HOSTS.len() as u64));
    group.bench_function("builtin", |b| {
        b.iter(|| {
            for host in HOSTS {
                black_box(db.lookup(black_box(host)).unwrap());
            }
        });
    });
    group.finish();
}

/// Benchmark parsing the container form of the built-in database
fn bench_container(c: &mut Criterion) {
    let bytes = PreloadedDatabase::builtin().to_bytes();

    let mut group = c.benchmark_group("preload_container");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("from_bytes", |b| {
        b.iter(|| black_box(PreloadedDatabase::from_bytes(black_box(&bytes)).unwrap()));
    });
    group.finish();
}

/// Benchmark matching a hash list against the google pinset
fn bench_match(c: &mut Criterion) {
    let db = PreloadedDatabase::builtin();
    let policy = db.lookup("www.google.com").unwrap().unwrap();
    let hashes = vec![
        HashValue::sha1(b"leaf"),
        HashValue::sha1(b"intermediate"),
        HashValue::sha1(b"root"),
    ];

    c.bench_function("check_pubkey_pins_mismatch", |b| {
        b.iter(|| black_box(db.matcher().check_pubkey_pins(&policy, black_box(&hashes)).unwrap()));
    });
}

criterion_group!(benches, bench_lookup, bench_container, bench_match);
criterion_main!(benches);
