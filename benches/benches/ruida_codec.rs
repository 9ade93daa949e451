//! Benchmark suite for the Ruida job encoder and stream decoder.
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ruida_benches::{sizes, synthetic_document};
use ruida_types::{decode, encode, unscramble_bytes, DecodeOptions, EncodeOptions};
use std::hint::black_box;

fn bench_encode(c: &mut Criterion) {
	let mut group = c.benchmark_group("ruida_encode");

	for &segments in &[sizes::TINY, sizes::SMALL, sizes::MEDIUM, sizes::LARGE] {
		let doc = synthetic_document(segments);
		group.throughput(Throughput::Elements(segments as u64));
		group.bench_with_input(BenchmarkId::new("encode", segments), &doc, |b, doc| {
			b.iter(|| black_box(encode(black_box(doc), EncodeOptions::default()).unwrap()));
		});
	}

	group.finish();
}

fn bench_decode(c: &mut Criterion) {
	let mut group = c.benchmark_group("ruida_decode");

	for &segments in &[sizes::TINY, sizes::SMALL, sizes::MEDIUM, sizes::LARGE] {
		let doc = synthetic_document(segments);
		let job = encode(&doc, EncodeOptions::default()).unwrap();
		let unscrambled = unscramble_bytes(&job);

		group.throughput(Throughput::Bytes(unscrambled.len() as u64));
		group.bench_with_input(BenchmarkId::new("decode", segments), &unscrambled, |b, buf| {
			b.iter(|| black_box(decode(black_box(buf), DecodeOptions::default()).unwrap()));
		});
	}

	group.finish();
}

fn bench_roundtrip(c: &mut Criterion) {
	let mut group = c.benchmark_group("ruida_roundtrip");

	let doc = synthetic_document(sizes::MEDIUM);
	group.bench_function("encode_then_decode", |b| {
		b.iter(|| {
			let job = encode(black_box(&doc), EncodeOptions::default()).unwrap();
			let unscrambled = unscramble_bytes(&job);
			black_box(decode(&unscrambled, DecodeOptions::default()).unwrap())
		});
	});

	group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_roundtrip);
criterion_main!(benches);
