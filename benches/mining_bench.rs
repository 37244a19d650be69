//! Mining performance benchmarks
//!
//! Criterion benchmarks for header hashing, proof-of-work checks, compact
//! target conversion and retarget arithmetic.

use consensus_core::block::Block;
use consensus_core::config::Params;
use consensus_core::header::Header;
use consensus_core::Hash;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mining::difficulty::{average_mining_time, retarget, MiningSample};
use mining::prelude::*;
use mining::partition_nonce_space;

fn create_block() -> Block {
    let header = Header::new(4, Hash::zeroed(), Hash::zeroed(), Hash::zeroed(), 1_700_000_000, 0x207fffff, 0);
    Block::new(header, Vec::new())
}

fn bench_pow_hash_computation(c: &mut Criterion) {
    let mut group = c.benchmark_group("pow_hash_computation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("header_hash", |b| {
        let header = black_box(create_block().header);
        b.iter(|| header.hash())
    });

    group.bench_function("double_sha256_512bytes", |b| {
        let data = black_box(&[0u8; 512]);
        b.iter(|| ProofOfWork::compute_hash(data))
    });

    group.finish();
}

fn bench_pow_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("pow_validation");
    let limit = Params::mainnet().pow_limit;

    group.bench_function("is_valid_pow_easy_target", |b| {
        let header = black_box(create_block().header);
        b.iter(|| ProofOfWork::is_valid_pow(&header))
    });

    group.bench_function("check_proof_of_work_mainnet", |b| {
        let hash = black_box(create_block().hash());
        b.iter(|| ProofOfWork::check_proof_of_work(&hash, black_box(0x1d00ffff), limit))
    });

    group.finish();
}

fn bench_mining_job_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("mining_job");

    group.bench_function("create_job", |b| {
        let block = black_box(create_block());
        b.iter(|| MiningJob::new(block.clone()))
    });

    for workers in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::new("partition_nonce_space", workers), &workers, |b, &w| {
            b.iter(|| partition_nonce_space(black_box(w)))
        });
    }

    group.finish();
}

fn bench_target_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("target_operations");

    group.bench_function("target_from_bits", |b| {
        let bits = black_box(0x1d00ffff);
        b.iter(|| Target::from_bits(bits))
    });

    group.bench_function("target_to_bits", |b| {
        let target = black_box(Target::from_bits(0x1b0404cb));
        b.iter(|| target.to_bits())
    });

    group.finish();
}

fn bench_retarget(c: &mut Criterion) {
    let mut group = c.benchmark_group("retarget");
    let limit = Params::mainnet().pow_limit;

    let samples: Vec<MiningSample> = (0..144)
        .map(|i| MiningSample { block_time: 10_000 + i * 60, beat_time: 9_990 + i * 60, prev_block_time: 9_940 + i * 60 })
        .collect();

    group.bench_function("average_mining_time_144", |b| b.iter(|| average_mining_time(black_box(&samples), 60)));
    group.bench_function("retarget", |b| b.iter(|| retarget(black_box(0x1b0404cb), 2400, 600, limit)));

    group.finish();
}

criterion_group!(
    benches,
    bench_pow_hash_computation,
    bench_pow_validation,
    bench_mining_job_creation,
    bench_target_operations,
    bench_retarget
);
criterion_main!(benches);
