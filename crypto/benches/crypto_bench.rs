use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_crypto::{Ed25519Signer, Ed25519Verifier, Signer, Verifier};
use strata_types::BlockHash;

fn ed25519_sign_bench(c: &mut Criterion) {
    let signer = Ed25519Signer::from_seed(&[7u8; 32]);
    let msg = [42u8; 128];

    c.bench_function("ed25519_sign_128B", |b| {
        b.iter(|| signer.sign(black_box(&msg)))
    });
}

fn ed25519_verify_bench(c: &mut Criterion) {
    let signer = Ed25519Signer::from_seed(&[7u8; 32]);
    let msg = [42u8; 128];
    let sig = signer.sign(&msg).unwrap();
    let public = signer.public_key();

    c.bench_function("ed25519_verify_128B", |b| {
        b.iter(|| Ed25519Verifier.verify(&public, black_box(&msg), &sig))
    });
}

fn blake2b_256_bench(c: &mut Criterion) {
    let data = [0xABu8; 256];

    c.bench_function("blake2b_256_256B", |b| {
        b.iter(|| strata_crypto::blake2b_256(black_box(&data)))
    });
}

fn inputs_hash_bench(c: &mut Criterion) {
    // A full block's worth of input hashes.
    let hashes: Vec<[u8; 32]> = (0..100u8).map(|i| [i; 32]).collect();
    let parts: Vec<&[u8]> = hashes.iter().map(|h| h.as_slice()).collect();

    c.bench_function("blake2b_256_multi_100_inputs", |b| {
        b.iter(|| strata_crypto::blake2b_256_multi(black_box(&parts)))
    });
}

fn hash_block_bench(c: &mut Criterion) {
    let previous = BlockHash::new([0xFF; 32]);
    let inputs = [0x11u8; 32];

    c.bench_function("hash_block", |b| {
        b.iter(|| strata_crypto::hash_block(black_box(&previous), black_box(&inputs)))
    });
}

criterion_group!(
    benches,
    ed25519_sign_bench,
    ed25519_verify_bench,
    blake2b_256_bench,
    inputs_hash_bench,
    hash_block_bench
);
criterion_main!(benches);
