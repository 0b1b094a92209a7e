//! Encoding and signing throughput
//!
//! Benchmarks:
//! - Borsh encoding of a signed transaction by action count
//! - Transaction hash + Ed25519 / Secp256k1 signature
//! - Builder plan through `sign_with`
//! - NEP-413 message signing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use near_submit::keys::{KeyPair, KeyType};
use near_submit::nep413::{sign_message, SignMessageParams};
use near_submit::tx_builder::{Action, Transaction, TransactionBuilder};
use near_submit::types::{AccountId, CryptoHash, Gas, NearToken};

fn account(id: &str) -> AccountId {
    id.parse().unwrap()
}

fn transaction(key: &KeyPair, actions: usize) -> Transaction {
    let actions = (0..actions)
        .map(|i| {
            Action::function_call(
                format!("method_{}", i),
                br#"{"amount":"1000"}"#.to_vec(),
                Gas::DEFAULT_CALL,
                NearToken::from_yocto(1),
            )
        })
        .collect();
    Transaction::new(
        account("alice.near"),
        key.public_key().clone(),
        42,
        account("contract.near"),
        CryptoHash::hash(b"block"),
        actions,
    )
}

fn bench_encode(c: &mut Criterion) {
    let key = KeyPair::from_ed25519_seed(&[7u8; 32]);
    let mut group = c.benchmark_group("encode_signed_tx");

    for actions in [1usize, 10, 100] {
        let signed = transaction(&key, actions).sign(&key).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(actions), &signed, |b, signed| {
            b.iter(|| black_box(signed.to_bytes().unwrap()))
        });
    }
    group.finish();
}

fn bench_sign(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_and_sign");

    for key_type in [KeyType::Ed25519, KeyType::Secp256k1] {
        let key = KeyPair::generate(key_type);
        let tx = transaction(&key, 3);
        group.bench_function(BenchmarkId::from_parameter(key_type), |b| {
            b.iter(|| black_box(tx.clone().sign(&key).unwrap()))
        });
    }
    group.finish();
}

fn bench_builder(c: &mut Criterion) {
    let key = KeyPair::from_ed25519_seed(&[9u8; 32]);
    let block_hash = CryptoHash::hash(b"block");

    c.bench_function("builder_transfer_sign_with", |b| {
        b.iter(|| {
            let output = TransactionBuilder::new(account("alice.near"), account("bob.near"))
                .transfer("1.5 NEAR")
                .sign_with(&key, black_box(7), block_hash)
                .unwrap();
            black_box(output.to_base64())
        })
    });
}

fn bench_nep413(c: &mut Criterion) {
    let key = KeyPair::from_ed25519_seed(&[3u8; 32]);
    let params = SignMessageParams::new("Sign in to app.near", "app.near");
    let alice = account("alice.near");

    c.bench_function("nep413_sign_message", |b| {
        b.iter(|| black_box(sign_message(&key, &alice, &params).unwrap()))
    });
}

criterion_group!(benches, bench_encode, bench_sign, bench_builder, bench_nep413);
criterion_main!(benches);
