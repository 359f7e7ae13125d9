//! # Hashing and Derivation Benchmarks
//!
//! - Address derivation and account salts (run per account prediction)
//! - Sign bytes over growing message batches (run per transaction)
//! - EIP-712 typed-data hash (run per browser-wallet signature)

use std::time::Duration;

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use shared_crypto::{derive_address, key_hash_from_public_key, new_user_salt, sign_bytes, TxTypedData};
use shared_types::{AccountType, Addr, ChainId, Coins, Hash256, Message};

fn transfers(count: usize) -> Vec<Message> {
    (0..count)
        .map(|i| Message::transfer(Addr([i as u8; 20]), Coins::one("uusdc", i as u128 + 1)))
        .collect()
}

pub fn bench_address_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("crypto/address");
    group.measurement_time(Duration::from_secs(5));

    let factory = Addr([0xfa; 20]);
    let code_hash = Hash256([0xc0; 32]);
    let key_hash = key_hash_from_public_key(&[0x02; 33]);

    group.bench_function("new_user_salt", |b| {
        b.iter(|| black_box(new_user_salt(black_box("alice"), &key_hash, AccountType::Spot)))
    });

    let salt = new_user_salt("alice", &key_hash, AccountType::Spot).unwrap_or_default();
    group.bench_function("derive_address", |b| {
        b.iter(|| black_box(derive_address(&factory, &code_hash, black_box(&salt))))
    });

    group.bench_function("key_hash_from_public_key", |b| {
        b.iter(|| black_box(key_hash_from_public_key(black_box(&[0x03; 33]))))
    });

    group.finish();
}

pub fn bench_sign_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("crypto/sign_bytes");
    group.measurement_time(Duration::from_secs(5));

    let sender = Addr([0x10; 20]);
    let chain_id = ChainId::new("dev-1");

    for count in [1usize, 10, 100] {
        let msgs = transfers(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("transfers", count), &msgs, |b, msgs| {
            b.iter(|| black_box(sign_bytes(msgs, &sender, &chain_id, 7)))
        });
    }

    group.finish();
}

pub fn bench_typed_data_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("crypto/eip712");

    let typed = TxTypedData::new("connect-kit", Addr([0x10; 20]), ChainId::new("dev-1"), 7, &Hash256([0x42; 32]));
    group.bench_function("tx_typed_data_hash", |b| b.iter(|| black_box(typed.hash())));

    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    bench_address_derivation(c);
    bench_sign_bytes(c);
    bench_typed_data_hash(c);
}
