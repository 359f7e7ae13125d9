//! # Connect-Kit Benchmarks
//!
//! | Group | Path |
//! |-------|------|
//! | `crypto/address` | account salt and address prediction |
//! | `crypto/sign_bytes` | sign bytes per transaction |
//! | `crypto/eip712` | typed-data hash signed by browser wallets |

use criterion::{criterion_group, criterion_main, Criterion};

fn crypto_benchmarks(c: &mut Criterion) {
    ck_tests::benchmarks::crypto::register_benchmarks(c);
}

criterion_group!(benches, crypto_benchmarks);
criterion_main!(benches);
