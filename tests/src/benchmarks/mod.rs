//! # Connect-Kit Benchmarks
//!
//! Criterion groups for the hashing paths every transaction goes through.

pub mod crypto;
