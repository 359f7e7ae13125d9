//! # Connect-Kit Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion benchmark groups
//! │   └── crypto.rs     # address derivation, salts, sign bytes
//! │
//! └── integration/      # Cross-crate flows through ConnectKit
//!     ├── fixtures.rs   # mock chains, wallets, kit builder
//!     ├── connect_flow.rs
//!     ├── signing_flow.rs
//!     └── persistence_flow.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ck-tests
//!
//! # By category
//! cargo test -p ck-tests integration::
//!
//! # Benchmarks
//! cargo bench -p ck-tests
//! ```

#![allow(dead_code)]

pub mod benchmarks;
pub mod integration;
