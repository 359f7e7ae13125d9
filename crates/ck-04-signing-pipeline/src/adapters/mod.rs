//! Adapters layer for the signing pipeline.

pub mod store;
