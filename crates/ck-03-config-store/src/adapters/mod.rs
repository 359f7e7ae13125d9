//! Storage backends and the persistence adapter.

pub mod file_storage;
pub mod persistence;
