//! Concrete transport adapters.

pub mod http;
