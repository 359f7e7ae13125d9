//! # Integration Flows
//!
//! Connectors, store, pipeline and runtime exercised together against
//! in-process mock chains.

pub mod fixtures;

mod connect_flow;
mod persistence_flow;
mod signing_flow;
