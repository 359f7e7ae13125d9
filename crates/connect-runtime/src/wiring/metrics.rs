//! Store and pipeline hooks feeding the Prometheus metrics.

use ck_03_config_store::ConfigStore;
use ck_04_signing_pipeline::{BroadcastOutcome, PipelineError};
use connect_telemetry::{
    metric_inc, ACTIVE_CONNECTIONS, BROADCASTS, FOLDED_EVENTS, SEQUENCE_FALLBACKS, SIGN_FAILURES,
};

/// Track folded events and the live connection count.
pub fn attach_store_metrics(store: &ConfigStore) {
    store.on_event(|_uid, kind, outcome| {
        metric_inc!(FOLDED_EVENTS, &[kind.as_str(), outcome.as_str()]);
    });

    ACTIVE_CONNECTIONS.set(store.state().connections.len() as f64);
    store.subscribe(|current, _previous| {
        ACTIVE_CONNECTIONS.set(current.connections.len() as f64);
    });
}

/// Label for a finished `sign_and_broadcast` call.
pub fn broadcast_outcome(result: &Result<BroadcastOutcome, PipelineError>) -> &'static str {
    match result {
        Ok(_) => "accepted",
        Err(PipelineError::Broadcast { .. }) => "rejected",
        Err(_) => "failed",
    }
}

pub fn record_broadcast(result: &Result<BroadcastOutcome, PipelineError>) {
    metric_inc!(BROADCASTS, &[broadcast_outcome(result)]);
    match result {
        Ok(outcome) if outcome.sequence_fallback => metric_inc!(SEQUENCE_FALLBACKS),
        Err(PipelineError::Connector(_)) => metric_inc!(SIGN_FAILURES),
        _ => {}
    }
}
