//! Structured log helpers.
//!
//! Every entry written through these macros carries a `component` field
//! (`store`, `pipeline`, `connector`, `cli`) so logs can be filtered per
//! subsystem.

/// Log with a `component` field.
///
/// ```rust,ignore
/// log_event!(info, "pipeline", "Broadcast accepted", hash = %hash);
/// ```
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a transaction event with the tx hash attached.
#[macro_export]
macro_rules! log_tx_event {
    ($level:ident, $component:expr, $msg:expr, $tx_hash:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            tx_hash = %$tx_hash,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_macros_expand_without_subscriber() {
        let hash = "ABCD";
        log_event!(info, "store", "Connection established", uid = "u1");
        log_event!(warn, "pipeline", "Sequence lookup failed");
        log_tx_event!(info, "pipeline", "Broadcast accepted", hash, code = 0);
    }
}
