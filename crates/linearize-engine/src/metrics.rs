//! Metrics/tracing hooks.
//!
//! This module purposefully avoids pulling a telemetry stack. The CLI installs
//! a subscriber; libraries only emit events.

#[cfg(feature = "tracing")]
pub fn emit_span(event: &str, key_values: &[(&str, String)]) {
    let span = tracing::span!(tracing::Level::DEBUG, "linearize", event);
    let _enter = span.enter();
    for (k, v) in key_values {
        tracing::debug!(%event, %k, %v, "metric");
    }
}

#[cfg(not(feature = "tracing"))]
pub fn emit_span(_event: &str, _key_values: &[(&str, String)]) { /* no-op */
}
