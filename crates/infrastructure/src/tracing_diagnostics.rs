//! Diagnostics sink that forwards service events to `tracing`.

use agora_application::{DiagnosticEvent, Diagnostics};
use tracing::{debug, warn};

/// Diagnostics adapter emitting one structured `tracing` event per record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl TracingDiagnostics {
    /// Creates a new tracing diagnostics sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        let kind = event.kind();
        match event {
            DiagnosticEvent::FetchFailed {
                operation,
                key,
                error,
            } => warn!(
                kind,
                operation,
                key = %key,
                error = %error,
                "store read failed, using default"
            ),
            DiagnosticEvent::ToggleFailed { key, error } => warn!(
                kind,
                key = %key,
                error = %error,
                "follow toggle failed"
            ),
            DiagnosticEvent::StaleResponseDiscarded { operation, key } => debug!(
                kind,
                operation,
                key = %key,
                "discarded response for superseded key"
            ),
            DiagnosticEvent::UnrecognizedStoreValue {
                operation,
                key,
                value,
            } => warn!(
                kind,
                operation,
                key = %key,
                value = %value,
                "store returned an unrecognized value"
            ),
        }
    }
}
