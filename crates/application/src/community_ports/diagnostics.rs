use agora_core::AppError;

/// Structured diagnostic emitted by the resolution services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// A store read failed and was recovered to the safe default.
    FetchFailed {
        /// Store operation that failed.
        operation: &'static str,
        /// Key the read was issued for.
        key: String,
        /// Underlying error.
        error: AppError,
    },
    /// A follow toggle failed and the cached state was kept.
    ToggleFailed {
        /// Pair the toggle was issued for.
        key: String,
        /// Underlying error.
        error: AppError,
    },
    /// A completion arrived for a key that is no longer observed.
    StaleResponseDiscarded {
        /// Store operation whose result was dropped.
        operation: &'static str,
        /// Key the read was issued for.
        key: String,
    },
    /// The store answered with a value outside the known markers.
    UnrecognizedStoreValue {
        /// Store operation that produced the value.
        operation: &'static str,
        /// Key the read was issued for.
        key: String,
        /// Raw value received.
        value: String,
    },
}

impl DiagnosticEvent {
    /// Returns a stable name for this event kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FetchFailed { .. } => "fetch_failed",
            Self::ToggleFailed { .. } => "toggle_failed",
            Self::StaleResponseDiscarded { .. } => "stale_response_discarded",
            Self::UnrecognizedStoreValue { .. } => "unrecognized_store_value",
        }
    }
}

/// Injected sink for structured diagnostics.
pub trait Diagnostics: Send + Sync {
    /// Records one diagnostic event.
    fn record(&self, event: DiagnosticEvent);
}
