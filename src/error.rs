use std::error::Error;

/// Errors surfaced by a [`LogSink`](crate::sink::LogSink).
///
/// The OpenTelemetry decorator never constructs one of these itself; it
/// hands back whatever the inner sink returned.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// An [`ObjectMarshaler`](crate::field::ObjectMarshaler) refused to encode itself.
    #[error("marshal {key}: {reason}")]
    Marshal { key: String, reason: String },

    /// Opaque failure from a custom sink.
    #[error("sink error: {0}")]
    Sink(Box<dyn Error + Send + Sync>),
}

impl CoreError {
    pub fn marshal(key: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::Marshal { key: key.into(), reason: reason.into() }
    }
}
