//! Error types.

/// Errors produced while configuring the client or flushing a context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The configuration text could not be parsed or read.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("configuration section `{0}` not found")]
    MissingSection(String),

    #[error("required configuration key `{0}` is missing")]
    MissingKey(String),

    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },

    /// No sender factory is registered under the requested name.
    #[error("unknown sender backend `{0}`")]
    UnknownBackend(String),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A flush callback failed for a reason of its own.
    #[error("flush callback failed: {0}")]
    Flush(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    /// Wraps an arbitrary error raised by a flush callback.
    pub fn flush(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self::Flush(err.into())
    }

    pub(crate) fn invalid_value(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// A specialized [`Result`](std::result::Result) for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
