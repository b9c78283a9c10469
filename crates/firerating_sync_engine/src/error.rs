//! Error types for the sync engine.

use firerating_core::CoreError;
use std::fmt;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message, including the underlying cause.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The request exceeded the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Server answered with a non-success status.
    #[error("server returned status {status}: {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Response body is not a valid document.
    #[error("invalid response: {0}")]
    ResponseFormat(String),

    /// Mapping or identity error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid gateway configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Request the gateway refuses to send.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Sync was cancelled.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Timeout(_) => true,
            SyncError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns the taxonomy tag reported in per-entity results.
    pub fn kind(&self) -> FailureKind {
        match self {
            SyncError::Transport { .. } | SyncError::Timeout(_) => FailureKind::Transport,
            SyncError::ResponseFormat(_) => FailureKind::ResponseFormat,
            SyncError::Cancelled => FailureKind::Cancelled,
            SyncError::Server { .. }
            | SyncError::Configuration(_)
            | SyncError::InvalidRequest(_) => FailureKind::Rejected,
            SyncError::Core(core) => match core {
                CoreError::AttributeMissing { .. } => FailureKind::AttributeMissing,
                CoreError::NonFiniteValue { .. } => FailureKind::InvalidValue,
                CoreError::InvalidDocument { .. } => FailureKind::ResponseFormat,
                CoreError::IdentityDerivation(_) => FailureKind::IdentityDerivation,
                CoreError::UnknownEntity(_) | CoreError::PatchUnsupported => FailureKind::Host,
            },
        }
    }
}

/// Failure category of a single entity's sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Connection, DNS or timeout failure.
    Transport,
    /// Response was not a valid document.
    ResponseFormat,
    /// The entity lacks the synchronized attribute.
    AttributeMissing,
    /// The attribute value cannot be sent.
    InvalidValue,
    /// Project identity could not be derived.
    IdentityDerivation,
    /// The server or gateway refused the request.
    Rejected,
    /// Host adapter failure.
    Host,
    /// Cancelled before completion.
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Transport => "TransportError",
            FailureKind::ResponseFormat => "ResponseFormatError",
            FailureKind::AttributeMissing => "AttributeMissingError",
            FailureKind::InvalidValue => "InvalidValueError",
            FailureKind::IdentityDerivation => "IdentityDerivationError",
            FailureKind::Rejected => "RejectedError",
            FailureKind::Host => "HostError",
            FailureKind::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}
