//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding an identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input is not valid URL-safe Base64.
    #[error("invalid url-safe base64: {message}")]
    InvalidEncoding {
        /// Description of the decoding error.
        message: String,
    },

    /// Decoded bytes are not valid UTF-8 text.
    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,
}

impl CodecError {
    /// Create an invalid encoding error.
    pub fn invalid_encoding(message: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            message: message.into(),
        }
    }
}
