//! Error types for FireRating core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while mapping entities to transfer records.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The host entity has no numeric value for the attribute reference.
    #[error("entity {entity_id} has no numeric attribute {attribute}")]
    AttributeMissing {
        /// Stable id of the host entity.
        entity_id: String,
        /// The attribute that could not be resolved.
        attribute: String,
    },

    /// The attribute value cannot be encoded as a JSON number.
    #[error("entity {entity_id} has non-finite fire rating {value}")]
    NonFiniteValue {
        /// Stable id of the host entity.
        entity_id: String,
        /// The offending value.
        value: f64,
    },

    /// A document does not match the transfer record shape.
    #[error("invalid document: {message}")]
    InvalidDocument {
        /// Description of the mismatch.
        message: String,
    },

    /// Project identity could not be derived.
    #[error("identity derivation failed: {0}")]
    IdentityDerivation(String),

    /// The host has no entity with this id.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// The host does not support writing patches back.
    #[error("host does not support write-back")]
    PatchUnsupported,
}

impl CoreError {
    /// Create an invalid document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}
