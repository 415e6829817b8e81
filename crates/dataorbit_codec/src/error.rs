//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding a dataset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The obfuscation key is empty.
    #[error("obfuscation key must not be empty")]
    EmptyKey,

    /// Failed to serialize the dataset.
    #[error("serialization failed: {message}")]
    SerializeFailed {
        /// Description of the serialization error.
        message: String,
    },

    /// Failed to parse the dataset.
    #[error("deserialization failed: {message}")]
    DeserializeFailed {
        /// Description of the parse error.
        message: String,
    },
}

impl CodecError {
    /// Create a serialization failed error.
    pub fn serialize_failed(message: impl Into<String>) -> Self {
        Self::SerializeFailed {
            message: message.into(),
        }
    }

    /// Create a deserialization failed error.
    pub fn deserialize_failed(message: impl Into<String>) -> Self {
        Self::DeserializeFailed {
            message: message.into(),
        }
    }
}
