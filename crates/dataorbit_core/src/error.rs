//! Error types for DataOrbit core.

use crate::types::Value;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in DataOrbit core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The configuration or a schema is unusable.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// The table has no schema in the configuration or the store.
    #[error("unknown table: {table}")]
    UnknownTable {
        /// Name of the table.
        table: String,
    },

    /// A value already exists in a unique-constrained column.
    #[error("unique constraint violation on {table}.{column}: {value} already exists")]
    UniqueConstraintViolation {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// The duplicate value.
        value: Value,
    },

    /// A row does not match its table's schema.
    #[error("schema violation on {table}.{column}: {message}")]
    SchemaViolation {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// What is wrong with the value.
        message: String,
    },

    /// Reading or writing the data file failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] dataorbit_storage::StorageError),

    /// Serializing or parsing the dataset failed.
    #[error("codec error: {0}")]
    Codec(#[from] dataorbit_codec::CodecError),
}

impl CoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an unknown table error.
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self::UnknownTable {
            table: table.into(),
        }
    }

    /// Creates a unique constraint violation error.
    pub fn unique_violation(
        table: impl Into<String>,
        column: impl Into<String>,
        value: Value,
    ) -> Self {
        Self::UniqueConstraintViolation {
            table: table.into(),
            column: column.into(),
            value,
        }
    }

    /// Creates a schema violation error.
    pub fn schema_violation(
        table: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SchemaViolation {
            table: table.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    /// Returns true for the errors that leave the store untouched because
    /// the request itself was invalid.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnknownTable { .. }
                | Self::UniqueConstraintViolation { .. }
                | Self::SchemaViolation { .. }
        )
    }

    /// Maps an empty obfuscation key to a configuration error; other codec
    /// errors pass through.
    pub(crate) fn from_key_error(err: dataorbit_codec::CodecError) -> Self {
        match err {
            dataorbit_codec::CodecError::EmptyKey => {
                Self::configuration("obfuscation key must not be empty")
            }
            other => Self::Codec(other),
        }
    }
}
