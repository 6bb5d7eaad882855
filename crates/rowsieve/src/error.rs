//! Error types for the rowsieve crate.

use thiserror::Error;

/// Boxed error raised by a row source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by property access, filter construction and row sources.
#[derive(Debug, Error)]
pub enum SieveError {
    /// No accessor resolves the named segment on the row type.
    #[error("property '{segment}' not found on {type_name} (path '{path}')")]
    PropertyNotFound {
        type_name: &'static str,
        path: String,
        segment: String,
    },

    /// A written value does not fit the declared property type.
    #[error("type mismatch on '{path}': expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Invalid regular expression pattern.
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Configuration or filter definition could not be read.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The row source failed; the error is passed through untouched.
    #[error("row source failed: {0}")]
    Source(#[source] BoxError),
}

impl SieveError {
    /// Wraps a row-source failure.
    pub fn from_source(err: impl Into<BoxError>) -> Self {
        SieveError::Source(err.into())
    }

    /// Returns `true` for [`SieveError::PropertyNotFound`].
    pub fn is_property_not_found(&self) -> bool {
        matches!(self, SieveError::PropertyNotFound { .. })
    }

    /// Returns `true` for [`SieveError::TypeMismatch`].
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, SieveError::TypeMismatch { .. })
    }
}

impl From<serde_json::Error> for SieveError {
    fn from(err: serde_json::Error) -> Self {
        SieveError::InvalidConfig(err.to_string())
    }
}

impl From<serde_yaml::Error> for SieveError {
    fn from(err: serde_yaml::Error) -> Self {
        SieveError::InvalidConfig(err.to_string())
    }
}

/// Result type for rowsieve operations.
pub type Result<T> = std::result::Result<T, SieveError>;
