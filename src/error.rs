//! Error types for squery-sql

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a translation.
///
/// Everything recoverable (unresolved navigation properties, unknown
/// columns, oversized values) is reported as a warning on the translation
/// result instead; see [`crate::diagnostics::Diagnostics`].
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("Failed to parse URL: {url}")]
    UrlParseError {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URL has no QueryRootEntityType parameter and no usable path segment: {url}")]
    MissingRootEntity { url: String },

    #[error("SQuery parse error at position {position}: {message}")]
    ParseError { position: usize, message: String },

    #[error("{message}")]
    ValidationError { message: String },

    #[error("Entity '{entity}' is not mapped to any SQL table")]
    UnknownEntity { entity: String },

    #[error("Failed to read registry config: {path}")]
    RegistryReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse registry config: {path}")]
    RegistryParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid registry config: {message}")]
    InvalidRegistry { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl TranslateError {
    /// Fatal validation failure with a user-facing message.
    pub fn validation(message: impl Into<String>) -> Self {
        TranslateError::ValidationError {
            message: message.into(),
        }
    }

    /// Broken pipeline invariant. These indicate a bug in the translator,
    /// not in the caller's query, and are never silently swallowed.
    pub fn internal(message: impl Into<String>) -> Self {
        TranslateError::Internal {
            message: message.into(),
        }
    }
}
