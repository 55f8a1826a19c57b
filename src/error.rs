//! Error types for flow-pager
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// Boxed error raised by a collection backend
pub type CollectionSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for flow-pager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Token Errors
    // ============================================================================
    #[error("Invalid page token: {message}")]
    InvalidToken { message: String },

    // ============================================================================
    // Navigation Signals
    // ============================================================================
    #[error("End of sequence: the last page has been exceeded")]
    EndOfSequence,

    #[error("Start of sequence: the first page has been reached")]
    StartOfSequence,

    // ============================================================================
    // Collection Errors
    // ============================================================================
    #[error(transparent)]
    Collection(CollectionSource),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid token error
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Wrap an error raised by the underlying collection
    pub fn collection<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Collection(Box::new(error))
    }

    /// Check if this error only signals that navigation went past a bound
    ///
    /// Callers should stop advancing rather than report a failure.
    pub fn is_boundary(&self) -> bool {
        matches!(self, Error::EndOfSequence | Error::StartOfSequence)
    }

    /// Check if the caller should discard its token and restart at the first page
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Error::InvalidToken { .. })
    }

    /// Borrow the collection error, if this is one
    pub fn collection_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Collection(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias for flow-pager
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("disk on fire")]
    struct StoreFailure;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::invalid_token("Missing \"key\"");
        assert_eq!(err.to_string(), "Invalid page token: Missing \"key\"");

        let err = Error::collection(StoreFailure);
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn test_is_boundary() {
        assert!(Error::EndOfSequence.is_boundary());
        assert!(Error::StartOfSequence.is_boundary());

        assert!(!Error::config("test").is_boundary());
        assert!(!Error::invalid_token("test").is_boundary());
        assert!(!Error::collection(StoreFailure).is_boundary());
    }

    #[test]
    fn test_io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "IO error: gone");
    }

    #[test]
    fn test_is_invalid_token() {
        assert!(Error::invalid_token("test").is_invalid_token());
        assert!(!Error::EndOfSequence.is_invalid_token());
    }

    #[test]
    fn test_collection_source_is_preserved() {
        let err = Error::collection(StoreFailure);
        let source = err.collection_source().unwrap();
        assert!(source.downcast_ref::<StoreFailure>().is_some());

        assert!(Error::StartOfSequence.collection_source().is_none());
    }
}
