//! Error types for FQDN fact resolution
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for fact-resolution operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for handler registration and fact resolution
#[derive(Error, Debug)]
pub enum Error {
    /// Builder-time misuse (empty order, bad pattern source, unknown converter shape)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `copy_from` named a handler that is not registered
    #[error("Handler not found: {0}")]
    HandlerNotFound(String),

    /// No registered handler accepts the FQDN
    #[error("Unable to find a handler for FQDN: {0}")]
    UnresolvableHandler(String),

    /// Dynamic facts were still pending when the pass cap was reached
    #[error("Unresolvable fact dependency after {passes} passes: {}", pending.join(", "))]
    UnresolvableDependency {
        /// Number of passes performed
        passes: usize,
        /// Facts still holding a function
        pending: Vec<String>,
    },

    /// A function read a binding that is still pending
    ///
    /// During fixed-point resolution this defers the calling fact to the
    /// next pass; it only reaches callers from converters, which run before
    /// dynamic facts are resolved.
    #[error("Binding '{0}' is still pending")]
    PendingBinding(String),

    /// A static coercion could not be applied to a raw value
    #[error("Conversion of '{key}' failed: {message}")]
    Conversion {
        /// Fact key being converted
        key: String,
        /// Error message
        message: String,
    },

    /// Error raised from inside a fact or converter function
    #[error("Fact '{name}' failed: {message}")]
    Fact {
        /// Fact name
        name: String,
        /// Error message
        message: String,
    },

    /// Reading a configuration file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid configuration error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a "handler not found" error
    pub fn handler_not_found(name: impl Into<String>) -> Self {
        Self::HandlerNotFound(name.into())
    }

    /// Create an unresolvable handler error
    pub fn unresolvable_handler(fqdn: impl Into<String>) -> Self {
        Self::UnresolvableHandler(fqdn.into())
    }

    /// Create a conversion error
    pub fn conversion(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an error from inside a fact function
    pub fn fact(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fact {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Self::InvalidConfiguration(format!("invalid pattern: {}", err))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_error_lists_pending_facts() {
        let err = Error::UnresolvableDependency {
            passes: 4,
            pending: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unresolvable fact dependency after 4 passes: a, b"
        );
    }

    #[test]
    fn test_regex_error_is_invalid_configuration() {
        let err: Error = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }
}
