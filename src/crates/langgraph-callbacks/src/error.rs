//! Error types for callback activation
//!
//! Lookups never fail, so the error surface is small: installing outside an
//! ambient context, bad configuration, and exporter failures.

use thiserror::Error;

/// Result type for callback operations
pub type Result<T> = std::result::Result<T, CallbackError>;

/// Errors that can occur while activating or configuring observers
#[derive(Error, Debug)]
pub enum CallbackError {
    /// A manual install was attempted with no ambient context to install into
    #[error("No ambient context is active for observer kind '{kind}'")]
    NoAmbientContext {
        /// Name of the observer kind
        kind: &'static str,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Trace export error
    #[error("Export error: {0}")]
    Export(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CallbackError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an export error
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CallbackError::NoAmbientContext { kind: "usage" };
        assert_eq!(
            err.to_string(),
            "No ambient context is active for observer kind 'usage'"
        );

        let err = CallbackError::config("bad flag");
        assert_eq!(err.to_string(), "Configuration error: bad flag");
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CallbackError = json_err.into();
        assert!(matches!(err, CallbackError::Serialization(_)));
    }
}
