//! Configuration errors
//!
//! This module defines error types for the configuration module. All of them
//! represent caller mistakes detected before any socket is opened.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required configuration value
    #[error("Missing required configuration value: {0}")]
    MissingRequiredValue(String),

    /// Invalid value for a configuration option
    #[error("Invalid value for '{0}': {1}")]
    InvalidValue(String, String),

    /// Exactly one half of the identity/credential pair was given
    #[error("Must provide both identity and credential, or neither")]
    PartialCredentials,

    /// Endpoint URI could not be parsed
    #[error("Invalid endpoint '{0}': {1}")]
    InvalidEndpoint(String, String),

    /// Error reading the properties file
    #[error("Error reading properties file {0}: {1}")]
    FileRead(PathBuf, String),

    /// One or more required properties are absent; lists every required key
    #[error("Properties file must contain:\n{0}")]
    MissingProperties(String),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_properties_lists_keys() {
        let err = ConfigError::MissingProperties("a\nb\nc".to_string());
        let rendered = err.to_string();
        assert!(rendered.contains("must contain"));
        assert!(rendered.contains('b'));
    }

    #[test]
    fn test_partial_credentials_display() {
        let rendered = ConfigError::PartialCredentials.to_string();
        assert!(rendered.contains("both identity and credential"));
    }
}
