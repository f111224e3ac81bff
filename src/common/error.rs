//! Error handling module
//!
//! This module defines the error types and result type aliases used in the
//! application. Configuration mistakes and environment problems are kept in
//! separate classes: the former are always detected before a socket exists,
//! the latter surface during `start()` and are fatal.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// S3 Gateway error type
#[derive(Error, Debug)]
pub enum GatewayError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// OpenSSL error
    #[error("OpenSSL error: {0}")]
    Ssl(#[from] openssl::error::ErrorStack),

    /// TLS handshake error
    #[error("TLS handshake error: {0}")]
    TlsHandshake(String),

    /// Configuration error: bad or incomplete configuration, detected before
    /// any network resource is created
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport error: unusable certificate store or unbindable address,
    /// detected during `start()`
    #[error("Transport error: {0}")]
    Transport(String),

    /// Lifecycle usage error: a state-machine violation such as double-start,
    /// indicating a bug in the supervising code
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `GatewayError`.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let gw_err: GatewayError = io_err.into();

        match gw_err {
            GatewayError::Io(_) => {}
            _ => panic!("Should convert to IO error"),
        }
    }

    #[test]
    fn test_config_error_conversion() {
        let cfg_err = ConfigError::MissingRequiredValue("endpoint".to_string());
        let gw_err: GatewayError = cfg_err.into();

        match gw_err {
            GatewayError::Config(_) => {}
            _ => panic!("Should convert to configuration error"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::Transport("address in use".to_string());
        let err_str = format!("{}", err);
        assert!(err_str.contains("address in use"));
    }
}
