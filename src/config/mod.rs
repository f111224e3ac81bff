//! Configuration module
//!
//! This module defines the configuration data model of the gateway and the
//! machinery around it: parsing endpoint URIs, loading the properties file
//! with its environment overlay, and validating a candidate configuration
//! before any network resource is created.

// Submodules
mod error;
pub mod properties;
pub mod validator;

// Re-export types and functions
pub use error::ConfigError;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::storage::ObjectStore;

/// Endpoint scheme: plain HTTP or TLS-terminated HTTPS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Unencrypted connections
    Http,
    /// TLS handshake before the HTTP layer sees the byte stream
    Https,
}

impl Scheme {
    /// Whether this scheme requires certificate material.
    pub fn is_tls(self) -> bool {
        matches!(self, Self::Https)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

impl FromStr for Scheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            _ => Err(ConfigError::InvalidValue(
                "endpoint scheme".to_string(),
                format!("must be http or https, was: {}", s),
            )),
        }
    }
}

/// Listen endpoint of the gateway, parsed from a URI string.
///
/// A path component is carried through parsing so the validator can reject
/// it with a precise message; the gateway never serves under a URL prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Endpoint scheme
    pub scheme: Scheme,
    /// Host name or address to bind
    pub host: String,
    /// Port to bind; 0 requests an ephemeral port
    pub port: u16,
    /// URI path component; must be empty for a valid configuration
    pub path: String,
}

impl Endpoint {
    /// Parse an endpoint from a URI string such as `http://localhost:8080`.
    ///
    /// Missing ports default to 80/443 per scheme. Port 0 is accepted and
    /// means "assign an ephemeral port at bind time".
    pub fn parse(uri: &str) -> std::result::Result<Self, ConfigError> {
        let url = url::Url::parse(uri)
            .map_err(|e| ConfigError::InvalidEndpoint(uri.to_string(), e.to_string()))?;

        let scheme: Scheme = url.scheme().parse()?;
        let host = url
            .host_str()
            .ok_or_else(|| {
                ConfigError::InvalidEndpoint(uri.to_string(), "missing host".to_string())
            })?
            .to_string();
        let port = url.port_or_known_default().ok_or_else(|| {
            ConfigError::InvalidEndpoint(uri.to_string(), "missing port".to_string())
        })?;

        // The url crate normalizes an absent path to "/".
        let path = match url.path() {
            "/" => String::new(),
            p => p.to_string(),
        };

        Ok(Self {
            scheme,
            host,
            port,
            path,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Gateway-local credential pair.
///
/// Both fields are always present; a partially specified pair is not
/// representable in a frozen configuration. An absent `Credentials` value
/// means the gateway accepts unauthenticated callers.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key identity
    pub identity: String,
    /// Secret key
    pub secret: String,
}

// The secret never appears in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"***")
            .finish()
    }
}

/// Certificate store reference for TLS endpoints.
///
/// The store is a password-protected PKCS#12 file holding the private key
/// and certificate chain. It is loaded during `start()`, not at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    /// Path to the PKCS#12 certificate store
    pub keystore_path: PathBuf,
    /// Password unlocking the certificate store
    pub keystore_password: String,
}

/// Gateway authorization mode, from the `gateway.authorization` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// AWS signature v2 authentication with gateway-local credentials
    AwsV2,
    /// No authentication; every caller is accepted
    None,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwsV2 => write!(f, "aws-v2"),
            Self::None => write!(f, "none"),
        }
    }
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aws-v2" => Ok(Self::AwsV2),
            "none" => Ok(Self::None),
            _ => Err(ConfigError::InvalidValue(
                properties::GATEWAY_AUTHORIZATION.to_string(),
                format!("must be aws-v2 or none, was: {}", s),
            )),
        }
    }
}

/// Immutable configuration aggregate of a gateway instance.
///
/// Built exactly once by [`crate::gateway::GatewayBuilder::build`] after
/// validation, then owned exclusively by the [`crate::gateway::Gateway`]
/// constructed from it.
pub struct GatewayConfig {
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) endpoint: Endpoint,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) tls: Option<TlsMaterial>,
    pub(crate) virtual_host: Option<String>,
}

impl GatewayConfig {
    /// The listen endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Gateway-local credentials, absent for an unauthenticated gateway.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Certificate store reference, present iff the endpoint scheme is https.
    pub fn tls(&self) -> Option<&TlsMaterial> {
        self.tls.as_ref()
    }

    /// Alternate hostname the gateway treats as referring to itself.
    pub fn virtual_host(&self) -> Option<&str> {
        self.virtual_host.as_deref()
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("store", &"Arc<dyn ObjectStore>")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .field("tls", &self.tls)
            .field("virtual_host", &self.virtual_host)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_endpoint() {
        let endpoint = Endpoint::parse("http://localhost:8080").unwrap();
        assert_eq!(endpoint.scheme, Scheme::Http);
        assert_eq!(endpoint.host, "localhost");
        assert_eq!(endpoint.port, 8080);
        assert!(endpoint.path.is_empty());
    }

    #[test]
    fn test_parse_tls_endpoint_with_default_port() {
        let endpoint = Endpoint::parse("https://gateway.example.com").unwrap();
        assert_eq!(endpoint.scheme, Scheme::Https);
        assert_eq!(endpoint.host, "gateway.example.com");
        assert_eq!(endpoint.port, 443);
    }

    #[test]
    fn test_parse_endpoint_keeps_ephemeral_port() {
        let endpoint = Endpoint::parse("http://127.0.0.1:0").unwrap();
        assert_eq!(endpoint.port, 0);
    }

    #[test]
    fn test_parse_endpoint_keeps_path_for_validation() {
        let endpoint = Endpoint::parse("http://localhost:8080/prefix").unwrap();
        assert_eq!(endpoint.path, "/prefix");
    }

    #[test]
    fn test_parse_endpoint_rejects_unknown_scheme() {
        let err = Endpoint::parse("ftp://localhost:21").unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_auth_mode_is_case_insensitive() {
        assert_eq!("AWS-V2".parse::<AuthMode>().unwrap(), AuthMode::AwsV2);
        assert_eq!("None".parse::<AuthMode>().unwrap(), AuthMode::None);
    }

    #[test]
    fn test_auth_mode_error_names_the_value() {
        let err = "aws-v4".parse::<AuthMode>().unwrap_err();
        assert!(err.to_string().contains("aws-v4"));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = Credentials {
            identity: "AKIAEXAMPLE".to_string(),
            secret: "secret123".to_string(),
        };
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("AKIAEXAMPLE"));
        assert!(!rendered.contains("secret123"));
    }
}
