//! Configuration validator
//!
//! Pure validation over a candidate configuration, run by the builder before
//! the configuration is frozen. No side effects and no network access; every
//! failure is a [`ConfigError`].

use crate::config::error::{ConfigError, Result};
use crate::config::{Endpoint, TlsMaterial};

/// Validate a complete candidate configuration.
///
/// `has_store` reports whether the opaque backend store handle was supplied;
/// the handle itself carries nothing to validate.
pub fn validate(
    has_store: bool,
    endpoint: Option<&Endpoint>,
    identity: Option<&str>,
    secret: Option<&str>,
    tls: Option<&TlsMaterial>,
) -> Result<()> {
    if !has_store {
        return Err(ConfigError::MissingRequiredValue(
            "backend store".to_string(),
        ));
    }

    let endpoint = endpoint
        .ok_or_else(|| ConfigError::MissingRequiredValue("endpoint".to_string()))?;

    validate_endpoint(endpoint)?;
    validate_credentials(identity, secret)?;
    validate_tls(endpoint, tls)?;

    Ok(())
}

/// Validate endpoint settings
///
/// The gateway does not support mounting under a URL prefix, so the endpoint
/// path must be empty.
pub fn validate_endpoint(endpoint: &Endpoint) -> Result<()> {
    if !endpoint.path.is_empty() {
        return Err(ConfigError::InvalidValue(
            "endpoint".to_string(),
            format!("endpoint path must be empty, was: {}", endpoint.path),
        ));
    }

    Ok(())
}

/// Validate credential settings
///
/// Identity and secret must be given together or not at all; a partial pair
/// is a configuration error, not an unauthenticated gateway.
pub fn validate_credentials(identity: Option<&str>, secret: Option<&str>) -> Result<()> {
    if identity.is_some() != secret.is_some() {
        return Err(ConfigError::PartialCredentials);
    }

    Ok(())
}

/// Validate certificate settings
///
/// An https endpoint requires a certificate store path and password. For a
/// plain endpoint any supplied material is simply ignored by the transport.
pub fn validate_tls(endpoint: &Endpoint, tls: Option<&TlsMaterial>) -> Result<()> {
    if endpoint.scheme.is_tls() {
        let tls = tls.ok_or_else(|| {
            ConfigError::MissingRequiredValue(
                "certificate store path and password (required for an https endpoint)"
                    .to_string(),
            )
        })?;
        if tls.keystore_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequiredValue(
                "certificate store path".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scheme;
    use std::path::PathBuf;

    fn endpoint(uri: &str) -> Endpoint {
        Endpoint::parse(uri).unwrap()
    }

    fn material() -> TlsMaterial {
        TlsMaterial {
            keystore_path: PathBuf::from("gateway.p12"),
            keystore_password: "changeit".to_string(),
        }
    }

    #[test]
    fn test_rejects_missing_store() {
        let err = validate(false, Some(&endpoint("http://localhost:80")), None, None, None)
            .unwrap_err();
        assert!(err.to_string().contains("backend store"));
    }

    #[test]
    fn test_rejects_missing_endpoint() {
        let err = validate(true, None, None, None, None).unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn test_rejects_endpoint_path() {
        let err = validate_endpoint(&endpoint("http://localhost:80/api")).unwrap_err();
        assert!(err.to_string().contains("path must be empty"));
        assert!(err.to_string().contains("/api"));
    }

    #[test]
    fn test_accepts_empty_endpoint_path() {
        validate_endpoint(&endpoint("http://localhost:80")).unwrap();
        validate_endpoint(&endpoint("http://localhost:80/")).unwrap();
    }

    #[test]
    fn test_rejects_partial_credentials() {
        assert!(matches!(
            validate_credentials(Some("AKIAEXAMPLE"), None),
            Err(ConfigError::PartialCredentials)
        ));
        assert!(matches!(
            validate_credentials(None, Some("secret123")),
            Err(ConfigError::PartialCredentials)
        ));
    }

    #[test]
    fn test_accepts_both_or_neither_credentials() {
        validate_credentials(None, None).unwrap();
        validate_credentials(Some("AKIAEXAMPLE"), Some("secret123")).unwrap();
    }

    #[test]
    fn test_https_requires_tls_material() {
        let https = endpoint("https://localhost:8443");
        assert_eq!(https.scheme, Scheme::Https);

        let err = validate_tls(&https, None).unwrap_err();
        assert!(err.to_string().contains("certificate store"));

        validate_tls(&https, Some(&material())).unwrap();
    }

    #[test]
    fn test_plain_endpoint_ignores_tls_material() {
        let http = endpoint("http://localhost:8080");
        validate_tls(&http, Some(&material())).unwrap();
    }

    #[test]
    fn test_full_candidate_passes() {
        validate(
            true,
            Some(&endpoint("https://localhost:8443")),
            Some("AKIAEXAMPLE"),
            Some("secret123"),
            Some(&material()),
        )
        .unwrap();
    }
}
