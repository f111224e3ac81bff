//! Gateway configuration builder
//!
//! A mutable accumulator with fallible per-field setters. Each setter
//! rejects an absent or empty required argument immediately; `build()` runs
//! the full validator and freezes the configuration. Nothing here touches
//! the network — a failed build never leaks a half-open socket.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{
    validator, ConfigError, Credentials, Endpoint, GatewayConfig, TlsMaterial,
};
use crate::gateway::server::Gateway;
use crate::storage::ObjectStore;

/// Accumulates gateway configuration prior to validation.
#[derive(Default)]
pub struct GatewayBuilder {
    store: Option<Arc<dyn ObjectStore>>,
    endpoint: Option<Endpoint>,
    identity: Option<String>,
    secret: Option<String>,
    tls: Option<TlsMaterial>,
    virtual_host: Option<String>,
}

impl GatewayBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend object store the handler will operate against.
    pub fn store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the listen endpoint from a URI string.
    pub fn endpoint(mut self, endpoint: &str) -> Result<Self, ConfigError> {
        self.endpoint = Some(endpoint.parse()?);
        Ok(self)
    }

    /// Require AWS-style authentication with the given credential pair.
    ///
    /// Both halves must be non-empty; a partial pair is rejected here rather
    /// than at build time.
    pub fn aws_authentication(
        mut self,
        identity: &str,
        credential: &str,
    ) -> Result<Self, ConfigError> {
        if identity.is_empty() || credential.is_empty() {
            return Err(ConfigError::PartialCredentials);
        }
        self.identity = Some(identity.to_string());
        self.secret = Some(credential.to_string());
        Ok(self)
    }

    /// Set the certificate store used to terminate TLS.
    pub fn keystore(
        mut self,
        path: impl Into<PathBuf>,
        password: &str,
    ) -> Result<Self, ConfigError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequiredValue(
                "certificate store path".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(ConfigError::MissingRequiredValue(
                "certificate store password".to_string(),
            ));
        }
        self.tls = Some(TlsMaterial {
            keystore_path: path,
            keystore_password: password.to_string(),
        });
        Ok(self)
    }

    /// Set the alternate hostname the gateway recognizes as itself.
    pub fn virtual_host(mut self, virtual_host: &str) -> Result<Self, ConfigError> {
        if virtual_host.is_empty() {
            return Err(ConfigError::MissingRequiredValue(
                "virtual host".to_string(),
            ));
        }
        self.virtual_host = Some(virtual_host.to_string());
        Ok(self)
    }

    /// Validate the accumulated settings and freeze them into a [`Gateway`].
    ///
    /// No listener or TLS state is created here; `Gateway::start()` performs
    /// the actual resource acquisition.
    pub fn build(self) -> Result<Gateway, ConfigError> {
        validator::validate(
            self.store.is_some(),
            self.endpoint.as_ref(),
            self.identity.as_deref(),
            self.secret.as_deref(),
            self.tls.as_ref(),
        )?;

        let store = self
            .store
            .ok_or_else(|| ConfigError::MissingRequiredValue("backend store".to_string()))?;
        let endpoint = self
            .endpoint
            .ok_or_else(|| ConfigError::MissingRequiredValue("endpoint".to_string()))?;

        let credentials = match (self.identity, self.secret) {
            (Some(identity), Some(secret)) => Some(Credentials { identity, secret }),
            _ => None,
        };

        // Certificate material is only carried for a TLS endpoint.
        let tls = if endpoint.scheme.is_tls() { self.tls } else { None };

        Ok(Gateway::new(GatewayConfig {
            store,
            endpoint,
            credentials,
            tls,
            virtual_host: self.virtual_host,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TransientStore;
    use crate::ServerState;

    fn store() -> Arc<dyn ObjectStore> {
        Arc::new(TransientStore::new())
    }

    #[test]
    fn test_build_with_minimal_settings() {
        let gateway = GatewayBuilder::new()
            .store(store())
            .endpoint("http://127.0.0.1:0")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(gateway.state(), ServerState::Stopped);
    }

    #[test]
    fn test_build_requires_a_store() {
        let err = GatewayBuilder::new()
            .endpoint("http://127.0.0.1:0")
            .unwrap()
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("backend store"));
    }

    #[test]
    fn test_build_requires_an_endpoint() {
        let err = GatewayBuilder::new().store(store()).build().err().unwrap();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn test_build_rejects_endpoint_with_path() {
        let err = GatewayBuilder::new()
            .store(store())
            .endpoint("http://127.0.0.1:8080/prefix")
            .unwrap()
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("path must be empty"));
    }

    #[test]
    fn test_setters_reject_empty_arguments() {
        assert!(GatewayBuilder::new()
            .aws_authentication("AKIAEXAMPLE", "")
            .is_err());
        assert!(GatewayBuilder::new().aws_authentication("", "secret").is_err());
        assert!(GatewayBuilder::new().keystore("", "changeit").is_err());
        assert!(GatewayBuilder::new().keystore("gateway.p12", "").is_err());
        assert!(GatewayBuilder::new().virtual_host("").is_err());
    }

    #[test]
    fn test_build_rejects_https_without_keystore() {
        let err = GatewayBuilder::new()
            .store(store())
            .endpoint("https://127.0.0.1:8443")
            .unwrap()
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("certificate store"));
    }

    #[test]
    fn test_build_drops_unused_keystore_on_plain_endpoint() {
        // Material supplied alongside a plain endpoint is ignored, matching
        // the transport contract.
        let gateway = GatewayBuilder::new()
            .store(store())
            .endpoint("http://127.0.0.1:0")
            .unwrap()
            .keystore("gateway.p12", "changeit")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(gateway.state(), ServerState::Stopped);
    }
}
