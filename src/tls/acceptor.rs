//! TLS acceptor creation from a PKCS#12 certificate store

use std::fs;
use std::path::Path;

use log::{debug, info};
use openssl::pkcs12::Pkcs12;
use openssl::ssl::{select_next_proto, AlpnError, SslAcceptor, SslMethod};

use crate::common::{GatewayError, Result};

/// Protocols offered to ALPN, HTTP/2 preferred.
const ALPN_PROTOCOLS: &[u8] = b"\x02h2\x08http/1.1";

/// Create a TLS acceptor from a password-protected certificate store.
///
/// The store is a PKCS#12 file holding the private key and certificate
/// chain. It is read and unlocked here, once, at listener start time; a bad
/// path, a wrong password, or a malformed store is a fatal transport error.
pub fn create_tls_acceptor(keystore_path: &Path, keystore_password: &str) -> Result<SslAcceptor> {
    let der = fs::read(keystore_path).map_err(|e| {
        GatewayError::Transport(format!(
            "cannot read certificate store {}: {}",
            keystore_path.display(),
            e
        ))
    })?;

    let keystore = Pkcs12::from_der(&der).map_err(|e| {
        GatewayError::Transport(format!(
            "malformed certificate store {}: {}",
            keystore_path.display(),
            e
        ))
    })?;

    let parsed = keystore.parse2(keystore_password).map_err(|e| {
        GatewayError::Transport(format!(
            "cannot unlock certificate store {}: {}",
            keystore_path.display(),
            e
        ))
    })?;

    let key = parsed.pkey.ok_or_else(|| {
        GatewayError::Transport(format!(
            "certificate store {} holds no private key",
            keystore_path.display()
        ))
    })?;
    let cert = parsed.cert.ok_or_else(|| {
        GatewayError::Transport(format!(
            "certificate store {} holds no certificate",
            keystore_path.display()
        ))
    })?;

    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls())?;
    acceptor.set_private_key(&key)?;
    acceptor.set_certificate(&cert)?;
    if let Some(chain) = parsed.ca {
        for extra in chain {
            acceptor.add_extra_chain_cert(extra)?;
        }
    }
    acceptor.check_private_key().map_err(|e| {
        GatewayError::Transport(format!(
            "certificate store {} key does not match its certificate: {}",
            keystore_path.display(),
            e
        ))
    })?;

    acceptor.set_alpn_select_callback(|_ssl, client_protos| {
        select_next_proto(ALPN_PROTOCOLS, client_protos).ok_or(AlpnError::NOACK)
    });

    debug!(
        "certificate store {} unlocked, subject: {:?}",
        keystore_path.display(),
        cert.subject_name()
    );
    info!("TLS acceptor ready");

    Ok(acceptor.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_store_is_a_transport_error() {
        let err =
            create_tls_acceptor(Path::new("/nonexistent/gateway.p12"), "changeit")
                .err()
                .unwrap();
        match err {
            GatewayError::Transport(msg) => assert!(msg.contains("/nonexistent/gateway.p12")),
            other => panic!("expected transport error, got: {}", other),
        }
    }

    #[test]
    fn test_garbage_store_is_a_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.p12");
        fs::write(&path, b"not a pkcs12 archive").unwrap();

        let err = create_tls_acceptor(&path, "changeit").err().unwrap();
        match err {
            GatewayError::Transport(msg) => assert!(msg.contains("malformed")),
            other => panic!("expected transport error, got: {}", other),
        }
    }
}
