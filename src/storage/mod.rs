//! Provider-agnostic object storage capability
//!
//! The gateway core never calls into storage itself; it only threads an
//! opaque [`ObjectStore`] handle through to the request handler. The trait
//! carries the minimal operation set the handler needs. Real provider
//! integrations live outside this crate; the built-in `transient` provider
//! is an in-memory store for tests and demos.

mod memory;

pub use memory::TransientStore;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::ConfigError;

/// Storage backend error type
#[derive(Error, Debug)]
pub enum StorageError {
    /// The named bucket does not exist
    #[error("no such bucket: {0}")]
    NoSuchBucket(String),

    /// The named object does not exist
    #[error("no such key: {0}/{1}")]
    NoSuchKey(String, String),

    /// Backend-specific failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Metadata describing a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Object size in bytes
    pub size: u64,
    /// Entity tag (quoted hex MD5 of the content)
    pub etag: String,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
}

/// The object-storage capability consumed by the request handler.
///
/// `#[async_trait]` keeps the trait object-safe so handles can be shared as
/// `Arc<dyn ObjectStore>` across connection tasks.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object, creating the bucket on first write.
    async fn put(&self, bucket: &str, key: &str, data: Bytes)
        -> Result<ObjectMeta, StorageError>;

    /// Fetch an object with its metadata.
    async fn get(&self, bucket: &str, key: &str) -> Result<(ObjectMeta, Bytes), StorageError>;

    /// Fetch object metadata only.
    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMeta, StorageError>;

    /// Remove an object.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// List objects in a bucket under a key prefix, in key order.
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<(String, ObjectMeta)>, StorageError>;
}

/// Connect to a storage backend by provider identifier.
///
/// The `transient` provider ignores identity, credential, and endpoint; any
/// other identifier is a configuration error since provider integrations
/// are plugged in by embedding callers.
pub fn connect(
    provider: &str,
    _identity: &str,
    _credential: &str,
    _endpoint: Option<&str>,
) -> Result<Arc<dyn ObjectStore>, ConfigError> {
    match provider.to_lowercase().as_str() {
        "transient" => Ok(Arc::new(TransientStore::new())),
        other => Err(ConfigError::InvalidValue(
            crate::config::properties::BACKEND_PROVIDER.to_string(),
            format!("unknown provider: {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_transient_provider() {
        assert!(connect("transient", "identity", "credential", None).is_ok());
        assert!(connect("Transient", "identity", "credential", None).is_ok());
    }

    #[test]
    fn test_connect_unknown_provider() {
        let err = connect("atmos", "identity", "credential", None).err().unwrap();
        assert!(err.to_string().contains("atmos"));
    }
}
