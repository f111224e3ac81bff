//! In-memory "transient" storage provider
//!
//! Buckets and objects live in a map guarded by an async `RwLock`; nothing
//! survives process exit. Buckets are created implicitly on first write.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use md5::{Digest, Md5};
use tokio::sync::RwLock;

use super::{ObjectMeta, ObjectStore, StorageError};

struct StoredObject {
    meta: ObjectMeta,
    data: Bytes,
}

/// In-memory object store backing the `transient` provider.
#[derive(Default)]
pub struct TransientStore {
    buckets: RwLock<HashMap<String, HashMap<String, StoredObject>>>,
}

impl TransientStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Quoted hex MD5, the ETag form S3 clients expect for whole objects.
fn compute_etag(data: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Md5::digest(data)))
}

#[async_trait]
impl ObjectStore for TransientStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
    ) -> Result<ObjectMeta, StorageError> {
        let meta = ObjectMeta {
            size: data.len() as u64,
            etag: compute_etag(&data),
            last_modified: Utc::now(),
        };

        let mut buckets = self.buckets.write().await;
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), StoredObject {
                meta: meta.clone(),
                data,
            });

        Ok(meta)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<(ObjectMeta, Bytes), StorageError> {
        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::NoSuchBucket(bucket.to_string()))?;
        let object = objects
            .get(key)
            .ok_or_else(|| StorageError::NoSuchKey(bucket.to_string(), key.to_string()))?;

        Ok((object.meta.clone(), object.data.clone()))
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMeta, StorageError> {
        let (meta, _) = self.get(bucket, key).await?;
        Ok(meta)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::NoSuchBucket(bucket.to_string()))?;
        objects
            .remove(key)
            .ok_or_else(|| StorageError::NoSuchKey(bucket.to_string(), key.to_string()))?;

        Ok(())
    }

    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<(String, ObjectMeta)>, StorageError> {
        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::NoSuchBucket(bucket.to_string()))?;

        let mut entries: Vec<(String, ObjectMeta)> = objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| (key.clone(), object.meta.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let store = TransientStore::new();
        let written = store
            .put("bucket", "key", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert_eq!(written.size, 5);

        let (meta, data) = store.get("bucket", "key").await.unwrap();
        assert_eq!(meta, written);
        assert_eq!(&data[..], b"hello");
    }

    #[tokio::test]
    async fn test_etag_is_quoted_md5() {
        let store = TransientStore::new();
        let meta = store
            .put("bucket", "key", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        // Well-known MD5 of "hello".
        assert_eq!(meta.etag, "\"5d41402abc4b2a76b9719d911017c592\"");
    }

    #[tokio::test]
    async fn test_get_missing_bucket_and_key() {
        let store = TransientStore::new();
        assert!(matches!(
            store.get("missing", "key").await,
            Err(StorageError::NoSuchBucket(_))
        ));

        store
            .put("bucket", "key", Bytes::from_static(b"x"))
            .await
            .unwrap();
        assert!(matches!(
            store.get("bucket", "other").await,
            Err(StorageError::NoSuchKey(_, _))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_object() {
        let store = TransientStore::new();
        store
            .put("bucket", "key", Bytes::from_static(b"x"))
            .await
            .unwrap();
        store.delete("bucket", "key").await.unwrap();
        assert!(store.get("bucket", "key").await.is_err());
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix_in_key_order() {
        let store = TransientStore::new();
        for key in ["logs/b", "logs/a", "data/a"] {
            store
                .put("bucket", key, Bytes::from_static(b"x"))
                .await
                .unwrap();
        }

        let entries = store.list("bucket", "logs/").await.unwrap();
        let keys: Vec<&str> = entries.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["logs/a", "logs/b"]);
    }
}
