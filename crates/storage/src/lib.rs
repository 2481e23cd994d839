//! Object-store gateway: presigned upload/download URLs plus direct
//! puts for reconciler-uploaded outputs.
//!
//! Key naming and namespace scoping are enforced upstream in
//! `atelier_core::storage`; this crate only talks to the store.

mod s3;

pub use s3::{S3Gateway, StorageConfig};

use std::time::Duration;

use async_trait::async_trait;

/// Errors from the object-store layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Building the presigning configuration failed (bad TTL).
    #[error("Presign configuration error: {0}")]
    Presign(String),

    /// The store rejected or failed the request.
    #[error("Object store error: {0}")]
    Request(String),
}

/// Capabilities the control plane consumes from an object store.
///
/// Object-safe so the API layer can hold an `Arc<dyn ObjectStore>` and
/// tests can substitute a mock.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Time-limited URL granting one direct upload of `key`.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    /// Time-limited URL granting one direct download of `key`.
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    /// Server-side upload, used when the compute backend hands back
    /// inline output content instead of a key.
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError>;
}
