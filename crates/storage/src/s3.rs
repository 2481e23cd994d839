//! S3-compatible gateway implementation.
//!
//! Works against AWS S3 proper and S3-compatible stores (Cloudflare R2,
//! MinIO) via the `STORAGE_ENDPOINT` override.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;

use crate::{ObjectStore, StorageError};

/// Connection settings for the object store.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Custom endpoint URL for S3-compatible stores. `None` targets AWS.
    pub endpoint: Option<String>,
    /// Bucket all keys live under.
    pub bucket: String,
    /// Signing region (default: `auto`, which R2 expects).
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl StorageConfig {
    /// Load object-store configuration from environment variables.
    ///
    /// | Env Var                     | Required | Default |
    /// |-----------------------------|----------|---------|
    /// | `STORAGE_ENDPOINT`          | no       | --      |
    /// | `STORAGE_BUCKET`            | **yes**  | --      |
    /// | `STORAGE_REGION`            | no       | `auto`  |
    /// | `STORAGE_ACCESS_KEY_ID`     | **yes**  | --      |
    /// | `STORAGE_SECRET_ACCESS_KEY` | **yes**  | --      |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("STORAGE_ENDPOINT").ok(),
            bucket: std::env::var("STORAGE_BUCKET").expect("STORAGE_BUCKET must be set"),
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "auto".into()),
            access_key_id: std::env::var("STORAGE_ACCESS_KEY_ID")
                .expect("STORAGE_ACCESS_KEY_ID must be set"),
            secret_access_key: std::env::var("STORAGE_SECRET_ACCESS_KEY")
                .expect("STORAGE_SECRET_ACCESS_KEY must be set"),
        }
    }
}

/// Presigning gateway backed by `aws-sdk-s3`.
pub struct S3Gateway {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Gateway {
    /// Build the SDK client from explicit credentials.
    pub async fn new(config: StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "atelier-storage",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials);

        if let Some(endpoint) = config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: config.bucket,
        }
    }

    fn presign_config(ttl: Duration) -> Result<PresigningConfig, StorageError> {
        PresigningConfig::expires_in(ttl).map_err(|e| StorageError::Presign(e.to_string()))
    }
}

#[async_trait]
impl ObjectStore for S3Gateway {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(Self::presign_config(ttl)?)
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        Ok(request.uri().to_string())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presign_config(ttl)?)
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        Ok(request.uri().to_string())
    }

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        tracing::debug!(key = %key, "Uploaded object");

        Ok(())
    }
}
