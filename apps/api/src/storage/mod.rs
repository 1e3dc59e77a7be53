//! Object storage for uploaded resumes.
//!
//! Resumes live in a private bucket; callers only ever hand out short-lived
//! signed links.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores `bytes` at `path` and returns the object's public URL.
    /// Without `overwrite`, an existing object is an error.
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        overwrite: bool,
    ) -> Result<String, StorageError>;

    async fn download(&self, path: &str) -> Result<Bytes, StorageError>;

    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Time-limited read link for a private object.
    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, StorageError>;
}

/// Object key for a user's resume: `resumes/{user_id}/{object_id}.{ext}`.
pub fn resume_object_path(user_id: uuid::Uuid, object_id: uuid::Uuid, extension: &str) -> String {
    format!("resumes/{user_id}/{object_id}.{extension}")
}

fn backend<E: std::error::Error>(err: E) -> StorageError {
    StorageError::Backend(DisplayErrorContext(err).to_string())
}

/// S3 / MinIO implementation.
#[derive(Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
    /// Base URL that already includes the bucket.
    public_url: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String, public_url: String) -> Self {
        Self {
            client,
            bucket,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        match self.client.head_object().bucket(&self.bucket).key(path).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let service = err.into_service_error();
                if service.is_not_found() {
                    Ok(false)
                } else {
                    Err(backend(service))
                }
            }
        }
    }
}

#[async_trait]
impl BlobStorage for S3Storage {
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        overwrite: bool,
    ) -> Result<String, StorageError> {
        if !overwrite && self.exists(path).await? {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(backend)?;
        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, path);
        Ok(format!("{}/{}", self.public_url, path))
    }

    async fn download(&self, path: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|err| {
                let service = err.into_service_error();
                if service.is_no_such_key() {
                    StorageError::NotFound(path.to_string())
                } else {
                    backend(service)
                }
            })?;
        let data = output.body.collect().await.map_err(backend)?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(backend)?;
        info!("Deleted s3://{}/{}", self.bucket, path);
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(backend)?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .presigned(presigning)
            .await
            .map_err(backend)?;
        Ok(request.uri().to_string())
    }
}
