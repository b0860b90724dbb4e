//! Object storage seam for invoice PDFs

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("object not found: {0}")]
    NotFound(String),
}

/// Stores rendered invoice PDFs. `Invoice::pdf_object_key` is the key
/// returned by `put`; `pdf_url` is whatever presigned or public URL the
/// implementation derives from it.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), ObjectStoreError>;

    /// A URL the shopkeeper or customer can fetch the object from.
    async fn public_url(&self, key: &str) -> Result<String, ObjectStoreError>;
}
