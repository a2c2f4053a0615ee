use std::path::Path;

use async_trait::async_trait;

use super::error::StorageError;
use super::hash::ContentHash;

/// Content-addressed blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store an in-memory buffer and return its content hash.
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StorageError>;

    /// Copy a local file into the store without buffering it whole.
    async fn put_file(&self, path: &Path) -> Result<ContentHash, StorageError>;

    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError>;

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError>;
}
