use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::BlobStore;

/// Blob store on a local directory.
///
/// Blobs live at `{base_path}/{2 hex chars}/{62 hex chars}`; writes go
/// through `{base_path}/.tmp` and are renamed into place, so a blob path
/// either holds complete content or does not exist.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        self.base_path
            .join(hash.shard_prefix())
            .join(hash.shard_suffix())
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn check_size(&self, actual: u64) -> Result<(), StorageError> {
        if actual > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual,
                limit: self.max_size,
            });
        }
        Ok(())
    }

    /// Move a fully written temp file to its content address.
    async fn commit(&self, temp_path: &Path, hash: &ContentHash) -> Result<(), StorageError> {
        let blob_path = self.blob_path(hash);
        if fs::try_exists(&blob_path).await? {
            let _ = fs::remove_file(temp_path).await;
            return Ok(());
        }
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if let Err(e) = fs::rename(temp_path, &blob_path).await {
            let _ = fs::remove_file(temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn copy_to_temp(&self, source: &Path, temp_path: &Path) -> Result<ContentHash, StorageError> {
        let mut reader = fs::File::open(source).await?;
        let mut writer = fs::File::create(temp_path).await?;
        let mut hasher = Sha256::new();
        let mut total: u64 = 0;
        let mut buf = vec![0u8; 64 * 1024];

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            total += n as u64;
            self.check_size(total)?;
            hasher.update(&buf[..n]);
            writer.write_all(&buf[..n]).await?;
        }
        writer.flush().await?;

        Ok(ContentHash::from_digest(hasher))
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StorageError> {
        self.check_size(data.len() as u64)?;

        let hash = ContentHash::compute(data);
        if fs::try_exists(self.blob_path(&hash)).await? {
            return Ok(hash);
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        self.commit(&temp_path, &hash).await?;
        Ok(hash)
    }

    async fn put_file(&self, path: &Path) -> Result<ContentHash, StorageError> {
        let temp_path = self.temp_path();
        match self.copy_to_temp(path, &temp_path).await {
            Ok(hash) => {
                self.commit(&temp_path, &hash).await?;
                Ok(hash)
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                Err(e)
            }
        }
    }

    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.blob_path(hash)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(hash.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.blob_path(hash)).await?)
    }
}
