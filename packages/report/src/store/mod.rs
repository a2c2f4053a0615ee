//! Client contract for the blob store and workspace object store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::storage::StorageError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod archive;
pub mod local;

pub use local::LocalDataStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("blob not found: {0}")]
    BlobNotFound(String),

    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("store returned no handle for blob {0}")]
    MissingHandle(String),

    #[error("{} is a directory and no packing was requested", .0.display())]
    DirectoryNotPacked(PathBuf),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// How the store should package content before storing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Packing {
    Zip,
}

/// A retrievable handle minted for a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    /// Handle id, distinct from the blob id.
    pub id: String,
    /// Base URL of the blob service.
    pub url: String,
    /// Id of the blob the handle points at.
    pub blob_id: String,
}

impl Handle {
    pub fn retrieval_url(&self) -> String {
        format!("{}/node/{}", self.url, self.blob_id)
    }
}

/// Result of ingesting or claiming a blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub blob_id: String,
    /// Present when a handle was requested.
    pub handle: Option<Handle>,
}

/// A request to save one object into a workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveObject {
    pub workspace_id: i64,
    pub type_tag: String,
    pub data: Value,
    pub name: String,
    pub meta: BTreeMap<String, String>,
    pub hidden: bool,
    pub provenance: Vec<Value>,
}

/// Workspace bookkeeping for a saved object version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub object_id: i64,
    pub name: String,
    pub type_tag: String,
    pub saved_at: DateTime<Utc>,
    pub version: i64,
    pub workspace_id: i64,
    pub workspace_name: String,
    pub checksum: String,
    pub size: u64,
    pub meta: BTreeMap<String, String>,
}

impl ObjectInfo {
    /// `"<workspace_id>/<object_id>/<version>"`
    pub fn reference(&self) -> String {
        format!("{}/{}/{}", self.workspace_id, self.object_id, self.version)
    }
}

/// Operations the report service needs from the external stores.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Upload a local file or directory as a new blob.
    async fn ingest_local_path(
        &self,
        path: &Path,
        want_handle: bool,
        pack: Option<Packing>,
    ) -> Result<StoredFile, StoreError>;

    /// Take ownership of an existing blob without re-uploading it.
    async fn claim_existing_blob(
        &self,
        blob_id: &str,
        want_handle: bool,
    ) -> Result<StoredFile, StoreError>;

    async fn resolve_workspace_name(&self, name: &str) -> Result<i64, StoreError>;

    async fn persist_object(&self, object: SaveObject) -> Result<ObjectInfo, StoreError>;
}
