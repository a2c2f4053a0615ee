use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use common::StoreAppConfig;
use common::storage::{BlobStore, ContentHash, FilesystemBlobStore};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::archive::zip_path;
use super::{DataStore, Handle, ObjectInfo, Packing, SaveObject, StoreError, StoredFile};

/// A saved object version together with everything that was sent with it.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub info: ObjectInfo,
    pub data: Value,
    pub hidden: bool,
    pub provenance: Vec<Value>,
}

#[derive(Default)]
struct Workspace {
    name: String,
    /// Object id `n` lives at index `n - 1`; each entry holds all versions.
    objects: Vec<Vec<StoredObject>>,
}

#[derive(Default)]
struct State {
    /// Blob id -> content.
    nodes: HashMap<String, ContentHash>,
    next_handle: u64,
    workspaces: BTreeMap<i64, Workspace>,
}

/// Single-process stand-in for the blob and workspace services.
///
/// Blob bytes go to a [`FilesystemBlobStore`]; blob ids, handles, workspaces
/// and objects are kept in memory for the lifetime of the value.
pub struct LocalDataStore {
    blobs: FilesystemBlobStore,
    base_url: String,
    state: Mutex<State>,
}

impl LocalDataStore {
    pub async fn new(config: &StoreAppConfig) -> Result<Self, StoreError> {
        let blobs = FilesystemBlobStore::new(config.blob_dir.clone(), config.max_blob_size).await?;
        Ok(Self {
            blobs,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            state: Mutex::new(State::default()),
        })
    }

    /// Create a workspace, or return the id of the one already using `name`.
    pub async fn create_workspace(&self, name: &str) -> i64 {
        let mut state = self.state.lock().await;
        if let Some((id, _)) = state.workspaces.iter().find(|(_, ws)| ws.name == name) {
            return *id;
        }
        let id = state.workspaces.keys().next_back().map_or(1, |last| last + 1);
        state.workspaces.insert(
            id,
            Workspace {
                name: name.to_string(),
                objects: Vec::new(),
            },
        );
        id
    }

    /// Look up an object version by its `ws/obj/ver` reference.
    pub async fn get_object(&self, reference: &str) -> Result<StoredObject, StoreError> {
        let not_found = || StoreError::ObjectNotFound(reference.to_string());
        let parts: Vec<i64> = reference
            .split('/')
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| not_found())?;
        let [workspace_id, object_id, version] = parts[..] else {
            return Err(not_found());
        };

        let state = self.state.lock().await;
        let versions = state
            .workspaces
            .get(&workspace_id)
            .and_then(|ws| ws.objects.get(usize::try_from(object_id - 1).ok()?))
            .ok_or_else(not_found)?;
        versions
            .iter()
            .find(|obj| obj.info.version == version)
            .cloned()
            .ok_or_else(not_found)
    }

    /// Raw bytes behind a blob id.
    pub async fn blob_bytes(&self, blob_id: &str) -> Result<Vec<u8>, StoreError> {
        let hash = self.node(blob_id).await?;
        Ok(self.blobs.get(&hash).await?)
    }

    async fn node(&self, blob_id: &str) -> Result<ContentHash, StoreError> {
        self.state
            .lock()
            .await
            .nodes
            .get(blob_id)
            .copied()
            .ok_or_else(|| StoreError::BlobNotFound(blob_id.to_string()))
    }

    async fn mint_handle(&self, blob_id: &str) -> Handle {
        let mut state = self.state.lock().await;
        state.next_handle += 1;
        Handle {
            id: format!("hid-{}", state.next_handle),
            url: self.base_url.clone(),
            blob_id: blob_id.to_string(),
        }
    }

    async fn stored_file(&self, blob_id: String, want_handle: bool) -> StoredFile {
        let handle = if want_handle {
            Some(self.mint_handle(&blob_id).await)
        } else {
            None
        };
        StoredFile { blob_id, handle }
    }
}

#[async_trait]
impl DataStore for LocalDataStore {
    async fn ingest_local_path(
        &self,
        path: &Path,
        want_handle: bool,
        pack: Option<Packing>,
    ) -> Result<StoredFile, StoreError> {
        let hash = match pack {
            Some(Packing::Zip) => {
                let archive = zip_path(path.to_path_buf()).await?;
                self.blobs.put(&archive).await?
            }
            None => {
                if tokio::fs::metadata(path).await?.is_dir() {
                    return Err(StoreError::DirectoryNotPacked(path.to_path_buf()));
                }
                self.blobs.put_file(path).await?
            }
        };

        let blob_id = Uuid::new_v4().to_string();
        self.state.lock().await.nodes.insert(blob_id.clone(), hash);
        debug!(path = %path.display(), %blob_id, %hash, ?pack, "ingested local path");

        Ok(self.stored_file(blob_id, want_handle).await)
    }

    async fn claim_existing_blob(
        &self,
        blob_id: &str,
        want_handle: bool,
    ) -> Result<StoredFile, StoreError> {
        let hash = self.node(blob_id).await?;
        if !self.blobs.exists(&hash).await? {
            return Err(StoreError::BlobNotFound(blob_id.to_string()));
        }
        Ok(self.stored_file(blob_id.to_string(), want_handle).await)
    }

    async fn resolve_workspace_name(&self, name: &str) -> Result<i64, StoreError> {
        let state = self.state.lock().await;
        state
            .workspaces
            .iter()
            .find(|(_, ws)| ws.name == name)
            .map(|(id, _)| *id)
            .ok_or_else(|| StoreError::WorkspaceNotFound(name.to_string()))
    }

    async fn persist_object(&self, object: SaveObject) -> Result<ObjectInfo, StoreError> {
        let bytes = serde_json::to_vec(&object.data)?;
        let mut state = self.state.lock().await;
        let workspace = state
            .workspaces
            .get_mut(&object.workspace_id)
            .ok_or_else(|| StoreError::WorkspaceNotFound(object.workspace_id.to_string()))?;

        let position = workspace
            .objects
            .iter()
            .position(|versions| versions.first().is_some_and(|v| v.info.name == object.name));
        let index = match position {
            Some(index) => index,
            None => {
                workspace.objects.push(Vec::new());
                workspace.objects.len() - 1
            }
        };

        let info = ObjectInfo {
            object_id: index as i64 + 1,
            name: object.name,
            type_tag: object.type_tag,
            saved_at: Utc::now(),
            version: workspace.objects[index].len() as i64 + 1,
            workspace_id: object.workspace_id,
            workspace_name: workspace.name.clone(),
            checksum: ContentHash::compute(&bytes).to_hex(),
            size: bytes.len() as u64,
            meta: object.meta,
        };
        workspace.objects[index].push(StoredObject {
            info: info.clone(),
            data: object.data,
            hidden: object.hidden,
            provenance: object.provenance,
        });

        Ok(info)
    }
}
