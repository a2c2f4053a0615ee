use std::path::PathBuf;

use serde::Deserialize;

/// Settings for the local blob and workspace store.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreAppConfig {
    /// Root directory for content-addressed blobs. Default: "./data/blobs".
    #[serde(default = "default_blob_dir")]
    pub blob_dir: PathBuf,
    /// Base URL reported in blob handles. Default: "http://localhost:7044".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Largest blob accepted, in bytes. Default: 512 MB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
}

fn default_blob_dir() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_base_url() -> String {
    "http://localhost:7044".into()
}
fn default_max_blob_size() -> u64 {
    512 * 1024 * 1024
}

impl Default for StoreAppConfig {
    fn default() -> Self {
        Self {
            blob_dir: default_blob_dir(),
            base_url: default_base_url(),
            max_blob_size: default_max_blob_size(),
        }
    }
}
