use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::Handle;

/// Where the bytes of a requested file come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// A file or directory on the local scratch area, uploaded on resolution.
    Local(PathBuf),
    /// A blob already held by the store, claimed on resolution.
    Stored(String),
}

/// A file the caller wants linked from the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub source: FileSource,
    pub name: Option<String>,
    pub description: Option<String>,
    pub label: Option<String>,
}

impl FileSpec {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::new(FileSource::Local(path.into()))
    }

    pub fn stored(blob_id: impl Into<String>) -> Self {
        Self::new(FileSource::Stored(blob_id.into()))
    }

    fn new(source: FileSource) -> Self {
        Self {
            source,
            name: None,
            description: None,
            label: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Path or blob id, for error messages and logs.
    pub fn target(&self) -> String {
        match &self.source {
            FileSource::Local(path) => path.display().to_string(),
            FileSource::Stored(blob_id) => blob_id.clone(),
        }
    }
}

/// A store-backed file link embedded in a persisted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedFile {
    /// Store-issued handle id.
    pub handle: String,
    pub name: String,
    pub description: String,
    pub label: String,
    #[serde(rename = "URL", alias = "url")]
    pub url: String,
}

impl LinkedFile {
    pub fn from_handle(spec: &FileSpec, handle: &Handle) -> Self {
        Self {
            handle: handle.id.clone(),
            name: spec.name.clone().unwrap_or_default(),
            description: spec.description.clone().unwrap_or_default(),
            label: spec.label.clone().unwrap_or_default(),
            url: handle.retrieval_url(),
        }
    }
}
