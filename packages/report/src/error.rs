use thiserror::Error;

use crate::store::StoreError;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid params: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to resolve {list}[{index}] ({target}): {source}")]
    Resolution {
        list: &'static str,
        index: usize,
        target: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to look up workspace '{workspace}': {source}")]
    WorkspaceLookup {
        workspace: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to save report object: {0}")]
    Persistence(#[source] StoreError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The service produced a result that breaks its own contract.
    #[error("Internal contract violated: {0}")]
    Contract(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
