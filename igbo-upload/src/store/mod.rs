//! Remote dataset storage
//!
//! A store hands out snapshots tagged with the revision they were read at and
//! accepts a whole replacement dataset guarded by a [`Precondition`]. Stores
//! report a moved revision as [`StoreError::Conflict`] instead of silently
//! overwriting rows another submission added in between.

pub mod hub;
pub mod memory;

pub use hub::{HubCredentials, HubDatasetStore, WhoAmI};
pub use memory::MemoryDatasetStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::dataset::{Dataset, DatasetError};

/// Dataset store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Remote dataset changed since it was fetched")]
    Conflict,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Invalid dataset id '{0}' (expected owner/name)")]
    InvalidDatasetId(String),

    #[error("Malformed remote data: {0}")]
    Parse(String),

    /// Remote rows exist in a form this store cannot append to
    #[error("Unsupported dataset layout: {0}")]
    UnsupportedLayout(String),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fetched dataset and the revision it was read at
#[derive(Debug, Clone)]
pub struct RemoteSnapshot {
    pub dataset: Dataset,
    pub revision: String,
}

/// Result of fetching the remote dataset
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Found(RemoteSnapshot),
    /// No rows published yet. `revision` is set when the repository itself
    /// exists.
    Missing { revision: Option<String> },
}

/// Condition the remote must satisfy for a publish to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Remote head must still be this revision
    Revision(String),
    /// Remote dataset must not exist yet
    Absent,
    /// Replace whatever is there
    Unconditional,
}

/// Outcome of a successful publish
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    /// Revision created by the publish
    pub revision: String,
    pub record_count: usize,
    /// Repository paths assigned to audio uploaded by this publish, in record order
    pub stored_audio: Vec<String>,
    pub commit_url: Option<String>,
}

#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Read the current dataset
    async fn fetch(&self, dataset_id: &str) -> Result<FetchOutcome, StoreError>;

    /// Replace the remote dataset with `dataset`
    ///
    /// Records with local audio have their audio uploaded and are stored
    /// referencing the uploaded copy.
    async fn publish(
        &self,
        dataset_id: &str,
        dataset: &Dataset,
        precondition: &Precondition,
    ) -> Result<PublishReceipt, StoreError>;
}

/// Repository path for a newly uploaded clip
pub(crate) fn new_audio_path() -> String {
    format!("audio/{}.wav", uuid::Uuid::new_v4())
}

/// Split an `owner/name` dataset id
pub fn split_dataset_id(dataset_id: &str) -> Result<(&str, &str), StoreError> {
    match dataset_id.split_once('/') {
        Some((owner, name))
            if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
        {
            Ok((owner, name))
        }
        _ => Err(StoreError::InvalidDatasetId(dataset_id.to_string())),
    }
}
