//! Fetch → merge → publish of one record
//!
//! The existing dataset is read together with its revision and the merged
//! result is published only if the remote is still at that revision. When
//! another submission got there first the append starts over from a fresh
//! fetch, so concurrent contributors never overwrite each other's rows.

use igbo_common::config::FetchFailurePolicy;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::dataset::{Dataset, DatasetError, DatasetRecord, Feature, Features, AUDIO_COLUMN, AUDIO_SAMPLING_RATE};
use crate::models::{InvalidTransition, SubmissionProgress, SubmissionState};
use crate::store::{DatasetStore, FetchOutcome, Precondition, StoreError};

#[derive(Debug, Error)]
pub enum AppendError {
    #[error("Error loading existing dataset: {0}")]
    FetchFailed(StoreError),

    #[error("New record does not match the dataset schema: {0}")]
    Schema(#[from] DatasetError),

    #[error("Failed to publish dataset: {0}")]
    PublishFailed(StoreError),

    #[error("Dataset kept changing during upload, gave up after {0} attempts")]
    ConflictRetriesExhausted(u32),

    #[error(transparent)]
    State(#[from] InvalidTransition),
}

/// Result of a successful append
#[derive(Debug, Clone)]
pub struct AppendOutcome {
    pub record_count: usize,
    pub revision: String,
    pub attempts: u32,
    /// Repository path of the new record's audio
    pub audio_file_path: Option<String>,
    pub commit_url: Option<String>,
}

/// Appends submission records to one remote dataset
pub struct DatasetAppender {
    store: Arc<dyn DatasetStore>,
    dataset_id: String,
    fetch_failure: FetchFailurePolicy,
    max_attempts: u32,
    // Serializes appends from this process; CAS covers other processes
    append_lock: Mutex<()>,
}

impl DatasetAppender {
    pub fn new(
        store: Arc<dyn DatasetStore>,
        dataset_id: impl Into<String>,
        fetch_failure: FetchFailurePolicy,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            dataset_id: dataset_id.into(),
            fetch_failure,
            max_attempts: max_attempts.max(1),
            append_lock: Mutex::new(()),
        }
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    /// Append `record` to the remote dataset
    ///
    /// Expects `progress` in READY_TO_UPLOAD; leaves it in PUBLISHING on
    /// success. The caller records DONE or FAILED.
    pub async fn append(
        &self,
        record: DatasetRecord,
        progress: &mut SubmissionProgress,
    ) -> Result<AppendOutcome, AppendError> {
        let new_rows = Dataset::from_records(Features::submission_schema(), vec![record])
            .cast_column(AUDIO_COLUMN, Feature::audio(AUDIO_SAMPLING_RATE))?;

        let _guard = self.append_lock.lock().await;

        for attempt in 1..=self.max_attempts {
            progress.advance(SubmissionState::Fetching)?;
            let (base, precondition) = self.fetch_base(progress).await?;

            progress.advance(SubmissionState::Merging)?;
            let merged = match &base {
                Some(existing) => Dataset::concatenate(&[existing, &new_rows])?,
                None => new_rows.clone(),
            };

            progress.advance(SubmissionState::Publishing)?;
            match self.store.publish(&self.dataset_id, &merged, &precondition).await {
                Ok(receipt) => {
                    info!(
                        dataset_id = %self.dataset_id,
                        revision = %receipt.revision,
                        records = receipt.record_count,
                        attempt,
                        "Appended record"
                    );
                    return Ok(AppendOutcome {
                        record_count: receipt.record_count,
                        revision: receipt.revision,
                        attempts: attempt,
                        audio_file_path: receipt.stored_audio.last().cloned(),
                        commit_url: receipt.commit_url,
                    });
                }
                Err(StoreError::Conflict) if attempt < self.max_attempts => {
                    warn!(
                        dataset_id = %self.dataset_id,
                        attempt,
                        "Dataset changed since fetch, retrying"
                    );
                    progress.warning("The dataset was updated by someone else, retrying...");
                }
                Err(StoreError::Conflict) => {
                    return Err(AppendError::ConflictRetriesExhausted(self.max_attempts));
                }
                Err(e) => return Err(AppendError::PublishFailed(e)),
            }
        }

        Err(AppendError::ConflictRetriesExhausted(self.max_attempts))
    }

    /// Existing dataset (if any) and the publish precondition it implies
    async fn fetch_base(
        &self,
        progress: &mut SubmissionProgress,
    ) -> Result<(Option<Dataset>, Precondition), AppendError> {
        match self.store.fetch(&self.dataset_id).await {
            Ok(FetchOutcome::Found(snapshot)) => {
                info!(
                    dataset_id = %self.dataset_id,
                    revision = %snapshot.revision,
                    records = snapshot.dataset.len(),
                    "Loaded existing dataset"
                );
                Ok((
                    Some(snapshot.dataset),
                    Precondition::Revision(snapshot.revision),
                ))
            }
            Ok(FetchOutcome::Missing { revision }) => {
                info!(dataset_id = %self.dataset_id, "Dataset has no rows yet");
                progress.info(format!(
                    "Dataset {} does not exist yet, it will be created.",
                    self.dataset_id
                ));
                let precondition = match revision {
                    Some(revision) => Precondition::Revision(revision),
                    None => Precondition::Absent,
                };
                Ok((None, precondition))
            }
            Err(e @ StoreError::UnsupportedLayout(_)) => {
                // Publishing over it would drop the rows we cannot read
                warn!(dataset_id = %self.dataset_id, error = %e, "Existing dataset cannot be appended to");
                Err(AppendError::FetchFailed(e))
            }
            Err(e) => {
                warn!(dataset_id = %self.dataset_id, error = %e, "Failed to load existing dataset");
                match self.fetch_failure {
                    FetchFailurePolicy::TreatAsEmpty => {
                        progress.error(format!("Error loading existing dataset: {}", e));
                        warn!(
                            dataset_id = %self.dataset_id,
                            "Continuing with an empty dataset; publish will replace remote contents"
                        );
                        Ok((None, Precondition::Unconditional))
                    }
                    FetchFailurePolicy::Abort => Err(AppendError::FetchFailed(e)),
                }
            }
        }
    }
}
