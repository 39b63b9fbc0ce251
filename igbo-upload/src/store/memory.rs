//! Process-local dataset store
//!
//! Keeps datasets and uploaded audio in memory with a per-dataset revision
//! counter. Backs offline runs (`store = "memory"`) and the test suites.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    new_audio_path, split_dataset_id, DatasetStore, FetchOutcome, Precondition, PublishReceipt,
    RemoteSnapshot, StoreError,
};
use crate::dataset::Dataset;

struct StoredDataset {
    revision: u64,
    dataset: Dataset,
    audio: HashMap<String, Vec<u8>>,
}

#[derive(Default)]
pub struct MemoryDatasetStore {
    datasets: Mutex<HashMap<String, StoredDataset>>,
}

impl MemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a dataset directly (revision 1, or the next revision if present)
    pub async fn seed(&self, dataset_id: &str, dataset: Dataset) {
        let mut datasets = self.datasets.lock().await;
        let revision = datasets.get(dataset_id).map(|d| d.revision + 1).unwrap_or(1);
        datasets.insert(
            dataset_id.to_string(),
            StoredDataset {
                revision,
                dataset,
                audio: HashMap::new(),
            },
        );
    }

    /// Current contents of a dataset
    pub async fn dataset(&self, dataset_id: &str) -> Option<Dataset> {
        self.datasets
            .lock()
            .await
            .get(dataset_id)
            .map(|d| d.dataset.clone())
    }

    /// Bytes of an uploaded audio file
    pub async fn audio_bytes(&self, dataset_id: &str, repo_path: &str) -> Option<Vec<u8>> {
        self.datasets
            .lock()
            .await
            .get(dataset_id)
            .and_then(|d| d.audio.get(repo_path).cloned())
    }

    pub async fn revision(&self, dataset_id: &str) -> Option<String> {
        self.datasets
            .lock()
            .await
            .get(dataset_id)
            .map(|d| d.revision.to_string())
    }
}

#[async_trait]
impl DatasetStore for MemoryDatasetStore {
    async fn fetch(&self, dataset_id: &str) -> Result<FetchOutcome, StoreError> {
        split_dataset_id(dataset_id)?;
        let datasets = self.datasets.lock().await;
        Ok(match datasets.get(dataset_id) {
            Some(stored) => FetchOutcome::Found(RemoteSnapshot {
                dataset: stored.dataset.clone(),
                revision: stored.revision.to_string(),
            }),
            None => FetchOutcome::Missing { revision: None },
        })
    }

    async fn publish(
        &self,
        dataset_id: &str,
        dataset: &Dataset,
        precondition: &Precondition,
    ) -> Result<PublishReceipt, StoreError> {
        split_dataset_id(dataset_id)?;

        // Read local audio before taking the lock
        let mut uploads = Vec::new();
        let mut records = Vec::with_capacity(dataset.len());
        for record in dataset.records() {
            match record.pending_audio() {
                Some(path) => {
                    let bytes = tokio::fs::read(path).await?;
                    let repo_path = new_audio_path();
                    records.push(record.with_stored_audio(repo_path.clone()));
                    uploads.push((repo_path, bytes));
                }
                None => records.push(record.clone()),
            }
        }
        let published = dataset.with_records(records);

        let mut datasets = self.datasets.lock().await;
        let current = datasets.get(dataset_id).map(|d| d.revision);
        let accepted = match (precondition, current) {
            (Precondition::Unconditional, _) => true,
            (Precondition::Absent, None) => true,
            (Precondition::Absent, Some(_)) => false,
            (Precondition::Revision(expected), Some(rev)) => *expected == rev.to_string(),
            (Precondition::Revision(_), None) => false,
        };
        if !accepted {
            debug!(dataset_id, ?precondition, ?current, "Rejecting stale publish");
            return Err(StoreError::Conflict);
        }

        let entry = datasets
            .entry(dataset_id.to_string())
            .or_insert_with(|| StoredDataset {
                revision: 0,
                dataset: published.clone(),
                audio: HashMap::new(),
            });
        entry.revision += 1;
        entry.dataset = published;
        let stored_audio: Vec<String> = uploads.iter().map(|(path, _)| path.clone()).collect();
        entry.audio.extend(uploads);

        Ok(PublishReceipt {
            revision: entry.revision.to_string(),
            record_count: entry.dataset.len(),
            stored_audio,
            commit_url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetRecord, Features};

    const ID: &str = "tester/clips";

    fn local_dataset(dir: &tempfile::TempDir, text: &str) -> Dataset {
        let path = dir.path().join(format!("{}.wav", text));
        std::fs::write(&path, text.as_bytes()).unwrap();
        Dataset::from_records(
            Features::published_schema(),
            vec![DatasetRecord::new_local(text, path, None, None, None)],
        )
    }

    #[tokio::test]
    async fn test_missing_then_published() {
        let store = MemoryDatasetStore::new();
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            store.fetch(ID).await.unwrap(),
            FetchOutcome::Missing { revision: None }
        ));

        let receipt = store
            .publish(ID, &local_dataset(&dir, "first"), &Precondition::Absent)
            .await
            .unwrap();
        assert_eq!(receipt.revision, "1");
        assert_eq!(receipt.record_count, 1);
        assert_eq!(receipt.stored_audio.len(), 1);

        let bytes = store.audio_bytes(ID, &receipt.stored_audio[0]).await.unwrap();
        assert_eq!(bytes, b"first");
        let stored = store.dataset(ID).await.unwrap();
        assert!(stored.records()[0].pending_audio().is_none());
    }

    #[tokio::test]
    async fn test_stale_revision_conflicts() {
        let store = MemoryDatasetStore::new();
        let dir = tempfile::tempdir().unwrap();
        store
            .publish(ID, &local_dataset(&dir, "a"), &Precondition::Absent)
            .await
            .unwrap();
        store
            .publish(ID, &local_dataset(&dir, "b"), &Precondition::Revision("1".into()))
            .await
            .unwrap();

        let err = store
            .publish(ID, &local_dataset(&dir, "c"), &Precondition::Revision("1".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        let err = store
            .publish(ID, &local_dataset(&dir, "d"), &Precondition::Absent)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(store.revision(ID).await.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_unconditional_overwrites() {
        let store = MemoryDatasetStore::new();
        let dir = tempfile::tempdir().unwrap();
        store.seed(ID, local_dataset(&dir, "x").with_records(vec![])).await;

        let receipt = store
            .publish(ID, &local_dataset(&dir, "y"), &Precondition::Unconditional)
            .await
            .unwrap();
        assert_eq!(receipt.revision, "2");
        assert_eq!(store.dataset(ID).await.unwrap().records()[0].text, "y");
    }

    #[tokio::test]
    async fn test_invalid_id_rejected() {
        let store = MemoryDatasetStore::new();
        assert!(matches!(
            store.fetch("no-owner").await,
            Err(StoreError::InvalidDatasetId(_))
        ));
    }
}
