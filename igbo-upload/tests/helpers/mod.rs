//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;

use igbo_common::config::FetchFailurePolicy;
use igbo_upload::audio::Normalizer;
use igbo_upload::dataset::{Dataset, DatasetRecord, Features, RecordRow};
use igbo_upload::models::{AudioUpload, Gender, Submission};
use igbo_upload::store::{
    DatasetStore, FetchOutcome, MemoryDatasetStore, Precondition, PublishReceipt, StoreError,
};
use igbo_upload::workflow::{DatasetAppender, SubmissionWorkflow};

pub const DATASET_ID: &str = "tester/igbo_clips";

/// 16-bit mono WAV: `seconds` of a 220 Hz tone
pub fn wav_bytes(sample_rate: u32, seconds: f64) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut buf = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut buf), spec).unwrap();
        let frames = (sample_rate as f64 * seconds) as usize;
        for i in 0..frames {
            let t = i as f64 / sample_rate as f64;
            let value = (8000.0 * (2.0 * std::f64::consts::PI * 220.0 * t).sin()) as i16;
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
    }
    buf
}

pub fn wav_submission(text: &str) -> Submission {
    Submission {
        text: text.to_string(),
        audio: AudioUpload {
            bytes: wav_bytes(16_000, 0.25),
            declared_mime: "audio/wav".to_string(),
            file_name: Some("clip.wav".to_string()),
        },
        gender: Gender::Unspecified,
        age: None,
        dialect: None,
    }
}

/// Already-published record
pub fn stored_record(text: &str) -> DatasetRecord {
    DatasetRecord::from_row(RecordRow {
        text: text.to_string(),
        audio_file_path: format!("audio/{}.wav", text),
        gender: None,
        age: None,
        dialect: None,
    })
}

pub fn published_dataset(texts: &[&str]) -> Dataset {
    Dataset::from_records(
        Features::published_schema(),
        texts.iter().map(|t| stored_record(t)).collect(),
    )
}

pub fn workflow(
    store: Arc<dyn DatasetStore>,
    temp_dir: &std::path::Path,
    fetch_failure: FetchFailurePolicy,
    max_attempts: u32,
) -> SubmissionWorkflow {
    SubmissionWorkflow::new(
        Normalizer::new(None).with_temp_dir(temp_dir),
        DatasetAppender::new(store, DATASET_ID, fetch_failure, max_attempts),
    )
}

/// Counts calls and optionally injects failures in front of a memory store
pub struct InstrumentedStore {
    pub inner: Arc<MemoryDatasetStore>,
    pub fetches: AtomicUsize,
    pub publishes: AtomicUsize,
    fail_fetch: bool,
    always_conflict: bool,
}

impl InstrumentedStore {
    pub fn new(inner: Arc<MemoryDatasetStore>) -> Self {
        Self {
            inner,
            fetches: AtomicUsize::new(0),
            publishes: AtomicUsize::new(0),
            fail_fetch: false,
            always_conflict: false,
        }
    }

    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn always_conflict(mut self) -> Self {
        self.always_conflict = true;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn publish_count(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatasetStore for InstrumentedStore {
    async fn fetch(&self, dataset_id: &str) -> Result<FetchOutcome, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch {
            return Err(StoreError::Network("connection reset by peer".to_string()));
        }
        self.inner.fetch(dataset_id).await
    }

    async fn publish(
        &self,
        dataset_id: &str,
        dataset: &Dataset,
        precondition: &Precondition,
    ) -> Result<PublishReceipt, StoreError> {
        self.publishes.fetch_add(1, Ordering::SeqCst);
        if self.always_conflict {
            return Err(StoreError::Conflict);
        }
        self.inner.publish(dataset_id, dataset, precondition).await
    }
}

/// Holds the first `gated` fetches at a barrier until all of them have read
/// the dataset, forcing overlapping fetch windows
pub struct GatedStore {
    inner: Arc<MemoryDatasetStore>,
    barrier: Barrier,
    gated: usize,
    fetches: AtomicUsize,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryDatasetStore>, gated: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(gated),
            gated,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatasetStore for GatedStore {
    async fn fetch(&self, dataset_id: &str) -> Result<FetchOutcome, StoreError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        let outcome = self.inner.fetch(dataset_id).await;
        if n < self.gated {
            self.barrier.wait().await;
        }
        outcome
    }

    async fn publish(
        &self,
        dataset_id: &str,
        dataset: &Dataset,
        precondition: &Precondition,
    ) -> Result<PublishReceipt, StoreError> {
        self.inner.publish(dataset_id, dataset, precondition).await
    }
}
