//! Per-submission workflow
//!
//! Validates the upload, normalizes the audio to WAV, then appends the record
//! to the remote dataset. Every outcome ends up in the returned report; the
//! workflow itself never errors.

pub mod append;

pub use append::{AppendError, AppendOutcome, DatasetAppender};

use tracing::{error, info, warn};

use crate::audio::{AudioKind, CanonicalAudio, ConversionError, Normalizer};
use crate::dataset::DatasetRecord;
use crate::models::{ReportDetails, Submission, SubmissionProgress, SubmissionReport, SubmissionState};

pub struct SubmissionWorkflow {
    normalizer: Normalizer,
    appender: DatasetAppender,
}

impl SubmissionWorkflow {
    pub fn new(normalizer: Normalizer, appender: DatasetAppender) -> Self {
        Self {
            normalizer,
            appender,
        }
    }

    pub fn dataset_id(&self) -> &str {
        self.appender.dataset_id()
    }

    /// Run one submission to DONE or FAILED
    pub async fn run(&self, submission: Submission) -> SubmissionReport {
        let mut progress = SubmissionProgress::new();
        let mut details = ReportDetails {
            file_name: submission.audio.file_name.clone(),
            detected_mime: submission.audio.declared_mime.clone(),
            ..Default::default()
        };

        if let Err(reason) = self.execute(submission, &mut progress, &mut details).await {
            error!(reason = %reason, "Submission failed");
            if let Err(e) = progress.fail(reason) {
                error!("{}", e);
            }
        }

        progress.into_report(details)
    }

    /// Returns the failure reason on error; notices are already recorded
    async fn execute(
        &self,
        submission: Submission,
        progress: &mut SubmissionProgress,
        details: &mut ReportDetails,
    ) -> Result<(), String> {
        progress.advance(SubmissionState::AwaitingUpload).map_err(|e| e.to_string())?;

        if let Some(name) = &submission.audio.file_name {
            progress.info(format!("Uploaded file: {}", name));
        }
        progress.info(format!("Detected MIME type: {}", submission.audio.declared_mime));

        progress.advance(SubmissionState::Converting).map_err(|e| e.to_string())?;
        let canonical = match self.convert(&submission, progress).await {
            Ok(canonical) => canonical,
            Err(e) => {
                progress.error(format!("Error converting file: {}", e));
                return Err(format!("conversion failed: {}", e));
            }
        };

        progress.advance(SubmissionState::ReadyToUpload).map_err(|e| e.to_string())?;

        let Some(text) = submission.transcript() else {
            warn!("Submission rejected: empty transcript");
            progress.warning("Please enter the corresponding text.");
            return Err("empty transcript".to_string());
        };

        let record = DatasetRecord::new_local(
            text,
            canonical.path(),
            submission.gender.label().map(str::to_string),
            submission.age(),
            submission.dialect(),
        );

        let result = self.appender.append(record, progress).await;
        // Canonical audio is only needed until the append has read it
        drop(canonical);

        match result {
            Ok(outcome) => {
                progress.advance(SubmissionState::Done).map_err(|e| e.to_string())?;
                progress.success("File and text uploaded successfully!");
                info!(
                    dataset_id = %self.appender.dataset_id(),
                    revision = %outcome.revision,
                    records = outcome.record_count,
                    attempts = outcome.attempts,
                    "Submission published"
                );
                details.record_count = Some(outcome.record_count);
                details.audio_file_path = outcome.audio_file_path;
                details.revision = Some(outcome.revision);
                details.commit_url = outcome.commit_url;
                Ok(())
            }
            Err(e) => {
                progress.error(e.to_string());
                Err(e.to_string())
            }
        }
    }

    async fn convert(
        &self,
        submission: &Submission,
        progress: &mut SubmissionProgress,
    ) -> Result<CanonicalAudio, ConversionError> {
        let upload = &submission.audio;
        let kind = AudioKind::detect(&upload.declared_mime, upload.file_name.as_deref())
            .ok_or_else(|| ConversionError::UnsupportedType(upload.declared_mime.clone()))?;

        if kind.is_canonical() {
            let canonical = self.normalizer.normalize(&upload.bytes, kind)?;
            progress.success("Uploaded file is in .wav format.");
            return Ok(canonical);
        }

        progress.warning("Converting file to .wav format. Please wait...");
        let normalizer = self.normalizer.clone();
        let bytes = upload.bytes.clone();
        let canonical = tokio::task::spawn_blocking(move || normalizer.normalize(&bytes, kind))
            .await
            .map_err(|e| ConversionError::Decode(format!("conversion task failed: {}", e)))??;
        progress.success("Conversion to .wav format successful!");
        Ok(canonical)
    }
}
