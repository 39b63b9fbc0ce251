//! Messages shown to the contributor and the per-submission report

use serde::Serialize;
use uuid::Uuid;

use super::state::{InvalidTransition, StateTransition, SubmissionState, SubmissionTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One line of feedback in the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// State tracker plus the notices collected along the way
#[derive(Debug, Default)]
pub struct SubmissionProgress {
    tracker: SubmissionTracker,
    notices: Vec<Notice>,
}

impl SubmissionProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SubmissionState {
        self.tracker.state()
    }

    pub fn advance(&mut self, next: SubmissionState) -> Result<(), InvalidTransition> {
        self.tracker.advance(next)
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), InvalidTransition> {
        self.tracker.fail(reason)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message);
    }

    fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    pub fn into_report(self, details: ReportDetails) -> SubmissionReport {
        SubmissionReport {
            submission_id: self.tracker.id(),
            state: self.tracker.state().clone(),
            transitions: self.tracker.history().to_vec(),
            messages: self.notices,
            file_name: details.file_name,
            detected_mime: details.detected_mime,
            record_count: details.record_count,
            audio_file_path: details.audio_file_path,
            revision: details.revision,
            commit_url: details.commit_url,
        }
    }
}

/// Fields of the report filled in by the workflow
#[derive(Debug, Clone, Default)]
pub struct ReportDetails {
    pub file_name: Option<String>,
    pub detected_mime: String,
    pub record_count: Option<usize>,
    pub audio_file_path: Option<String>,
    pub revision: Option<String>,
    pub commit_url: Option<String>,
}

/// POST /api/submissions response body
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    pub submission_id: Uuid,
    #[serde(flatten)]
    pub state: SubmissionState,
    pub transitions: Vec<StateTransition>,
    pub messages: Vec<Notice>,
    pub file_name: Option<String>,
    pub detected_mime: String,
    /// Records in the published dataset
    pub record_count: Option<usize>,
    /// Repository path of the stored clip
    pub audio_file_path: Option<String>,
    /// Dataset revision created by the publish
    pub revision: Option<String>,
    pub commit_url: Option<String>,
}

impl SubmissionReport {
    pub fn succeeded(&self) -> bool {
        self.state == SubmissionState::Done
    }

    /// Reason recorded when the submission failed
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            SubmissionState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
