//! Data models for the submission workflow

pub mod report;
pub mod state;
pub mod submission;

pub use report::{Notice, NoticeLevel, ReportDetails, SubmissionProgress, SubmissionReport};
pub use state::{InvalidTransition, StateTransition, SubmissionState, SubmissionTracker};
pub use submission::{AudioUpload, Gender, Submission};
