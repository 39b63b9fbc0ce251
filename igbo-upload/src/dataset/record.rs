//! One dataset row

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::DatasetError;

/// Where a record's audio lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioRef {
    /// Canonical file on this machine, not yet uploaded
    Local(PathBuf),
    /// Path inside the remote dataset repository
    Stored(String),
}

/// A transcript/audio pair with optional speaker metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRecord {
    pub text: String,
    pub audio: AudioRef,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub dialect: Option<String>,
}

/// Wire form of a record (one JSON line in the published split)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRow {
    pub text: String,
    pub audio_file_path: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub dialect: Option<String>,
}

impl DatasetRecord {
    /// Record for a new submission whose audio is still local
    pub fn new_local(
        text: impl Into<String>,
        audio_path: impl Into<PathBuf>,
        gender: Option<String>,
        age: Option<String>,
        dialect: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            audio: AudioRef::Local(audio_path.into()),
            gender,
            age,
            dialect,
        }
    }

    /// Local audio path if the record still needs its audio uploaded
    pub fn pending_audio(&self) -> Option<&Path> {
        match &self.audio {
            AudioRef::Local(path) => Some(path),
            AudioRef::Stored(_) => None,
        }
    }

    /// Copy of this record pointing at an uploaded audio file
    pub fn with_stored_audio(&self, repo_path: impl Into<String>) -> Self {
        Self {
            audio: AudioRef::Stored(repo_path.into()),
            ..self.clone()
        }
    }

    pub fn to_row(&self) -> Result<RecordRow, DatasetError> {
        let audio_file_path = match &self.audio {
            AudioRef::Stored(path) => path.clone(),
            AudioRef::Local(path) => {
                return Err(DatasetError::UnpublishedAudio(path.display().to_string()))
            }
        };
        Ok(RecordRow {
            text: self.text.clone(),
            audio_file_path,
            gender: self.gender.clone(),
            age: self.age.clone(),
            dialect: self.dialect.clone(),
        })
    }

    pub fn from_row(row: RecordRow) -> Self {
        Self {
            text: row.text,
            audio: AudioRef::Stored(row.audio_file_path),
            gender: row.gender,
            age: row.age,
            dialect: row.dialect,
        }
    }
}
