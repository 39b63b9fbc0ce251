//! In-memory dataset model
//!
//! A [`Dataset`] is an ordered list of records plus the column schema.
//! Values are never modified in place: casting and concatenation build new
//! datasets, so a fetched snapshot stays exactly what the remote returned.

pub mod features;
pub mod record;

pub use features::{Feature, Features, AUDIO_COLUMN, AUDIO_SAMPLING_RATE};
pub use record::{AudioRef, DatasetRecord, RecordRow};

use thiserror::Error;

/// Dataset construction errors
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Schema mismatch: {}", .0.join("; "))]
    SchemaMismatch(Vec<String>),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Nothing to concatenate")]
    NothingToConcatenate,

    #[error("Audio has not been uploaded yet: {0}")]
    UnpublishedAudio(String),

    #[error("Malformed row {line}: {message}")]
    MalformedRow { line: usize, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    features: Features,
    records: Vec<DatasetRecord>,
}

impl Dataset {
    pub fn from_records(features: Features, records: Vec<DatasetRecord>) -> Self {
        Self { features, records }
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reinterpret a column as another feature type
    ///
    /// Declarative only: values are untouched, the audio column is decoded
    /// at `sampling_rate` by whoever reads the published dataset.
    pub fn cast_column(&self, column: &str, feature: Feature) -> Result<Dataset, DatasetError> {
        let mut features = self.features.clone();
        if !features.set(column, feature) {
            return Err(DatasetError::UnknownColumn(column.to_string()));
        }
        Ok(Dataset {
            features,
            records: self.records.clone(),
        })
    }

    /// Concatenate datasets in order; all must share the same schema
    pub fn concatenate(parts: &[&Dataset]) -> Result<Dataset, DatasetError> {
        let (first, rest) = parts.split_first().ok_or(DatasetError::NothingToConcatenate)?;

        let mut records = first.records.clone();
        for part in rest {
            let diffs = first.features.differences(&part.features);
            if !diffs.is_empty() {
                return Err(DatasetError::SchemaMismatch(diffs));
            }
            records.extend(part.records.iter().cloned());
        }

        Ok(Dataset {
            features: first.features.clone(),
            records,
        })
    }

    /// Copy with the records replaced, schema unchanged
    pub fn with_records(&self, records: Vec<DatasetRecord>) -> Dataset {
        Dataset {
            features: self.features.clone(),
            records,
        }
    }

    /// Serialize as JSON Lines, one row per record
    ///
    /// Fails if any record still references local audio.
    pub fn to_jsonl(&self) -> Result<String, DatasetError> {
        let mut out = String::new();
        for record in &self.records {
            let row = record.to_row()?;
            // RecordRow holds only strings, serialization cannot fail
            let line = serde_json::to_string(&row).map_err(|e| DatasetError::MalformedRow {
                line: 0,
                message: e.to_string(),
            })?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Parse JSON Lines rows (blank lines are skipped)
    pub fn from_jsonl(features: Features, text: &str) -> Result<Dataset, DatasetError> {
        let mut records = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row: RecordRow =
                serde_json::from_str(line).map_err(|e| DatasetError::MalformedRow {
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            records.push(DatasetRecord::from_row(row));
        }
        Ok(Dataset { features, records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(text: &str, audio: &str) -> DatasetRecord {
        DatasetRecord {
            text: text.to_string(),
            audio: AudioRef::Stored(audio.to_string()),
            gender: Some("Female".to_string()),
            age: None,
            dialect: Some("anambra".to_string()),
        }
    }

    fn existing(n: usize) -> Dataset {
        let records = (0..n)
            .map(|i| stored(&format!("row {}", i), &format!("audio/{}.wav", i)))
            .collect();
        Dataset::from_records(Features::published_schema(), records)
    }

    fn submission() -> Dataset {
        Dataset::from_records(
            Features::submission_schema(),
            vec![DatasetRecord::new_local("Ndewo, Kedu?", "/tmp/new.wav", None, None, None)],
        )
    }

    #[test]
    fn test_cast_is_declarative() {
        let new = submission();
        let cast = new
            .cast_column(AUDIO_COLUMN, Feature::audio(AUDIO_SAMPLING_RATE))
            .unwrap();

        assert_eq!(cast.features(), &Features::published_schema());
        assert_eq!(cast.records(), new.records());
        // Source value untouched
        assert_eq!(new.features(), &Features::submission_schema());
    }

    #[test]
    fn test_cast_unknown_column() {
        let err = submission().cast_column("speaker", Feature::string()).unwrap_err();
        assert!(matches!(err, DatasetError::UnknownColumn(c) if c == "speaker"));
    }

    #[test]
    fn test_concatenate_appends_in_order() {
        let base = existing(3);
        let new = submission()
            .cast_column(AUDIO_COLUMN, Feature::audio(AUDIO_SAMPLING_RATE))
            .unwrap();

        let merged = Dataset::concatenate(&[&base, &new]).unwrap();

        assert_eq!(merged.len(), 4);
        assert_eq!(&merged.records()[..3], base.records());
        assert_eq!(merged.records()[3].text, "Ndewo, Kedu?");
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_concatenate_rejects_uncast_audio_column() {
        let err = Dataset::concatenate(&[&existing(1), &submission()]).unwrap_err();
        assert!(matches!(err, DatasetError::SchemaMismatch(_)));
    }

    #[test]
    fn test_concatenate_nothing() {
        assert!(matches!(
            Dataset::concatenate(&[]),
            Err(DatasetError::NothingToConcatenate)
        ));
    }

    #[test]
    fn test_jsonl_round_trip_of_published_rows() {
        let base = existing(2);
        let text = base.to_jsonl().unwrap();
        assert_eq!(text.lines().count(), 2);

        let parsed = Dataset::from_jsonl(Features::published_schema(), &text).unwrap();
        assert_eq!(parsed, base);
    }

    #[test]
    fn test_jsonl_reports_bad_line() {
        let text = "{\"text\":\"a\",\"audio_file_path\":\"audio/a.wav\"}\n\nnot json\n";
        let err = Dataset::from_jsonl(Features::published_schema(), text).unwrap_err();
        assert!(matches!(err, DatasetError::MalformedRow { line: 3, .. }));
    }
}
