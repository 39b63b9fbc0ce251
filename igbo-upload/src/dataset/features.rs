//! Column schema of the dataset
//!
//! Serialized in the `datasets` library's `features` layout so the published
//! repository loads with its usual tooling:
//! `{"text": {"_type": "Value", "dtype": "string"}, "audio_file_path": {"_type": "Audio", "sampling_rate": 16000}}`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TEXT_COLUMN: &str = "text";
pub const AUDIO_COLUMN: &str = "audio_file_path";
pub const GENDER_COLUMN: &str = "gender";
pub const AGE_COLUMN: &str = "age";
pub const DIALECT_COLUMN: &str = "dialect";

/// Sampling rate the audio column is cast to
pub const AUDIO_SAMPLING_RATE: u32 = 16_000;

/// Type of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Feature {
    /// Scalar value (`dtype` is e.g. "string")
    Value { dtype: String },
    /// Audio decoded at read time to `sampling_rate`
    Audio { sampling_rate: u32 },
}

impl Feature {
    pub fn string() -> Self {
        Feature::Value {
            dtype: "string".to_string(),
        }
    }

    pub fn audio(sampling_rate: u32) -> Self {
        Feature::Audio { sampling_rate }
    }
}

/// Column name → feature map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Features(BTreeMap<String, Feature>);

impl Features {
    /// Schema of a freshly built submission: every column a string,
    /// the audio column still a plain path
    pub fn submission_schema() -> Self {
        let columns = [TEXT_COLUMN, AUDIO_COLUMN, GENDER_COLUMN, AGE_COLUMN, DIALECT_COLUMN];
        Self(
            columns
                .iter()
                .map(|name| (name.to_string(), Feature::string()))
                .collect(),
        )
    }

    /// Schema of the published dataset (audio column cast to 16 kHz audio)
    pub fn published_schema() -> Self {
        let mut features = Self::submission_schema();
        features
            .0
            .insert(AUDIO_COLUMN.to_string(), Feature::audio(AUDIO_SAMPLING_RATE));
        features
    }

    pub fn get(&self, column: &str) -> Option<&Feature> {
        self.0.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// Replace the type of an existing column
    pub(crate) fn set(&mut self, column: &str, feature: Feature) -> bool {
        match self.0.get_mut(column) {
            Some(slot) => {
                *slot = feature;
                true
            }
            None => false,
        }
    }

    /// Human-readable differences against `other`, empty when equal
    pub fn differences(&self, other: &Features) -> Vec<String> {
        let mut diffs = Vec::new();
        for (name, feature) in &self.0 {
            match other.0.get(name) {
                None => diffs.push(format!("column '{}' missing from new rows", name)),
                Some(theirs) if theirs != feature => diffs.push(format!(
                    "column '{}' is {:?} but new rows have {:?}",
                    name, feature, theirs
                )),
                Some(_) => {}
            }
        }
        for name in other.0.keys() {
            if !self.0.contains_key(name) {
                diffs.push(format!("unexpected column '{}'", name));
            }
        }
        diffs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_schema_json_layout() {
        let json = serde_json::to_value(Features::published_schema()).unwrap();
        assert_eq!(json["text"]["_type"], "Value");
        assert_eq!(json["text"]["dtype"], "string");
        assert_eq!(json["audio_file_path"]["_type"], "Audio");
        assert_eq!(json["audio_file_path"]["sampling_rate"], 16000);
        assert_eq!(json.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_parse_features_file() {
        let raw = r#"{
            "text": {"_type": "Value", "dtype": "string"},
            "audio_file_path": {"_type": "Audio", "sampling_rate": 16000},
            "gender": {"_type": "Value", "dtype": "string"},
            "age": {"_type": "Value", "dtype": "string"},
            "dialect": {"_type": "Value", "dtype": "string"}
        }"#;
        let features: Features = serde_json::from_str(raw).unwrap();
        assert_eq!(features, Features::published_schema());
    }

    #[test]
    fn test_differences_report_each_mismatch() {
        let published = Features::published_schema();
        assert!(published.differences(&published.clone()).is_empty());

        let diffs = published.differences(&Features::submission_schema());
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].contains("audio_file_path"));
    }
}
