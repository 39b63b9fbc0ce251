//! Form submission

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Speaker gender as offered by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Unspecified,
    Female,
    Male,
}

impl Gender {
    /// Value stored in the dataset; unspecified is stored as null
    pub fn label(self) -> Option<&'static str> {
        match self {
            Gender::Unspecified => None,
            Gender::Female => Some("Female"),
            Gender::Male => Some("Male"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "unspecified" | "none" => Ok(Gender::Unspecified),
            "female" => Ok(Gender::Female),
            "male" => Ok(Gender::Male),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

/// Uploaded audio as received from the form
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub declared_mime: String,
    pub file_name: Option<String>,
}

/// One click of the Upload button
#[derive(Debug, Clone)]
pub struct Submission {
    pub text: String,
    pub audio: AudioUpload,
    pub gender: Gender,
    pub age: Option<String>,
    pub dialect: Option<String>,
}

impl Submission {
    /// Transcript if it contains anything besides whitespace
    pub fn transcript(&self) -> Option<&str> {
        if self.text.trim().is_empty() {
            None
        } else {
            Some(&self.text)
        }
    }

    pub fn age(&self) -> Option<String> {
        non_blank(self.age.as_deref())
    }

    pub fn dialect(&self) -> Option<String> {
        non_blank(self.dialect.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}
