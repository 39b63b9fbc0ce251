//! Upload type detection
//!
//! The declared MIME type is taken at face value. Browsers send an empty or
//! generic type for some containers (notably `.m4a`), in which case the file
//! name extension decides.

use serde::Serialize;

/// Extensions accepted by the upload form
pub const ACCEPTED_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac", "m4a"];

/// Accepted upload container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioKind {
    Wav,
    Mp3,
    Ogg,
    Flac,
    M4a,
}

impl AudioKind {
    /// Classify a declared MIME type (parameters such as `; codecs=` are ignored)
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "audio/wave" | "audio/vnd.wave" => Some(AudioKind::Wav),
            m if m.ends_with("wav") => Some(AudioKind::Wav),
            "audio/mpeg" | "audio/mp3" | "audio/mpeg3" => Some(AudioKind::Mp3),
            "audio/ogg" | "application/ogg" => Some(AudioKind::Ogg),
            "audio/flac" | "audio/x-flac" => Some(AudioKind::Flac),
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" => Some(AudioKind::M4a),
            _ => None,
        }
    }

    /// Classify by file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "wav" => Some(AudioKind::Wav),
            "mp3" => Some(AudioKind::Mp3),
            "ogg" => Some(AudioKind::Ogg),
            "flac" => Some(AudioKind::Flac),
            "m4a" => Some(AudioKind::M4a),
            _ => None,
        }
    }

    /// Detect the upload kind from the declared type, falling back to the
    /// file name only when no specific type was declared
    pub fn detect(declared_mime: &str, file_name: Option<&str>) -> Option<Self> {
        let declared = declared_mime.trim();
        if !declared.is_empty() && declared != "application/octet-stream" {
            return Self::from_mime(declared);
        }

        file_name
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// File extension implied by this kind, used for temp files and format hints
    pub fn extension(self) -> &'static str {
        match self {
            AudioKind::Wav => "wav",
            AudioKind::Mp3 => "mp3",
            AudioKind::Ogg => "ogg",
            AudioKind::Flac => "flac",
            AudioKind::M4a => "m4a",
        }
    }

    /// True for the stored format (no transcoding needed)
    pub fn is_canonical(self) -> bool {
        matches!(self, AudioKind::Wav)
    }
}
