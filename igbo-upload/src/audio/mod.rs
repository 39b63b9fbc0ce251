//! Audio intake and normalization
//!
//! Uploaded clips are stored as uncompressed WAV. WAV uploads pass through
//! untouched; every other accepted format is decoded with symphonia and
//! re-encoded as 16-bit PCM WAV with hound.

pub mod decoder;
pub mod encoder;
pub mod intake;
pub mod mime;

pub use decoder::{decode_file, DecodedAudio};
pub use intake::{CanonicalAudio, Normalizer};
pub use mime::AudioKind;

use thiserror::Error;

/// Audio conversion errors
///
/// Every variant is reported to the contributor and abandons the submission.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Unsupported audio type: {0}")]
    UnsupportedType(String),

    #[error("Uploaded file is empty")]
    EmptyUpload,

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("Decoded audio contains no samples")]
    NoAudio,

    #[error("Failed to encode WAV: {0}")]
    Encode(String),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
