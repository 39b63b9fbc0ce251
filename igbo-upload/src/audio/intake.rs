//! Upload normalization into a scoped temporary WAV file

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{decoder, encoder, AudioKind, ConversionError};

const TEMP_PREFIX: &str = "igbo_upload_";

/// Canonical (WAV) audio for one submission
///
/// Owns its temporary file: the file is deleted when this value is dropped,
/// so it must outlive the dataset append that reads it.
#[derive(Debug)]
pub struct CanonicalAudio {
    file: NamedTempFile,
    transcoded: bool,
    duration_seconds: Option<f64>,
}

impl CanonicalAudio {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// False when the upload was stored byte-for-byte
    pub fn was_transcoded(&self) -> bool {
        self.transcoded
    }

    /// Decoded duration, known only for transcoded uploads
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration_seconds
    }
}

/// Converts uploads into canonical WAV files
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    target_sample_rate: Option<u32>,
    temp_dir: Option<PathBuf>,
}

impl Normalizer {
    /// `target_sample_rate` resamples transcoded audio; `None` keeps the source rate
    pub fn new(target_sample_rate: Option<u32>) -> Self {
        Self {
            target_sample_rate,
            temp_dir: None,
        }
    }

    /// Place temporary files in `dir` instead of the system temp directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Normalize raw upload bytes of a known kind
    ///
    /// WAV is written unchanged. Other kinds are transcoded.
    pub fn normalize(&self, bytes: &[u8], kind: AudioKind) -> Result<CanonicalAudio, ConversionError> {
        if bytes.is_empty() {
            return Err(ConversionError::EmptyUpload);
        }

        if kind.is_canonical() {
            let mut file = self.temp_file("wav")?;
            file.write_all(bytes)?;
            file.flush()?;
            debug!(path = %file.path().display(), bytes = bytes.len(), "Stored WAV upload unchanged");
            return Ok(CanonicalAudio {
                file,
                transcoded: false,
                duration_seconds: None,
            });
        }

        self.transcode(bytes, kind)
    }

    /// Detect the kind from the declared MIME type (or file name) and normalize
    pub fn normalize_upload(
        &self,
        bytes: &[u8],
        declared_mime: &str,
        file_name: Option<&str>,
    ) -> Result<CanonicalAudio, ConversionError> {
        let kind = AudioKind::detect(declared_mime, file_name)
            .ok_or_else(|| ConversionError::UnsupportedType(declared_mime.to_string()))?;
        self.normalize(bytes, kind)
    }

    /// Decode `bytes` (stored under the extension implied by `kind`) and
    /// re-encode as 16-bit PCM WAV
    ///
    /// The intermediate file is removed before returning.
    pub fn transcode(&self, bytes: &[u8], kind: AudioKind) -> Result<CanonicalAudio, ConversionError> {
        let mut source = self.temp_file(kind.extension())?;
        source.write_all(bytes)?;
        source.flush()?;

        let mut audio = decoder::decode_file(source.path())?;
        drop(source);

        if audio.frames() == 0 {
            return Err(ConversionError::NoAudio);
        }

        if let Some(rate) = self.target_sample_rate {
            audio = encoder::resample(audio, rate)?;
        }

        let output = self.temp_file("wav")?;
        encoder::write_wav(&audio, output.path())?;

        info!(
            from = kind.extension(),
            sample_rate = audio.sample_rate,
            channels = audio.channels,
            "Converted upload to WAV ({:.2}s)",
            audio.duration_seconds()
        );

        Ok(CanonicalAudio {
            file: output,
            transcoded: true,
            duration_seconds: Some(audio.duration_seconds()),
        })
    }

    fn temp_file(&self, extension: &str) -> Result<NamedTempFile, ConversionError> {
        let suffix = format!(".{}", extension);
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(&suffix);
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// 16-bit WAV bytes: `seconds` of a 440 Hz tone
    fn wav_bytes(sample_rate: u32, channels: u16, bits: u16, seconds: f64) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: bits,
            sample_format: hound::SampleFormat::Int,
        };
        let mut buf = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut buf), spec).unwrap();
            let frames = (sample_rate as f64 * seconds) as usize;
            let peak = ((1i64 << (bits - 1)) - 1) as f64 * 0.3;
            for i in 0..frames {
                let t = i as f64 / sample_rate as f64;
                let value = (peak * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as i32;
                for _ in 0..channels {
                    writer.write_sample(value).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        buf
    }

    #[test]
    fn test_wav_is_byte_for_byte_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = wav_bytes(44_100, 2, 16, 0.2);

        let canonical = Normalizer::new(Some(16_000))
            .with_temp_dir(dir.path())
            .normalize(&bytes, AudioKind::Wav)
            .unwrap();

        assert!(!canonical.was_transcoded());
        assert_eq!(std::fs::read(canonical.path()).unwrap(), bytes);
        assert_eq!(canonical.path().extension().unwrap(), "wav");
    }

    #[test]
    fn test_transcode_keeps_duration_and_format() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = wav_bytes(48_000, 1, 24, 1.5);

        let canonical = Normalizer::new(None)
            .with_temp_dir(dir.path())
            .transcode(&bytes, AudioKind::Wav)
            .unwrap();

        assert!(canonical.was_transcoded());
        let reader = hound::WavReader::open(canonical.path()).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.spec().sample_rate, 48_000);
        assert_eq!(reader.duration(), 72_000);
        assert!((canonical.duration_seconds().unwrap() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_transcode_with_target_rate() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = wav_bytes(44_100, 1, 16, 1.0);

        let canonical = Normalizer::new(Some(16_000))
            .with_temp_dir(dir.path())
            .transcode(&bytes, AudioKind::Flac)
            .unwrap();

        let reader = hound::WavReader::open(canonical.path()).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert!((reader.duration() as i64 - 16_000).abs() <= 160);
    }

    #[test]
    fn test_intermediate_file_removed_and_output_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = wav_bytes(16_000, 1, 16, 0.1);

        let canonical = Normalizer::new(None)
            .with_temp_dir(dir.path())
            .transcode(&bytes, AudioKind::Ogg)
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        drop(canonical);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_undecodable_upload_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Normalizer::new(None)
            .with_temp_dir(dir.path())
            .normalize_upload(b"not audio at all", "audio/mpeg", Some("clip.mp3"));

        assert!(matches!(result, Err(ConversionError::Decode(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unsupported_type_and_empty_upload() {
        let normalizer = Normalizer::new(None);
        assert!(matches!(
            normalizer.normalize_upload(b"abc", "video/webm", None),
            Err(ConversionError::UnsupportedType(_))
        ));
        assert!(matches!(
            normalizer.normalize(&[], AudioKind::Wav),
            Err(ConversionError::EmptyUpload)
        ));
    }
}
