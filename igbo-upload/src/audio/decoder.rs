//! PCM extraction from compressed uploads using symphonia

use std::fs::File;
use std::path::Path;
use std::sync::OnceLock;
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{CodecRegistry, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia_adapter_libopus::OpusDecoder;
use tracing::{debug, warn};

use super::ConversionError;

/// Symphonia's bundled codecs plus libopus for Ogg/Opus voice notes
fn codec_registry() -> &'static CodecRegistry {
    static CODEC_REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();
    CODEC_REGISTRY.get_or_init(|| {
        let mut registry = CodecRegistry::new();
        registry.register_all::<OpusDecoder>();
        registry.register_all::<symphonia::default::codecs::MpaDecoder>();
        registry.register_all::<symphonia::default::codecs::PcmDecoder>();
        registry.register_all::<symphonia::default::codecs::VorbisDecoder>();
        registry.register_all::<symphonia::default::codecs::FlacDecoder>();
        registry.register_all::<symphonia::default::codecs::AdpcmDecoder>();
        registry.register_all::<symphonia::default::codecs::AacDecoder>();
        registry.register_all::<symphonia::default::codecs::AlacDecoder>();
        registry
    })
}

/// Decoded audio held in memory
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved PCM samples (f32, normalized -1.0 to 1.0)
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source
    pub channels: u16,
}

impl DecodedAudio {
    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Decode an entire audio file
///
/// The file extension is passed to format detection as a hint only; content wins.
/// Corrupt packets are skipped with a warning, anything else fails the decode.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, ConversionError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let detected = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| ConversionError::Decode(format!("unrecognized audio container: {}", e)))?;

    let mut format = detected.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ConversionError::Decode("no audio track found".to_string()))?;

    let track_id = track.id;
    let mut decoder = codec_registry()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| ConversionError::Decode(format!("unsupported codec: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut stream_spec: Option<SignalSpec> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(ConversionError::Decode(format!("failed to read packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => return Err(ConversionError::Decode(e.to_string())),
        };

        if decoded.frames() == 0 {
            continue;
        }

        let spec = *decoded.spec();
        match stream_spec {
            None => stream_spec = Some(spec),
            Some(existing) if existing != spec => {
                return Err(ConversionError::Decode(
                    "stream changes sample rate or channel layout mid-file".to_string(),
                ));
            }
            Some(_) => {}
        }

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    let spec = stream_spec.ok_or(ConversionError::NoAudio)?;
    let audio = DecodedAudio {
        samples,
        sample_rate: spec.rate,
        channels: spec.channels.count() as u16,
    };

    debug!(
        path = %path.display(),
        sample_rate = audio.sample_rate,
        channels = audio.channels,
        frames = audio.frames(),
        "Decoded upload ({:.2}s)",
        audio.duration_seconds()
    );

    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_of_interleaved_stereo() {
        let audio = DecodedAudio {
            samples: vec![0.0; 32_000],
            sample_rate: 16_000,
            channels: 2,
        };
        assert_eq!(audio.frames(), 16_000);
        assert!((audio.duration_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"definitely not an mp3 stream").unwrap();

        let err = decode_file(file.path()).unwrap_err();
        assert!(matches!(err, ConversionError::Decode(_)), "got {:?}", err);
    }
}
