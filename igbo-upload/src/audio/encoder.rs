//! WAV encoding and optional resampling of decoded uploads

use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};
use std::path::Path;
use tracing::debug;

use super::{ConversionError, DecodedAudio};

/// Write decoded audio as 16-bit PCM WAV, keeping rate and channel count
pub fn write_wav(audio: &DecodedAudio, path: &Path) -> Result<(), ConversionError> {
    let spec = hound::WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| ConversionError::Encode(e.to_string()))?;

    for &sample in &audio.samples {
        let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer
            .write_sample(scaled)
            .map_err(|e| ConversionError::Encode(e.to_string()))?;
    }

    writer
        .finalize()
        .map_err(|e| ConversionError::Encode(e.to_string()))?;
    Ok(())
}

/// Resample interleaved audio to `target_rate` with rubato sinc interpolation
///
/// Audio already at the target rate is returned unchanged.
pub fn resample(audio: DecodedAudio, target_rate: u32) -> Result<DecodedAudio, ConversionError> {
    if audio.sample_rate == target_rate || audio.samples.is_empty() {
        return Ok(audio);
    }

    let channels = audio.channels as usize;
    let num_frames = audio.frames();

    // De-interleave into per-channel buffers
    let mut input: Vec<Vec<f32>> = (0..channels).map(|_| Vec::with_capacity(num_frames)).collect();
    for frame in audio.samples.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            input[ch].push(sample);
        }
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = target_rate as f64 / audio.sample_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, num_frames, channels)
        .map_err(|e| ConversionError::Resample(e.to_string()))?;

    let output = resampler
        .process(&input, None)
        .map_err(|e| ConversionError::Resample(e.to_string()))?;

    let output_frames = output.first().map(Vec::len).unwrap_or(0);
    let mut samples = Vec::with_capacity(output_frames * channels);
    for i in 0..output_frames {
        for channel in &output {
            samples.push(channel[i]);
        }
    }

    debug!(
        "Resampled {} frames ({} Hz) → {} frames ({} Hz)",
        num_frames, audio.sample_rate, output_frames, target_rate
    );

    Ok(DecodedAudio {
        samples,
        sample_rate: target_rate,
        channels: audio.channels,
    })
}
