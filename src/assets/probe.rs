//! Metadata extraction for imported payloads and stored files.
//!
//! Cheap probes (image dimensions, sound duration from the container header) run inline during
//! `add`/`reload`. Waveform extraction decodes every sample and is back-filled in parallel.

use std::{io::Cursor, path::Path};

use anyhow::Context;

use crate::{
    assets::model::{ImageMeta, SoundChannel},
    foundation::error::{MoodspaceError, MoodspaceResult},
};

/// Image extensions accepted without decoding; the bundled decoders cannot read them.
const OPAQUE_IMAGE_EXTENSIONS: &[&str] = &["heic"];

/// Decode an image header from memory and return its pixel dimensions.
pub fn probe_image(bytes: &[u8], ext: &str) -> MoodspaceResult<ImageMeta> {
    if OPAQUE_IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
        return Ok(ImageMeta::default());
    }
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("guess image format")
        .and_then(|r| r.into_dimensions().context("decode image header"))
        .map_err(|e| MoodspaceError::conversion(format!("{e:#}")))?;
    Ok(ImageMeta { width, height })
}

/// Sound duration in seconds from an in-memory payload; `None` for containers without a probe.
pub fn probe_sound(bytes: &[u8], ext: &str) -> MoodspaceResult<Option<f64>> {
    if !is_wav(ext) {
        return Ok(None);
    }
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| MoodspaceError::conversion(format!("decode wav header: {e}")))?;
    Ok(Some(wav_duration_sec(&reader)))
}

/// Sound duration in seconds for a stored file.
pub fn probe_sound_file(path: &Path) -> MoodspaceResult<Option<f64>> {
    if !is_wav(extension_of(path)) {
        return Ok(None);
    }
    let reader = hound::WavReader::open(path).map_err(|e| {
        MoodspaceError::conversion(format!("decode wav header '{}': {e}", path.display()))
    })?;
    Ok(Some(wav_duration_sec(&reader)))
}

/// Classify a sound by duration: long beds are ambient, everything else foley.
pub fn classify_channel(duration_sec: Option<f64>, ambient_threshold_sec: f64) -> SoundChannel {
    match duration_sec {
        Some(d) if d >= ambient_threshold_sec => SoundChannel::Ambient,
        _ => SoundChannel::Foley,
    }
}

/// Peak envelope of a stored sound, `bins` values normalized to `[0, 1]`.
///
/// Returns `Ok(None)` for containers that cannot be decoded here.
pub fn extract_waveform(path: &Path, bins: usize) -> MoodspaceResult<Option<Vec<f32>>> {
    if bins == 0 {
        return Err(MoodspaceError::validation("waveform bins must be >= 1"));
    }
    if !is_wav(extension_of(path)) {
        return Ok(None);
    }
    let mut reader = hound::WavReader::open(path).map_err(|e| {
        MoodspaceError::conversion(format!("open wav '{}': {e}", path.display()))
    })?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));
    let frames = reader.duration() as usize;

    let amplitudes: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f32::abs))
            .collect::<Result<Vec<f32>, hound::Error>>(),
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v as f32 * scale).abs()))
                .collect::<Result<Vec<f32>, hound::Error>>()
        }
    }
    .map_err(|e| MoodspaceError::conversion(format!("decode wav '{}': {e}", path.display())))?;

    Ok(Some(peak_envelope(&amplitudes, channels, frames, bins)))
}

/// Reduce interleaved absolute amplitudes to `bins` per-bin peaks, normalized by the loudest bin.
pub(crate) fn peak_envelope(
    amplitudes: &[f32],
    channels: usize,
    frames: usize,
    bins: usize,
) -> Vec<f32> {
    let mut out = vec![0.0f32; bins];
    if frames == 0 || channels == 0 {
        return out;
    }
    for (i, amp) in amplitudes.iter().enumerate() {
        let frame = i / channels;
        let bin = (frame * bins / frames).min(bins - 1);
        if *amp > out[bin] {
            out[bin] = *amp;
        }
    }
    let max = out.iter().copied().fold(0.0f32, f32::max);
    if max > 0.0 {
        for v in &mut out {
            *v = (*v / max).clamp(0.0, 1.0);
        }
    }
    out
}

fn wav_duration_sec<R: std::io::Read>(reader: &hound::WavReader<R>) -> f64 {
    let rate = reader.spec().sample_rate;
    if rate == 0 {
        return 0.0;
    }
    f64::from(reader.duration()) / f64::from(rate)
}

fn is_wav(ext: &str) -> bool {
    ext.eq_ignore_ascii_case("wav")
}

fn extension_of(path: &Path) -> &str {
    path.extension().and_then(|s| s.to_str()).unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/probe.rs"]
mod tests;
