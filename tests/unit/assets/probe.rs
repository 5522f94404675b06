use std::io::Cursor;

use super::*;

fn wav_bytes(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut w = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for s in samples {
            w.write_sample(*s).unwrap();
        }
        w.finalize().unwrap();
    }
    cursor.into_inner()
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([9, 9, 9, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn probe_image_reads_dimensions() {
    let meta = probe_image(&png_bytes(3, 2), "png").unwrap();
    assert_eq!(meta, ImageMeta { width: 3, height: 2 });
}

#[test]
fn probe_image_rejects_garbage() {
    let err = probe_image(b"definitely not an image", "png").unwrap_err();
    assert!(matches!(err, MoodspaceError::Conversion(_)));
}

#[test]
fn probe_image_accepts_opaque_formats_without_decoding() {
    assert_eq!(probe_image(b"opaque", "HEIC").unwrap(), ImageMeta::default());
}

#[test]
fn probe_sound_reads_wav_duration() {
    let bytes = wav_bytes(1000, 2, &vec![0i16; 2 * 1500]);
    let dur = probe_sound(&bytes, "wav").unwrap().unwrap();
    assert!((dur - 1.5).abs() < 1e-9);
}

#[test]
fn probe_sound_skips_unprobed_containers_and_rejects_bad_wav() {
    assert_eq!(probe_sound(b"id3", "mp3").unwrap(), None);
    assert!(matches!(
        probe_sound(b"RIFFnope", "wav").unwrap_err(),
        MoodspaceError::Conversion(_)
    ));
}

#[test]
fn classify_channel_uses_threshold() {
    assert_eq!(classify_channel(None, 10.0), SoundChannel::Foley);
    assert_eq!(classify_channel(Some(2.0), 10.0), SoundChannel::Foley);
    assert_eq!(classify_channel(Some(10.0), 10.0), SoundChannel::Ambient);
}

#[test]
fn peak_envelope_normalizes_to_loudest_bin() {
    // Mono, 4 frames into 2 bins: peaks 0.2 and 0.8.
    let env = peak_envelope(&[0.1, 0.2, 0.8, 0.4], 1, 4, 2);
    assert_eq!(env.len(), 2);
    assert!((env[0] - 0.25).abs() < 1e-6);
    assert!((env[1] - 1.0).abs() < 1e-6);
}

#[test]
fn peak_envelope_of_silence_is_zero() {
    let env = peak_envelope(&[0.0; 8], 2, 4, 16);
    assert_eq!(env, vec![0.0; 16]);
    assert_eq!(peak_envelope(&[], 1, 0, 4), vec![0.0; 4]);
}

#[test]
fn extract_waveform_from_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("ramp.wav");
    let samples: Vec<i16> = (0..800).map(|i| (i * 40) as i16).collect();
    std::fs::write(&path, wav_bytes(8000, 1, &samples)).unwrap();

    let env = extract_waveform(&path, 8).unwrap().unwrap();
    assert_eq!(env.len(), 8);
    assert!(env.iter().all(|v| (0.0..=1.0).contains(v)));
    assert!((env[7] - 1.0).abs() < 1e-6);
    assert!(env.windows(2).all(|w| w[0] <= w[1]));

    let mp3 = tmp.path().join("x.mp3");
    std::fs::write(&mp3, b"id3").unwrap();
    assert_eq!(extract_waveform(&mp3, 8).unwrap(), None);
}
