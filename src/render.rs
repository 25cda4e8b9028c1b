//! Offline rendering to 16-bit WAV.

use std::io::{Seek, Write};
use std::path::Path;

use tracing::info;

use crate::audio::Limiter;
use crate::engine::Engine;

/// Frames rendered per engine call.
const BLOCK_FRAMES: usize = 1024;

/// Render `seconds` of audio from `engine` into a WAV file. Returns the
/// number of frames written.
pub fn render_to_file(
    engine: &mut Engine,
    path: &Path,
    seconds: f32,
    channels: u16,
) -> Result<u64, hound::Error> {
    let writer = hound::WavWriter::create(path, wav_spec(engine, channels))?;
    let frames = render_frames(engine, writer, seconds, channels)?;
    info!(path = %path.display(), frames, "rendered");
    Ok(frames)
}

/// Render into any seekable writer.
pub fn render_to_writer<W: Write + Seek>(
    engine: &mut Engine,
    out: W,
    seconds: f32,
    channels: u16,
) -> Result<u64, hound::Error> {
    let writer = hound::WavWriter::new(out, wav_spec(engine, channels))?;
    render_frames(engine, writer, seconds, channels)
}

fn wav_spec(engine: &Engine, channels: u16) -> hound::WavSpec {
    hound::WavSpec {
        channels: channels.max(1),
        sample_rate: engine.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn render_frames<W: Write + Seek>(
    engine: &mut Engine,
    mut writer: hound::WavWriter<W>,
    seconds: f32,
    channels: u16,
) -> Result<u64, hound::Error> {
    let channels = channels.max(1) as usize;
    let total = if seconds.is_finite() && seconds > 0.0 {
        (seconds as f64 * engine.sample_rate() as f64).round() as u64
    } else {
        0
    };
    let limiter = Limiter::default();
    let mut block = vec![0.0f32; BLOCK_FRAMES * channels];
    let mut remaining = total;

    while remaining > 0 {
        let frames = remaining.min(BLOCK_FRAMES as u64) as usize;
        let buf = &mut block[..frames * channels];
        engine.fill(buf, channels);
        limiter.process_block(buf);
        for &sample in buf.iter() {
            writer.write_sample((sample * i16::MAX as f32).round() as i16)?;
        }
        remaining -= frames as u64;
    }
    writer.finalize()?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn renders_requested_length() {
        let mut engine = Engine::new(8000);
        engine.compile("0.5").unwrap();
        let mut out = Cursor::new(Vec::new());
        let frames = render_to_writer(&mut engine, &mut out, 0.25, 2).unwrap();
        assert_eq!(frames, 2000);

        out.set_position(0);
        let reader = hound::WavReader::new(out).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 8000);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 4000);
        assert!(samples.iter().all(|&s| s == 16384));
    }

    #[test]
    fn output_is_limited() {
        let mut engine = Engine::new(8000);
        engine.compile("4").unwrap();
        let mut out = Cursor::new(Vec::new());
        render_to_writer(&mut engine, &mut out, 0.01, 1).unwrap();
        out.set_position(0);
        let reader = hound::WavReader::new(out).unwrap();
        let peak = (0.95 * i16::MAX as f32).round() as i16;
        assert!(reader.into_samples::<i16>().all(|s| s.unwrap() == peak));
    }

    #[test]
    fn zero_seconds_writes_an_empty_file() {
        let mut engine = Engine::new(8000);
        let mut out = Cursor::new(Vec::new());
        assert_eq!(render_to_writer(&mut engine, &mut out, 0.0, 1).unwrap(), 0);
    }
}
