//! Instruments: 16-bit PCM banks for the built-in drum and piano players,
//! their synthetic generators, and WAV loading for user samples.

pub mod sample;
pub mod synth;

pub use sample::{SampleData, SampleError, WavLibrary};
pub use synth::{build_piano, build_tr808};

/// Drum voices of the TR-808 bank, in index order. Each name is also a
/// script constant holding its index.
pub const DRUM_NAMES: [&str; 9] = ["BD", "SD", "MT", "MA", "RS", "CP", "CB", "OH", "HH"];

/// A mono 16-bit PCM buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pcm {
    frames: Vec<i16>,
}

impl Pcm {
    /// Quantize float samples in `[-1, 1]`; values outside are clipped.
    pub fn from_f32(samples: &[f32]) -> Self {
        let frames = samples
            .iter()
            .map(|s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16)
            .collect();
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame `index` as a float in `[-1, 1)`, or `None` past the end.
    #[inline]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.frames.get(index).map(|v| *v as f32 / 32768.0)
    }
}

/// An indexed set of one-shot PCM voices.
#[derive(Debug, Clone, Default)]
pub struct PcmBank {
    voices: Vec<Pcm>,
}

impl PcmBank {
    pub fn new(voices: Vec<Pcm>) -> Self {
        Self { voices }
    }

    pub fn get(&self, index: usize) -> Option<&Pcm> {
        self.voices.get(index)
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

/// Piano notes recorded at a few pitches; other pitches are played by
/// resampling the closest recording.
#[derive(Debug, Clone, Default)]
pub struct PianoBank {
    /// `(base frequency, pcm)`, ascending by frequency.
    notes: Vec<(f32, Pcm)>,
}

/// Frequencies below which each recording is used instead of the next one.
const PIANO_SPLITS: [f32; 2] = [130.0, 523.0];

impl PianoBank {
    pub fn new(notes: Vec<(f32, Pcm)>) -> Self {
        Self { notes }
    }

    /// The recording to play `freq` from, with its base frequency.
    pub fn pick(&self, freq: f32) -> Option<(f32, &Pcm)> {
        let index = PIANO_SPLITS.iter().take_while(|split| freq >= **split).count();
        let (base, pcm) = self.notes.get(index).or_else(|| self.notes.last())?;
        Some((*base, pcm))
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
