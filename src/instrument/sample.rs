//! User samples: WAV decoding, mono conversion, linear-interpolation
//! resampling, and a directory-backed [`SampleLoader`].

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::library::SampleLoader;

/// Errors that can occur when loading or converting samples.
#[derive(Debug)]
pub enum SampleError {
    /// WAV decoding error.
    Wav(hound::Error),
    /// Directory or file access failed.
    Io(std::io::Error),
    /// The WAV file contains no samples.
    Empty,
    /// Unsupported channel count or bit depth.
    UnsupportedFormat(String),
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::Wav(e) => write!(f, "WAV error: {e}"),
            SampleError::Io(e) => write!(f, "I/O error: {e}"),
            SampleError::Empty => write!(f, "WAV file contains no samples"),
            SampleError::UnsupportedFormat(s) => write!(f, "unsupported format: {s}"),
        }
    }
}

impl std::error::Error for SampleError {}

impl From<hound::Error> for SampleError {
    fn from(e: hound::Error) -> Self {
        SampleError::Wav(e)
    }
}

impl From<std::io::Error> for SampleError {
    fn from(e: std::io::Error) -> Self {
        SampleError::Io(e)
    }
}

/// A mono audio sample buffer at a known sample rate.
#[derive(Debug, Clone)]
pub struct SampleData {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleData {
    /// Create from raw mono f32 samples.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Load a WAV file from a reader, converting to mono f32 at `target_sample_rate`.
    ///
    /// Integer (8 to 32 bit) and 32-bit float WAV formats are supported.
    /// Multi-channel files are mixed down by averaging channels.
    pub fn from_wav<R: Read + Seek>(
        reader: R,
        target_sample_rate: u32,
    ) -> Result<Self, SampleError> {
        let wav = hound::WavReader::new(reader)?;
        let spec = wav.spec();
        let channels = spec.channels as usize;
        if channels == 0 {
            return Err(SampleError::UnsupportedFormat("zero channels".into()));
        }
        let source_rate = spec.sample_rate;

        let raw_samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let bits = spec.bits_per_sample;
                if !(1..=32).contains(&bits) {
                    return Err(SampleError::UnsupportedFormat(format!("{bits}-bit PCM")));
                }
                let max_val = (1u64 << (bits - 1)) as f32;
                wav.into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<Vec<f32>, _>>()?
            }
            hound::SampleFormat::Float => {
                wav.into_samples::<f32>().collect::<Result<Vec<f32>, _>>()?
            }
        };

        if raw_samples.is_empty() {
            return Err(SampleError::Empty);
        }

        let mono: Vec<f32> = raw_samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        let resampled = if source_rate == target_sample_rate {
            mono
        } else {
            resample_linear(&mono, source_rate, target_sample_rate)
        };

        Ok(Self {
            samples: resampled,
            sample_rate: target_sample_rate,
        })
    }

    /// Load a WAV file from disk.
    pub fn from_path(path: &Path, target_sample_rate: u32) -> Result<Self, SampleError> {
        let file = File::open(path)?;
        Self::from_wav(BufReader::new(file), target_sample_rate)
    }

    /// The mono sample buffer.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Linear-interpolation resampling from `source_rate` to `target_rate`.
fn resample_linear(input: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if input.is_empty() {
        return Vec::new();
    }
    if input.len() == 1 {
        return vec![input[0]];
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let output_len = ((input.len() as f64 / ratio).ceil()) as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 * ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < input.len() {
            input[idx] * (1.0 - frac) + input[idx + 1] * frac
        } else {
            input[idx.min(input.len() - 1)]
        };
        output.push(sample);
    }

    output
}

/// Samples loaded from a directory tree.
///
/// ```text
/// samples/
///   kick/      -> kick(0), kick(1), ... in file-name order
///     a.wav
///     b.wav
///   vox/
///     hello.wav
/// ```
///
/// Every subdirectory with at least one decodable `.wav` file becomes one
/// sample function; files that fail to decode are skipped with a warning.
#[derive(Debug, Default)]
pub struct WavLibrary {
    samples: BTreeMap<String, Vec<SampleData>>,
}

impl WavLibrary {
    /// Scan `dir`, decoding everything at `sample_rate`.
    pub fn load(dir: &Path, sample_rate: u32) -> Result<Self, SampleError> {
        let mut samples = BTreeMap::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let variants = load_variants(&path, sample_rate)?;
            if variants.is_empty() {
                debug!(name, "no WAV files, skipping");
                continue;
            }
            debug!(name, variants = variants.len(), "loaded sample");
            samples.insert(name.to_string(), variants);
        }
        Ok(Self { samples })
    }

    /// Insert variants directly, replacing any existing sample of that name.
    pub fn insert(&mut self, name: impl Into<String>, variants: Vec<SampleData>) {
        self.samples.insert(name.into(), variants);
    }

    /// Sample function names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    pub fn variants(&self, name: &str) -> usize {
        self.samples.get(name).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn load_variants(dir: &Path, sample_rate: u32) -> Result<Vec<SampleData>, SampleError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
        })
        .collect();
    files.sort();

    let mut variants = Vec::with_capacity(files.len());
    for file in files {
        match SampleData::from_path(&file, sample_rate) {
            Ok(data) => variants.push(data),
            Err(e) => warn!(path = %file.display(), error = %e, "skipping sample"),
        }
    }
    Ok(variants)
}

impl SampleLoader for WavLibrary {
    /// Variants wrap around; frames past the end (or before the start) are
    /// NaN.
    fn load(&self, name: &str, variant: i32, frame: i32) -> f32 {
        let Some(variants) = self.samples.get(name) else {
            return f32::NAN;
        };
        if variants.is_empty() || frame < 0 {
            return f32::NAN;
        }
        let index = variant.rem_euclid(variants.len() as i32) as usize;
        variants[index]
            .samples()
            .get(frame as usize)
            .copied()
            .unwrap_or(f32::NAN)
    }
}
