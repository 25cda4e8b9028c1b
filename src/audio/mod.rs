//! Audio output: a cpal stream pulling samples from the shared engine.
//!
//! The cpal callback owns an [`AudioCallback`](callback::AudioCallback) that
//! fills each output buffer from a [`SharedEngine`]. Control threads adjust
//! volume and mute through a lock-free ring buffer of [`AudioCommand`]s.

pub mod callback;
pub mod command;
pub mod limiter;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{traits::Split, HeapRb};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

pub use command::{AudioCommand, AudioControl};
pub use limiter::Limiter;

use crate::engine::SharedEngine;
use callback::AudioCallback;

/// Ring buffer capacity (number of commands).
const RING_BUFFER_CAPACITY: usize = 64;

/// The `audio` section of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames per callback. 0 lets the device decide.
    pub buffer_size: u32,
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 512,
            volume: 1.0,
        }
    }
}

/// Audio engine errors.
#[derive(Debug)]
pub enum AudioError {
    /// No audio output device found.
    NoOutputDevice,
    /// Failed to query device configuration.
    DeviceConfig(String),
    /// Failed to build the audio stream.
    StreamBuild(String),
    /// Failed to start the audio stream.
    StreamPlay(String),
    /// The command queue is full; the audio thread is not draining it.
    BufferFull,
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::NoOutputDevice => write!(f, "no audio output device found"),
            AudioError::DeviceConfig(e) => write!(f, "device config error: {e}"),
            AudioError::StreamBuild(e) => write!(f, "stream build error: {e}"),
            AudioError::StreamPlay(e) => write!(f, "stream play error: {e}"),
            AudioError::BufferFull => write!(f, "audio command ring buffer is full"),
        }
    }
}

impl std::error::Error for AudioError {}

/// A running output stream. Dropping it stops playback.
pub struct AudioEngine {
    _stream: cpal::Stream,
    control: AudioControl,
}

impl AudioEngine {
    /// Open the default output device with `config` and start pulling
    /// samples from `engine`.
    pub fn start(engine: SharedEngine, config: &AudioConfig) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;
        let name = device.name().unwrap_or_else(|_| "unknown".to_string());
        check_supported(&device, config)?;

        let (producer, consumer) = HeapRb::<AudioCommand>::new(RING_BUFFER_CAPACITY).split();
        let mut audio_callback =
            AudioCallback::new(consumer, engine, config.channels, config.volume);

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: match config.buffer_size {
                0 => cpal::BufferSize::Default,
                n => cpal::BufferSize::Fixed(n),
            },
        };

        let err_fn = |err: cpal::StreamError| {
            error!("audio stream error: {err}");
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    audio_callback.process(data);
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))?;

        info!(
            device = %name,
            sample_rate = config.sample_rate,
            channels = config.channels,
            "audio output started"
        );
        Ok(Self {
            _stream: stream,
            control: AudioControl::new(producer),
        })
    }

    /// Handle for changing volume and mute from other threads.
    pub fn control(&self) -> AudioControl {
        self.control.clone()
    }

    /// Names of the output devices of the default host.
    pub fn list_devices() -> Vec<String> {
        let host = cpal::default_host();
        match host.output_devices() {
            Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Reject configs the device cannot open as an `f32` stream. Backends that
/// cannot enumerate their configs get the benefit of the doubt.
fn check_supported(device: &cpal::Device, config: &AudioConfig) -> Result<(), AudioError> {
    if config.channels == 0 {
        return Err(AudioError::DeviceConfig("channel count must be positive".into()));
    }
    let Ok(mut ranges) = device.supported_output_configs() else {
        warn!("could not query output configs, trying anyway");
        return Ok(());
    };
    let supported = ranges.any(|range| {
        range.channels() == config.channels
            && range.sample_format() == cpal::SampleFormat::F32
            && range.min_sample_rate().0 <= config.sample_rate
            && config.sample_rate <= range.max_sample_rate().0
    });
    if supported {
        Ok(())
    } else {
        Err(AudioError::DeviceConfig(format!(
            "{} Hz, {} channel f32 output not supported",
            config.sample_rate, config.channels
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    #[test]
    #[ignore] // needs an audio device
    fn test_audio_engine_start() {
        let shared = SharedEngine::new(Engine::new(44100));
        shared.compile("sin(hz(0)) * 0.1").unwrap();
        let audio = AudioEngine::start(shared, &AudioConfig::default()).unwrap();
        let control = audio.control();
        assert!(control.set_volume(0.5).is_ok());
        assert!(control.set_muted(true).is_ok());
    }

    #[test]
    fn test_audio_error_display() {
        assert_eq!(
            AudioError::NoOutputDevice.to_string(),
            "no audio output device found"
        );
        assert_eq!(
            AudioError::BufferFull.to_string(),
            "audio command ring buffer is full"
        );
        assert_eq!(
            AudioError::DeviceConfig("test".to_string()).to_string(),
            "device config error: test"
        );
    }

    #[test]
    fn test_audio_config_defaults_fill_gaps() {
        let config: AudioConfig = serde_yaml::from_str("sample_rate: 48000\n").unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.channels, 2);
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.volume, 1.0);
    }
}
