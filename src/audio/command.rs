//! Commands sent from control threads to the audio thread via ring buffer.

use std::sync::{Arc, Mutex, PoisonError};

use ringbuf::traits::Producer;
use ringbuf::HeapProd;

use super::AudioError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCommand {
    /// Set master volume (clamped to 0.0..=1.0 on the audio thread).
    SetVolume(f32),

    /// Silence the output without stopping the engine.
    Mute(bool),
}

/// Cloneable sending end of the command queue. Control threads share it;
/// the audio thread owns the consumer.
#[derive(Clone)]
pub struct AudioControl {
    producer: Arc<Mutex<HeapProd<AudioCommand>>>,
}

impl AudioControl {
    pub fn new(producer: HeapProd<AudioCommand>) -> Self {
        Self {
            producer: Arc::new(Mutex::new(producer)),
        }
    }

    pub fn send(&self, command: AudioCommand) -> Result<(), AudioError> {
        self.producer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_push(command)
            .map_err(|_| AudioError::BufferFull)
    }

    pub fn set_volume(&self, volume: f32) -> Result<(), AudioError> {
        self.send(AudioCommand::SetVolume(volume))
    }

    pub fn set_muted(&self, muted: bool) -> Result<(), AudioError> {
        self.send(AudioCommand::Mute(muted))
    }
}
