//! Audio callback, run on the cpal audio thread.
//!
//! Drains commands from the ring buffer, pulls one buffer of samples from the
//! engine, applies volume and the master limiter.

use ringbuf::traits::Consumer;
use ringbuf::HeapCons;

use super::command::AudioCommand;
use super::limiter::Limiter;
use crate::engine::SharedEngine;

/// State that lives on the audio thread. Accessed only from the cpal callback.
pub struct AudioCallback {
    consumer: HeapCons<AudioCommand>,
    engine: SharedEngine,
    volume: f32,
    muted: bool,
    limiter: Limiter,
    channels: u16,
}

impl AudioCallback {
    pub fn new(
        consumer: HeapCons<AudioCommand>,
        engine: SharedEngine,
        channels: u16,
        volume: f32,
    ) -> Self {
        Self {
            consumer,
            engine,
            volume: volume.clamp(0.0, 1.0),
            muted: false,
            limiter: Limiter::default(),
            channels,
        }
    }

    /// Called by cpal for each output buffer.
    pub fn process(&mut self, output: &mut [f32]) {
        while let Some(cmd) = self.consumer.try_pop() {
            match cmd {
                AudioCommand::SetVolume(v) => self.volume = v.clamp(0.0, 1.0),
                AudioCommand::Mute(m) => self.muted = m,
            }
        }

        // The engine keeps running while muted so the transport stays in time.
        self.engine.fill(output, self.channels as usize);

        let gain = if self.muted { 0.0 } else { self.volume };
        for sample in output.iter_mut() {
            *sample *= gain;
        }
        self.limiter.process_block(output);
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}
