//! Fixed-slot polyphony.
//!
//! Nine voices are exposed to scripts as `k0..k8` (key, semitones from A4),
//! `v0..v8` (amplitude) and `g0..g8` (gate). An idle voice has a NaN key; a
//! released voice has a NaN gate and an amplitude that falls to silence,
//! after which the voice is idle again.

use super::vars::{VarId, VarTable};

/// Number of voice slots.
pub const VOICES: usize = 9;

/// Amplitude lost per second after release.
const RELEASE_RATE: f32 = 10.0;

/// Amplitude below which a released voice becomes idle.
const SILENCE: f32 = 0.01;

#[derive(Debug, Clone, Copy)]
struct Voice {
    key: VarId,
    amp: VarId,
    gate: VarId,
}

#[derive(Debug, Clone)]
pub struct VoiceBank {
    voices: [Voice; VOICES],
}

impl VoiceBank {
    /// Define the voice variables, all idle.
    pub fn new(vars: &mut VarTable) -> Self {
        let voices = std::array::from_fn(|i| Voice {
            key: vars.define(&format!("k{i}"), f32::NAN),
            amp: vars.define(&format!("v{i}"), f32::NAN),
            gate: vars.define(&format!("g{i}"), f32::NAN),
        });
        Self { voices }
    }

    /// Start a note in the first idle slot. Returns the slot, or `None` when
    /// all voices are busy and the note is dropped.
    pub fn note_on(&self, vars: &mut VarTable, note: u8, velocity: u8) -> Option<usize> {
        let slot = self.voices.iter().position(|v| vars.get(v.key).is_nan())?;
        let voice = self.voices[slot];
        let level = velocity as f32 / 128.0;
        vars.set(voice.key, note as f32 - 69.0);
        vars.set(voice.amp, level);
        vars.set(voice.gate, level);
        Some(slot)
    }

    /// Release the voice playing `note`, preferring one that is still held.
    pub fn note_off(&self, vars: &mut VarTable, note: u8) -> Option<usize> {
        let key = note as f32 - 69.0;
        let matches = |v: &Voice| vars.get(v.key) == key;
        let slot = self
            .voices
            .iter()
            .position(|v| matches(v) && !vars.get(v.gate).is_nan())
            .or_else(|| self.voices.iter().position(matches))?;
        vars.set(self.voices[slot].gate, f32::NAN);
        Some(slot)
    }

    /// Advance release decay by one sample.
    pub fn decay(&self, vars: &mut VarTable, sample_rate: f32) {
        let step = RELEASE_RATE / sample_rate;
        for voice in &self.voices {
            if !vars.get(voice.gate).is_nan() {
                continue;
            }
            let amp = vars.get(voice.amp);
            if amp.is_nan() {
                continue;
            }
            let amp = amp - step;
            if amp < SILENCE {
                vars.set(voice.key, f32::NAN);
                vars.set(voice.amp, f32::NAN);
            } else {
                vars.set(voice.amp, amp);
            }
        }
    }

    /// Silence and free every voice.
    pub fn reset(&self, vars: &mut VarTable) {
        for voice in &self.voices {
            vars.set(voice.key, f32::NAN);
            vars.set(voice.amp, f32::NAN);
            vars.set(voice.gate, f32::NAN);
        }
    }

    /// Number of voices with a key assigned.
    pub fn active(&self, vars: &VarTable) -> usize {
        self.voices
            .iter()
            .filter(|v| !vars.get(v.key).is_nan())
            .count()
    }
}
