//! PCM players: the built-in `tr808` drums and `piano`, plus user samples
//! registered on the [`Library`](super::Library) and read through a
//! [`SampleLoader`].
//!
//! Every player keeps a fractional read position. Any non-finite argument
//! rewinds it and returns NaN, which is how a sequencer gap retriggers a hit:
//! `tr808(BD, seq(120, 1))`.

use super::SampleId;
use crate::engine::program::Args;
use crate::instrument::Pcm;
use crate::math;

/// Source of user sample frames.
///
/// `variant` selects one of several recordings under the same name;
/// exhausted or unknown samples return NaN.
pub trait SampleLoader: Send + Sync {
    fn load(&self, name: &str, variant: i32, frame: i32) -> f32;
}

#[derive(Debug, Default)]
pub struct PlayerState {
    pos: f32,
}

impl PlayerState {
    /// Read the current frame of `pcm`, then advance by `speed`.
    fn play(&mut self, pcm: &Pcm, speed: f32) -> f32 {
        match pcm.get(self.pos as usize) {
            Some(x) => {
                self.advance(speed);
                x
            }
            None => 0.0,
        }
    }

    /// A speed too large to represent runs the player off the end.
    fn advance(&mut self, speed: f32) {
        if speed.is_finite() {
            self.pos += speed;
        } else {
            self.pos = f32::INFINITY;
        }
    }
}

/// Playback speed for a pitch shift in semitones.
fn speed(shift: f32) -> f32 {
    math::pow2(shift / 12.0)
}

/// `tr808(drum, volume = 1, shift = 0)`.
pub fn tr808(args: &mut Args, state: &mut PlayerState) -> f32 {
    let drum = args.get(0, f32::NAN);
    let volume = args.get(1, 1.0);
    let shift = args.get(2, 0.0);
    if !drum.is_finite() || !volume.is_finite() || !shift.is_finite() {
        state.pos = 0.0;
        return f32::NAN;
    }
    let drums = args.library().drums();
    if drums.is_empty() {
        return 0.0;
    }
    let index = (drum as i64).rem_euclid(drums.len() as i64) as usize;
    match drums.get(index) {
        Some(pcm) => state.play(pcm, speed(shift)) * volume,
        None => 0.0,
    }
}

/// `piano(freq)`.
pub fn piano(args: &mut Args, state: &mut PlayerState) -> f32 {
    let freq = args.get(0, f32::NAN);
    if !freq.is_finite() {
        state.pos = 0.0;
        return f32::NAN;
    }
    if freq == 0.0 {
        return 0.0;
    }
    let freq = freq.abs();
    match args.library().piano().pick(freq) {
        Some((base, pcm)) => state.play(pcm, freq / base),
        None => 0.0,
    }
}

/// `<name>(variant, volume = 1, shift = 0)` for a registered sample.
pub fn sample(args: &mut Args, state: &mut PlayerState, id: SampleId) -> f32 {
    let lib = args.library();
    let (Some(loader), Some(name)) = (lib.loader(), lib.sample_name(id)) else {
        return f32::NAN;
    };
    let variant = args.get(0, f32::NAN);
    let volume = args.get(1, 1.0);
    let shift = args.get(2, 0.0);
    if !variant.is_finite() || !volume.is_finite() || !shift.is_finite() {
        state.pos = 0.0;
        return f32::NAN;
    }
    let x = loader.load(name, variant as i32, state.pos as i32);
    if x.is_nan() {
        return 0.0;
    }
    state.advance(speed(shift));
    x * volume
}
