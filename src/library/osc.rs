//! Phase-accumulator oscillators: `sin`, `tri`, `saw`, `sqr`.
//!
//! Each call outputs the waveform at the current phase and then advances by
//! `freq / sample_rate`, so a frequency change is heard from the next sample
//! on. A non-finite frequency returns NaN and leaves the phase where it was.

use crate::engine::program::Args;
use crate::math;

#[derive(Debug, Default)]
pub struct OscState {
    pub(crate) phase: f32,
}

impl OscState {
    /// Return the pre-advance phase, or `None` for an unusable frequency.
    #[inline]
    fn step(&mut self, freq: f32, sample_rate: f32) -> Option<f32> {
        if !freq.is_finite() {
            return None;
        }
        let w = self.phase;
        self.phase = math::wrap(w + freq / sample_rate);
        Some(w)
    }
}

pub fn sin(args: &mut Args, state: &mut OscState) -> f32 {
    let freq = args.get(0, f32::NAN);
    match state.step(freq, args.sample_rate()) {
        Some(w) => math::sin(w),
        None => f32::NAN,
    }
}

pub fn tri(args: &mut Args, state: &mut OscState) -> f32 {
    let freq = args.get(0, f32::NAN);
    match state.step(freq, args.sample_rate()) {
        Some(w) => 4.0 * (0.25 - (math::wrap(w + 0.25) - 0.5).abs()),
        None => f32::NAN,
    }
}

pub fn saw(args: &mut Args, state: &mut OscState) -> f32 {
    let freq = args.get(0, f32::NAN);
    match state.step(freq, args.sample_rate()) {
        Some(w) => 2.0 * math::wrap(w + 0.5) - 1.0,
        None => f32::NAN,
    }
}

/// `sqr(freq, duty = 0.5)`.
pub fn sqr(args: &mut Args, state: &mut OscState) -> f32 {
    let freq = args.get(0, f32::NAN);
    let duty = args.get(1, 0.5);
    match state.step(freq, args.sample_rate()) {
        Some(w) if w < duty => 1.0,
        Some(_) => -1.0,
        None => f32::NAN,
    }
}
