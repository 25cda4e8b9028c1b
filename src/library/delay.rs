//! Feedback delay line.
//!
//! `delay(signal, time = 0, level = 0, feedback = 0)`: `time` in seconds,
//! at most [`MAX_TIME`]. The buffer grows in blocks of [`BLOCK`] samples
//! and never shrinks, so sweeping `time` down and back up does not
//! reallocate.

use crate::engine::program::Args;

/// Longest supported delay, in seconds.
pub const MAX_TIME: f32 = 10.0;

/// Buffer growth granularity, in samples.
pub const BLOCK: usize = 8192;

#[derive(Debug, Default)]
pub struct DelayState {
    buf: Vec<f32>,
    pos: usize,
}

impl DelayState {
    /// Make room for `n` samples of history. Returns `false` when the
    /// allocation fails.
    fn reserve(&mut self, n: usize) -> bool {
        if self.buf.len() >= n {
            return true;
        }
        let len = (n / BLOCK + 1) * BLOCK;
        if self.buf.try_reserve_exact(len - self.buf.len()).is_err() {
            return false;
        }
        self.buf.resize(len, 0.0);
        true
    }
}

pub fn delay(args: &mut Args, state: &mut DelayState) -> f32 {
    let signal = args.get(0, f32::NAN);
    let time = args.get(1, 0.0);
    let level = args.get(2, 0.0);
    let feedback = args.get(3, 0.0).clamp(0.0, 1.0);

    if time.is_nan() || time <= 0.0 {
        return signal;
    }
    let time = time.min(MAX_TIME);
    let n = (time * args.sample_rate()) as usize;
    // Shorter than one sample: nothing to delay by.
    if n == 0 || !state.reserve(n) {
        return signal;
    }

    let len = state.buf.len();
    let out = state.buf[(state.pos + len - n) % len] * level;
    let signal = if signal.is_nan() { 0.0 } else { signal };
    state.buf[state.pos] = state.buf[state.pos] * feedback + signal;
    state.pos = (state.pos + 1) % len;
    signal + out
}
