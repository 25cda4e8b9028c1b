//! Karplus-Strong plucked string.
//!
//! `pluck(freq, decay = 0.5, excitation?)`: on trigger the delay line is
//! filled with `excitation` (evaluated once per slot) or white noise, then
//! recirculated through a two-point averaging filter weighted by `decay`.

use crate::engine::program::Args;

#[derive(Debug, Default)]
pub struct PluckState {
    buf: Vec<f32>,
    pos: usize,
    armed: bool,
}

pub fn pluck(args: &mut Args, state: &mut PluckState) -> f32 {
    let freq = args.get(0, f32::NAN);
    let decay = args.get(1, 0.5);

    if !freq.is_finite() {
        state.armed = false;
        return f32::NAN;
    }
    if freq == 0.0 {
        return 0.0;
    }
    let n = (args.sample_rate() / freq.abs()) as usize;
    if n == 0 {
        return 0.0;
    }

    if !state.armed {
        state.buf.clear();
        if state.buf.try_reserve(n).is_err() {
            return 0.0;
        }
        match args.node(2) {
            Some(excitation) => {
                for _ in 0..n {
                    let v = args.eval(excitation);
                    state.buf.push(v);
                }
            }
            None => {
                for _ in 0..n {
                    let v = args.random() * 2.0 - 1.0;
                    state.buf.push(v);
                }
            }
        }
        state.pos = 0;
        state.armed = true;
    }

    // The period follows the current frequency; shrinking it reuses the head
    // of the line, growing it is deferred until the next trigger.
    let n = n.min(state.buf.len());
    let i = state.pos % n;
    let x = state.buf[i];
    let y = state.buf[(i + 1) % n];
    state.pos = (i + 1) % n;
    state.buf[state.pos] = x * decay + y * (1.0 - decay);
    x
}
