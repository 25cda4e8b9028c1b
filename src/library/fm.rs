//! Four-operator FM voice.
//!
//! `fm(freq, mf1, mi1, mf2, mi2, mf3, mi3)`: operator 3 modulates operator
//! 1, and operators 1 and 2 modulate the carrier. `mf` is a frequency ratio
//! to `freq`, `mi` a modulation index in cycles.

use crate::engine::program::Args;
use crate::math;

#[derive(Debug, Default)]
pub struct FmState {
    phases: [f32; 4],
    freq: f32,
    prev: f32,
    /// Armed by a NaN frequency; disarmed by resetting all phases at the
    /// next rising zero crossing.
    sync: bool,
}

pub fn fm(args: &mut Args, state: &mut FmState) -> f32 {
    let freq = args.get(0, f32::NAN);
    let mf1 = args.get(1, 0.0);
    let mi1 = args.get(2, 0.0);
    let mf2 = args.get(3, 0.0);
    let mi2 = args.get(4, 0.0);
    let mf3 = args.get(5, 0.0);
    let mi3 = args.get(6, 0.0);

    let step = state.freq / args.sample_rate();
    let ratios = [1.0, mf1, mf2, mf3];
    for (phase, ratio) in state.phases.iter_mut().zip(ratios) {
        *phase = math::wrap(*phase + ratio * step);
    }

    let [w0, w1, w2, w3] = state.phases;
    let v3 = mi3 * math::sin(w3);
    let v2 = mi2 * math::sin(w2);
    let v1 = mi1 * math::sin(w1 + v3);
    let out = math::sin(w0 + v1 + v2);

    if !freq.is_finite() {
        state.sync = true;
        return f32::NAN;
    }
    state.freq = freq;

    if state.sync && out >= 0.0 && state.prev <= 0.0 {
        state.sync = false;
        state.phases = [0.0; 4];
    }
    state.prev = out;
    out
}
