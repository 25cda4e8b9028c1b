//! Attack/release envelope.
//!
//! `env(value | (gate, value), attack = 0.01, release = 10 * attack,
//! attack_curve = 0.5, release_curve = attack_curve)`
//!
//! Times are in seconds. A curvature of 0.5 is linear; lower values give a
//! slow start and a steep finish, higher values the opposite. A NaN gate
//! restarts the attack on the next sample.

use crate::engine::program::Args;
use crate::math;

const CURVE_MIN: f32 = 0.0001;
const CURVE_MAX: f32 = 0.9999;
const LINEAR_EPSILON: f32 = 0.0001;

/// One exponential segment: `acc = acc * mul + add` per sample.
#[derive(Debug, Default, Clone, Copy)]
struct Segment {
    samples: usize,
    mul: f32,
    add: f32,
}

impl Segment {
    /// A segment that goes from 0 to exactly 1 in `samples` steps.
    fn new(samples: usize, curve: f32) -> Self {
        if samples == 0 {
            return Self::default();
        }
        let curve = math::clamp(curve, CURVE_MIN, CURVE_MAX);
        let n = samples as f32;
        if (curve - 0.5).abs() > LINEAR_EPSILON {
            let s = (1.0 - curve) / curve;
            let mul = s.powf(2.0 / n);
            let add = (mul - 1.0) / (s * s - 1.0);
            Self { samples, mul, add }
        } else {
            Self {
                samples,
                mul: 1.0,
                add: 1.0 / n,
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct EnvState {
    t: usize,
    attack: Segment,
    release: Segment,
    attack_level: f32,
    release_level: f32,
}

pub fn env(args: &mut Args, state: &mut EnvState) -> f32 {
    let Some(first) = args.node(0) else {
        return f32::NAN;
    };
    let (gate, value) = match first.as_pair() {
        Some((gate, value)) => (args.eval(gate), args.eval(value)),
        None => {
            let v = args.eval(first);
            (v, v)
        }
    };

    if gate.is_nan() {
        state.t = 0;
        return f32::NAN;
    }

    if state.t == 0 {
        let sr = args.sample_rate();
        let attack = args.get(1, 0.01);
        let release = args.get(2, attack * 10.0);
        let attack_curve = args.get(3, 0.5);
        let release_curve = args.get(4, attack_curve);
        state.attack = Segment::new(seconds_to_samples(attack, sr), attack_curve);
        state.release = Segment::new(seconds_to_samples(release, sr), 1.0 - release_curve);
        state.attack_level = 0.0;
        state.release_level = 0.0;
    }

    let level = if state.t < state.attack.samples {
        state.attack_level = state.attack_level * state.attack.mul + state.attack.add;
        state.attack_level
    } else if state.t < state.attack.samples + state.release.samples {
        state.release_level = state.release_level * state.release.mul + state.release.add;
        1.0 - state.release_level
    } else {
        0.0
    };
    state.t = state.t.saturating_add(1);
    level * value
}

fn seconds_to_samples(seconds: f32, sample_rate: f32) -> usize {
    let n = seconds * sample_rate;
    if n.is_finite() && n > 0.0 {
        n as usize
    } else {
        0
    }
}
