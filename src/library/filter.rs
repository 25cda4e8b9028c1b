//! Second-order IIR filters with RBJ cookbook coefficients.
//!
//! `lpf|hpf|bpf|bsf(signal, cutoff = 200, q = 1)`

use crate::engine::program::Args;
use crate::math;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    LowPass,
    HighPass,
    BandPass,
    BandStop,
}

#[derive(Debug, Default)]
pub struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadState {
    fn process(&mut self, kind: Kind, input: f32, cutoff: f32, q: f32, sample_rate: f32) -> f32 {
        if !input.is_finite() || !cutoff.is_finite() || !q.is_finite() {
            *self = Self::default();
            return f32::NAN;
        }
        if cutoff <= 0.0 || q <= 0.0 {
            return 0.0;
        }

        let w0 = cutoff / sample_rate;
        let cs = math::sin(math::wrap(w0 + 0.25));
        let sn = math::sin(math::wrap(w0));
        let alpha = sn / (2.0 * q);

        let (b0, b1, b2) = match kind {
            Kind::LowPass => ((1.0 - cs) / 2.0, 1.0 - cs, (1.0 - cs) / 2.0),
            Kind::HighPass => ((1.0 + cs) / 2.0, -(1.0 + cs), (1.0 + cs) / 2.0),
            Kind::BandPass => (alpha, 0.0, -alpha),
            Kind::BandStop => (1.0, -2.0 * cs, 1.0),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cs;
        let a2 = 1.0 - alpha;

        let out = (b0 * input + b1 * self.x1 + b2 * self.x2 - a1 * self.y1 - a2 * self.y2) / a0;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = out;
        out
    }
}

fn filter(kind: Kind, args: &mut Args, state: &mut BiquadState) -> f32 {
    let signal = args.get(0, f32::NAN);
    let cutoff = args.get(1, 200.0);
    let q = args.get(2, 1.0);
    state.process(kind, signal, cutoff, q, args.sample_rate())
}

pub fn lpf(args: &mut Args, state: &mut BiquadState) -> f32 {
    filter(Kind::LowPass, args, state)
}

pub fn hpf(args: &mut Args, state: &mut BiquadState) -> f32 {
    filter(Kind::HighPass, args, state)
}

pub fn bpf(args: &mut Args, state: &mut BiquadState) -> f32 {
    filter(Kind::BandPass, args, state)
}

pub fn bsf(args: &mut Args, state: &mut BiquadState) -> f32 {
    filter(Kind::BandStop, args, state)
}
