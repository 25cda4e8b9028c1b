//! Math helpers for the per-sample hot path.
//!
//! Phases are measured in cycles (`0.0..1.0`), not radians. `sin` and `pow2`
//! are table-backed; the tables are built once per process.

use std::sync::OnceLock;

/// Sine table resolution (points per cycle).
pub const SIN_TABLE_SIZE: usize = 8192;

/// Power-of-two table resolution (points per octave).
pub const POW2_TABLE_SIZE: usize = 48;

/// Largest magnitude accepted by [`pow2`].
const POW2_DOMAIN: f32 = 126.0;

struct Tables {
    sin: Vec<f32>,
    pow2: Vec<f32>,
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| {
        // One guard point at the end of each table so interpolation never wraps.
        let sin = (0..=SIN_TABLE_SIZE)
            .map(|i| (i as f64 / SIN_TABLE_SIZE as f64 * std::f64::consts::TAU).sin() as f32)
            .collect();
        let pow2 = (0..=POW2_TABLE_SIZE)
            .map(|i| (i as f64 / POW2_TABLE_SIZE as f64).exp2() as f32)
            .collect();
        Tables { sin, pow2 }
    })
}

/// Fractional part in `[0, 1)`. Negative inputs wrap upward, so
/// `wrap(-0.25) == 0.75`. Non-finite inputs give NaN.
#[inline]
pub fn wrap(x: f32) -> f32 {
    let f = x - x.trunc() + 1.0;
    f - f.trunc()
}

/// Bipolar wrap into `[-0.5, 0.5)`.
#[inline]
pub fn wrap_bipolar(x: f32) -> f32 {
    wrap(x + 0.5) - 0.5
}

/// Sign of `x` as -1, 0 or 1. NaN stays NaN.
#[inline]
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x * 0.0
    }
}

/// Clamp `x` into `[lo, hi]`. A NaN bound means "no bound on that side".
#[inline]
pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    let x = if !lo.is_nan() && x < lo { lo } else { x };
    if !hi.is_nan() && x > hi {
        hi
    } else {
        x
    }
}

/// Sine of a phase given in cycles.
#[inline]
pub fn sin(phase: f32) -> f32 {
    if !phase.is_finite() {
        return f32::NAN;
    }
    let table = &tables().sin;
    let pos = wrap(phase) * SIN_TABLE_SIZE as f32;
    let idx = (pos as usize).min(SIN_TABLE_SIZE - 1);
    let frac = pos - idx as f32;
    table[idx] + (table[idx + 1] - table[idx]) * frac
}

/// `2^x`, table-backed over the fractional octave.
///
/// Returns NaN for non-finite inputs and for `|x| > 126`.
#[inline]
pub fn pow2(x: f32) -> f32 {
    if !x.is_finite() || x.abs() > POW2_DOMAIN {
        return f32::NAN;
    }
    let table = &tables().pow2;
    let octave = x.floor();
    let pos = (x - octave) * POW2_TABLE_SIZE as f32;
    let idx = (pos as usize).min(POW2_TABLE_SIZE - 1);
    let frac = pos - idx as f32;
    let mantissa = table[idx] + (table[idx + 1] - table[idx]) * frac;
    mantissa * 2.0f32.powi(octave as i32)
}

#[inline]
pub fn log2(x: f32) -> f32 {
    x.log2()
}

#[inline]
pub fn sqrt(x: f32) -> f32 {
    x.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn wrap_positive_and_negative() {
        assert_approx_eq!(wrap(0.25), 0.25);
        assert_approx_eq!(wrap(1.75), 0.75);
        assert_approx_eq!(wrap(-0.25), 0.75);
        assert_approx_eq!(wrap(-3.5), 0.5);
        assert_eq!(wrap(2.0), 0.0);
    }

    #[test]
    fn wrap_non_finite_is_nan() {
        assert!(wrap(f32::NAN).is_nan());
        assert!(wrap(f32::INFINITY).is_nan());
    }

    #[test]
    fn wrap_bipolar_range() {
        assert_approx_eq!(wrap_bipolar(0.75), -0.25);
        assert_approx_eq!(wrap_bipolar(0.25), 0.25);
        assert_approx_eq!(wrap_bipolar(-0.25), -0.25);
    }

    #[test]
    fn sign_values() {
        assert_eq!(sign(3.0), 1.0);
        assert_eq!(sign(-0.1), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert!(sign(f32::NAN).is_nan());
    }

    #[test]
    fn clamp_with_nan_bounds() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(5.0, f32::NAN, 1.0), 1.0);
        assert_eq!(clamp(-5.0, f32::NAN, 1.0), -5.0);
        assert_eq!(clamp(5.0, 0.0, f32::NAN), 5.0);
    }

    #[test]
    fn sin_matches_direct_computation() {
        for i in 0..1000 {
            let phase = i as f32 / 997.0;
            let direct = (phase as f64 * std::f64::consts::TAU).sin() as f32;
            assert!((sin(phase) - direct).abs() < 1e-4, "phase {phase}");
        }
    }

    #[test]
    fn sin_quarter_points_exact() {
        assert_eq!(sin(0.0), 0.0);
        assert_eq!(sin(0.25), 1.0);
        assert_eq!(sin(0.75), -1.0);
        assert!(sin(0.5).abs() < 1e-6);
    }

    #[test]
    fn sin_non_finite_is_nan() {
        assert!(sin(f32::NAN).is_nan());
        assert!(sin(f32::NEG_INFINITY).is_nan());
    }

    #[test]
    fn pow2_matches_direct_computation() {
        let mut x: f32 = -24.0;
        while x <= 24.0 {
            let direct = x.exp2();
            assert!(((pow2(x) - direct) / direct).abs() < 1e-4, "x {x}");
            x += 0.173;
        }
    }

    #[test]
    fn pow2_integer_octaves_exact() {
        assert_eq!(pow2(0.0), 1.0);
        assert_eq!(pow2(-1.0), 0.5);
        assert_eq!(pow2(3.0), 8.0);
    }

    #[test]
    fn pow2_out_of_domain_is_nan() {
        assert!(pow2(f32::NAN).is_nan());
        assert!(pow2(f32::INFINITY).is_nan());
        assert!(pow2(200.0).is_nan());
    }
}
