//! Stateless helpers: byte-beat scaling, wrapped sine, random numbers,
//! array lookup, musical scales and note-to-frequency conversion.

use crate::engine::program::Args;
use crate::math;

/// Semitone offsets of each supported scale, by index.
const SCALES: [&[i32]; 15] = [
    &[0, 2, 4, 5, 7, 9, 11],     // major
    &[0, 2, 3, 5, 7, 8, 10],     // minor
    &[0, 2, 4, 5, 7, 9, 11],     // ionian
    &[0, 2, 3, 5, 7, 9, 10],     // dorian
    &[0, 1, 3, 5, 7, 8, 10],     // phrygian
    &[0, 2, 4, 6, 7, 9, 11],     // lydian
    &[0, 2, 4, 5, 7, 9, 10],     // mixolydian
    &[0, 2, 3, 5, 7, 8, 10],     // aeolian
    &[0, 1, 3, 5, 6, 8, 10],     // locrian
    &[0, 2, 4, 7, 9],            // major pentatonic
    &[0, 3, 5, 7, 10],           // minor pentatonic
    &[0, 2, 3, 5, 7, 8, 11],     // harmonic minor
    &[0, 2, 3, 5, 7, 9, 11],     // melodic minor
    &[0, 3, 5, 6, 7, 10],        // blues
    &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11], // chromatic
];

const CHROMATIC: usize = 14;

/// `byte(x = 127)`: map the low 8 bits of `x` to `[-127/128, 1]`, centred
/// on 127. Byte-beat formulas produce integers; this turns them into audio.
pub fn byte(args: &mut Args) -> f32 {
    let x = args.get(0, 127.0);
    if x.is_nan() {
        return f32::NAN;
    }
    (x.trunc().rem_euclid(256.0) as i32 - 127) as f32 / 128.0
}

/// `s(phase = 0)`: sine of a phase in cycles.
pub fn s(args: &mut Args) -> f32 {
    math::sin(math::wrap(args.get(0, 0.0)))
}

/// `r(max = 1)`: uniform random number in `[0, max)`.
pub fn r(args: &mut Args) -> f32 {
    let max = args.get(0, 1.0);
    args.random() * max
}

/// `l(x)`: base-2 logarithm, with `l(0) == 0`.
pub fn l(args: &mut Args) -> f32 {
    let x = args.get(0, 0.0);
    if x == 0.0 {
        0.0
    } else {
        math::log2(x)
    }
}

/// `a(index, v0, v1, ...)`: circular lookup. Only the selected element is
/// evaluated.
pub fn a(args: &mut Args) -> f32 {
    let index = args.get(0, f32::NAN);
    if !index.is_finite() {
        return f32::NAN;
    }
    let len = args.len() - 1;
    if len == 0 {
        return 0.0;
    }
    let i = (index.floor() as i64).rem_euclid(len as i64) as usize;
    args.get(i + 1, 0.0)
}

/// `scale(degree = 0, scale = 0)`: semitone offset of a scale degree.
/// Degrees outside one octave transpose by whole octaves; unknown scale
/// indices fall back to chromatic.
pub fn scale(args: &mut Args) -> f32 {
    let degree = args.get(0, 0.0);
    let which = args.get(1, 0.0);
    if !degree.is_finite() || which.is_nan() {
        return f32::NAN;
    }
    let index = if (0.0..SCALES.len() as f32).contains(&which) {
        which as usize
    } else {
        CHROMATIC
    };
    let steps = SCALES[index];
    let len = steps.len() as f64;
    let degree = degree.floor() as f64;
    let octave = degree.div_euclid(len);
    let step = degree.rem_euclid(len) as usize;
    (steps[step.min(steps.len() - 1)] as f64 + octave * 12.0) as f32
}

/// `hz(note = 0)`: frequency of a note given in semitones from A4.
pub fn hz(args: &mut Args) -> f32 {
    let note = args.get(0, 0.0);
    math::pow2(note / 12.0) * 440.0
}

#[cfg(test)]
mod tests {
    use crate::engine::Engine;
    use assert_approx_eq::assert_approx_eq;

    fn first(source: &str) -> f32 {
        let mut engine = Engine::new(44100);
        engine.compile(source).unwrap();
        engine.next_sample()
    }

    #[test]
    fn byte_law() {
        assert_approx_eq!(first("byte(0)"), -127.0 / 128.0);
        assert_eq!(first("byte(127)"), 0.0);
        assert_eq!(first("byte(255)"), 1.0);
        assert_eq!(first("byte(383)"), 0.0);
        assert_eq!(first("byte(-257)"), 1.0);
        assert_eq!(first("byte()"), 0.0);
    }

    #[test]
    fn byte_keeps_its_period_past_i32() {
        let mut engine = Engine::new(8000);
        engine.compile("byte(x)").unwrap();
        for x in [2_147_483_904.0f32, 4_294_967_296.0, -2_147_483_904.0, 1e12] {
            engine.set("x", x);
            assert_approx_eq!(engine.next_sample(), -127.0 / 128.0);
        }
        engine.set("x", 2_147_483_904.0 + 256.0 * 4.0);
        assert_approx_eq!(engine.next_sample(), -127.0 / 128.0);
    }

    #[test]
    fn wrapped_sine() {
        assert_approx_eq!(first("s(0.25)"), 1.0);
        assert_approx_eq!(first("s(0.75)"), -1.0);
        assert_approx_eq!(first("s(1.25)"), 1.0);
        assert_eq!(first("s()"), 0.0);
    }

    #[test]
    fn random_respects_max() {
        assert_eq!(first("r(0)"), 0.0);
        let mut engine = Engine::new(44100);
        engine.compile("r(10)").unwrap();
        for _ in 0..100 {
            let v = engine.next_sample();
            assert!((0.0..10.0).contains(&v));
        }
    }

    #[test]
    fn log2_with_zero_guard() {
        assert_eq!(first("l(0)"), 0.0);
        assert_approx_eq!(first("l(8)"), 3.0);
    }

    #[test]
    fn array_lookup_wraps() {
        assert_eq!(first("a(1, 2, 3, 4)"), 3.0);
        assert_eq!(first("a(7, 2, 3, 4)"), 3.0);
        assert_eq!(first("a(-1, 2, 3, 4)"), 4.0);
        assert_eq!(first("a(0.9, 2, 3, 4)"), 2.0);
        assert_eq!(first("a(3)"), 0.0);
    }

    #[test]
    fn scale_degrees() {
        assert_eq!(first("scale(0)"), 0.0);
        assert_eq!(first("scale(2)"), 4.0);
        assert_eq!(first("scale(7)"), 12.0);
        assert_eq!(first("scale(-1)"), -1.0);
        assert_eq!(first("scale(2, 1)"), 3.0);
        assert_eq!(first("scale(13, 99)"), 13.0);
    }

    #[test]
    fn huge_scale_degrees_stay_finite() {
        let up = first("scale(100000000000000000000)");
        assert!(up.is_finite() && up > 1e20, "{up}");
        let down = first("scale(-100000000000000000000)");
        assert!(down.is_finite() && down < -1e20, "{down}");
    }

    #[test]
    fn note_frequencies() {
        assert_approx_eq!(first("hz()"), 440.0, 1e-3);
        assert_approx_eq!(first("hz(A3)"), 220.0, 1e-3);
        assert_approx_eq!(first("hz(12)"), 880.0, 1e-3);
        assert_approx_eq!(first("hz(C4)"), 261.6256, 1e-2);
    }
}
