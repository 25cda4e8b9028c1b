//! Integration tests for the signal function library, driven through the
//! public engine API the way a script author would use it.

use assert_approx_eq::assert_approx_eq;
use glitch::Engine;

fn render(source: &str, sample_rate: u32, n: usize) -> Vec<f32> {
    let mut engine = Engine::new(sample_rate);
    engine
        .compile(source)
        .unwrap_or_else(|e| panic!("{source}: {e}"));
    (0..n).map(|_| engine.next_sample()).collect()
}

/// Like [`render`], with gaps (NaN) shown as -1 instead of held.
fn render_gaps(source: &str, sample_rate: u32, n: usize) -> Vec<f32> {
    render(&format!("({source}) || -1"), sample_rate, n)
}

/// Render `source` with `x` set to each input in turn.
fn render_with_input(source: &str, sample_rate: u32, input: &[f32]) -> Vec<f32> {
    let mut engine = Engine::new(sample_rate);
    engine.compile(source).unwrap();
    input
        .iter()
        .map(|&x| {
            engine.set("x", x);
            engine.next_sample()
        })
        .collect()
}

#[test]
fn sine_at_eight_samples_per_cycle() {
    let half = std::f32::consts::FRAC_1_SQRT_2;
    let expected = [0.0, half, 1.0, half, 0.0, -half, -1.0, -half];
    for freq in [1u32, 10, 1000] {
        let out = render(&format!("sin({freq})"), freq * 8, 16);
        for (i, v) in out.iter().enumerate() {
            assert_approx_eq!(*v, expected[i % 8], 1e-4);
        }
    }
}

#[test]
fn sequencer_steps_with_gaps() {
    let cycle = [1.0, 1.0, 1.0, -1.0, 2.0, 2.0, 2.0, -1.0, 3.0, 3.0, 3.0, -1.0];
    let out = render_gaps("seq(60, 1, 2, 3)", 4, 36);
    for (i, v) in out.iter().enumerate() {
        assert_eq!(*v, cycle[i % 12], "sample {i}");
    }
}

#[test]
fn sequencer_latches_random_values_per_beat() {
    let out = render_gaps("seq(60, r())", 4, 16);
    let beats: Vec<&[f32]> = out.chunks(4).collect();
    for beat in &beats {
        assert_eq!(beat[0], beat[1]);
        assert_eq!(beat[1], beat[2]);
        assert_eq!(beat[3], -1.0);
        assert!((0.0..1.0).contains(&beat[0]));
    }
    assert_ne!(beats[0][0], beats[1][0]);
    assert_ne!(beats[1][0], beats[2][0]);
}

#[test]
fn empty_sequencer_falls_back() {
    assert_eq!(render("seq() || 1", 8000, 1), vec![1.0]);
}

#[test]
fn byte_over_its_whole_domain() {
    let mut engine = Engine::new(8000);
    engine.compile("byte(x)").unwrap();
    for x in -512..512 {
        engine.set("x", x as f32);
        let expected = ((x & 255) - 127) as f32 / 128.0;
        assert_eq!(engine.next_sample(), expected, "byte({x})");
    }
    engine.set("x", 127.0);
    assert_eq!(engine.next_sample(), 0.0);
    engine.set("x", 255.0);
    assert_eq!(engine.next_sample(), 1.0);
    engine.set("x", 0.0);
    assert_approx_eq!(engine.next_sample(), -1.0, 0.01);
    // Past the i32 range every representable value is a multiple of 256.
    for x in [2_147_483_648.0f32, 4_294_967_808.0, -2_147_483_904.0, 1.0e15] {
        engine.set("x", x);
        assert_eq!(engine.next_sample(), -127.0 / 128.0, "byte({x})");
    }
}

#[test]
fn hz_and_lookup_helpers() {
    assert_approx_eq!(render("hz(0)", 8000, 1)[0], 440.0, 0.5);
    assert_approx_eq!(render("hz(12)", 8000, 1)[0], 880.0, 1.0);
    assert_approx_eq!(render("hz(C4)", 8000, 1)[0], 261.63, 0.5);
    assert_eq!(render("a(1, 10, 20, 30)", 8000, 1), vec![20.0]);
    assert_eq!(render("a(4, 10, 20, 30)", 8000, 1), vec![20.0]);
    assert_eq!(render("r(0)", 8000, 1), vec![0.0]);
    assert_approx_eq!(render("s(0.25)", 8000, 1)[0], 1.0, 1e-4);
}

#[test]
fn envelope_rises_then_falls() {
    let out = render("env(10)", 200, 40);
    let peak = out
        .iter()
        .enumerate()
        .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
    assert_approx_eq!(peak.1, 10.0, 1e-3);
    for pair in out[..=peak.0].windows(2) {
        assert!(pair[1] > pair[0], "attack must rise: {pair:?}");
    }
    let tail_end = out.iter().rposition(|&v| v > 0.0).unwrap_or(peak.0);
    for pair in out[peak.0..=tail_end].windows(2) {
        assert!(pair[1] < pair[0], "release must fall: {pair:?}");
    }
    assert!(tail_end < 39);
}

#[test]
fn envelope_restarts_after_nan() {
    let mut engine = Engine::new(200);
    engine.compile("env((x, 10)) || -1").unwrap();
    engine.set("x", 1.0);
    let first: Vec<f32> = (0..6).map(|_| engine.next_sample()).collect();
    engine.set("x", f32::NAN);
    assert_eq!(engine.next_sample(), -1.0);
    engine.set("x", 1.0);
    let again: Vec<f32> = (0..6).map(|_| engine.next_sample()).collect();
    assert_eq!(first, again);
}

#[test]
fn delay_mixes_feedback_taps() {
    let input = [1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0];
    let out = render_with_input("delay(x, 0.5, 0.5, 0.5)", 4, &input);
    let expected = [1.0, 2.0, 3.5, 5.0, 4.5, 4.0, 2.5];
    for (a, e) in out.iter().zip(expected) {
        assert_approx_eq!(*a, e, 1e-6);
    }
}

#[test]
fn mixer_normalizes_and_saturates() {
    let out = render("mix(0.5, 0.5)", 8000, 1)[0];
    let v = 1.0 / 2f32.sqrt();
    assert_approx_eq!(out, 1.1 * v - 0.2 * v * v * v, 1e-5);
    // Far beyond the knee the curve is clipped.
    assert_approx_eq!(render("mix(100)", 8000, 1)[0].abs(), 1.0, 0.1);
}

#[test]
fn lowpass_passes_dc() {
    let out = render("lpf(1, 200)", 8000, 2000);
    assert_approx_eq!(out[1999], 1.0, 1e-3);
}

#[test]
fn pluck_rings_then_fades() {
    let out = render("pluck(100)", 8000, 8000);
    let energy = |s: &[f32]| s.iter().map(|v| v * v).sum::<f32>();
    assert!(out.iter().all(|v| v.abs() <= 1.0));
    assert!(energy(&out[..800]) > 0.0);
    assert!(energy(&out[7200..]) < energy(&out[..800]));
}

#[test]
fn drum_hit_retriggers_on_a_gap() {
    let out = render_gaps("tr808(BD, seq(480, 1))", 8000, 2000);
    // One beat at 480 bpm is 1000 samples; each ends in a one-sample gap.
    assert_eq!(out[999], -1.0);
    assert_eq!(out[1000], out[0]);
    assert_eq!(out[1001], out[1]);
}
