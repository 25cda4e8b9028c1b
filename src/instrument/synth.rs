//! Synthetic generators for the built-in PCM banks.
//!
//! Each generator produces a mono f32 buffer at the given sample rate, which
//! the bank builders quantize to 16 bits. Noise-based generators use a seeded
//! `ChaCha8Rng` so a given seed always yields the same kit.

use std::f64::consts::TAU;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::{Pcm, PcmBank, PianoBank};

fn num_samples(sample_rate: u32, duration_secs: f64) -> usize {
    (sample_rate as f64 * duration_secs) as usize
}

/// Bass drum (~500ms): sine sweeping from 120 Hz down to 48 Hz under a long
/// exponential decay.
pub fn generate_bass_drum(sample_rate: u32) -> Vec<f32> {
    let duration_secs = 0.5;
    let n = num_samples(sample_rate, duration_secs);
    let mut output = Vec::with_capacity(n);
    let mut phase = 0.0_f64;

    for i in 0..n {
        let norm = i as f64 / n as f64;
        let freq = 48.0 + 72.0 * (-norm * 12.0).exp();
        let amp = (-norm * 6.0).exp();
        phase += freq / sample_rate as f64;
        output.push(((phase * TAU).sin() * amp * 0.95) as f32);
    }

    output
}

/// Snare drum (~200ms): 180 Hz body plus white noise with its own decay.
pub fn generate_snare(sample_rate: u32, seed: u64) -> Vec<f32> {
    let duration_secs = 0.2;
    let n = num_samples(sample_rate, duration_secs);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut output = Vec::with_capacity(n);
    let mut phase = 0.0_f64;

    for i in 0..n {
        let norm = i as f64 / n as f64;

        let body_amp = (-norm * 15.0).exp();
        phase += 180.0 / sample_rate as f64;
        let body = (phase * TAU).sin() * body_amp;

        let noise_amp = (-norm * 12.0).exp();
        let noise: f64 = rng.gen_range(-1.0..1.0) * noise_amp;

        output.push((body * 0.5 + noise * 0.5) as f32);
    }

    output
}

/// Tom (~300ms): sine with a short downward pitch bend from `freq * 1.3`.
pub fn generate_tom(sample_rate: u32, freq: f64) -> Vec<f32> {
    let duration_secs = 0.3;
    let n = num_samples(sample_rate, duration_secs);
    let mut output = Vec::with_capacity(n);
    let mut phase = 0.0_f64;

    for i in 0..n {
        let norm = i as f64 / n as f64;
        let f = freq * (1.0 + 0.3 * (-norm * 20.0).exp());
        let amp = (-norm * 7.0).exp();
        phase += f / sample_rate as f64;
        output.push(((phase * TAU).sin() * amp * 0.9) as f32);
    }

    output
}

/// Rim shot (~40ms): a bright 1.7 kHz ping with a noise click on top.
pub fn generate_rimshot(sample_rate: u32, seed: u64) -> Vec<f32> {
    let duration_secs = 0.04;
    let n = num_samples(sample_rate, duration_secs);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut output = Vec::with_capacity(n);
    let click_len = num_samples(sample_rate, 0.002).max(1);

    for i in 0..n {
        let t = i as f64 / sample_rate as f64;
        let norm = i as f64 / n as f64;
        let ping = (t * 1700.0 * TAU).sin() * (-norm * 9.0).exp();
        let click = if i < click_len {
            rng.gen_range(-1.0_f64..1.0) * (1.0 - i as f64 / click_len as f64)
        } else {
            0.0
        };
        output.push((ping * 0.6 + click * 0.4) as f32);
    }

    output
}

/// Hand clap (~150ms): three staggered noise micro-bursts followed by a
/// band-limited decay tail.
pub fn generate_clap(sample_rate: u32, seed: u64) -> Vec<f32> {
    let duration_secs = 0.15;
    let n = num_samples(sample_rate, duration_secs);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut output = vec![0.0f32; n];

    let burst_offsets = [0.0, 0.015, 0.030];
    let burst_len_secs = 0.01;

    for &offset in &burst_offsets {
        let start = num_samples(sample_rate, offset);
        let end = num_samples(sample_rate, offset + burst_len_secs);
        for (i, sample) in output.iter_mut().enumerate().take(end.min(n)).skip(start) {
            let local_t = (i - start) as f64 / (burst_len_secs * sample_rate as f64);
            let env = (-local_t * 15.0).exp();
            let noise: f64 = rng.gen_range(-1.0..1.0);
            *sample += (noise * env * 0.7) as f32;
        }
    }

    let tail_start = num_samples(sample_rate, 0.04);
    let mut bp_state = 0.0_f64;
    let coeff = (600.0 / sample_rate as f64).min(1.0);

    for (i, sample) in output.iter_mut().enumerate().skip(tail_start) {
        let t = (i - tail_start) as f64 / sample_rate as f64;
        let tail_amp = (-t * 18.0).exp();
        let noise: f64 = rng.gen_range(-1.0..1.0);
        bp_state += (noise - bp_state) * coeff;
        *sample += (bp_state * tail_amp * 0.5) as f32;
    }

    output
}

/// Cowbell (~300ms): two detuned square waves at 540 and 800 Hz, softened
/// by a one-pole low-pass.
pub fn generate_cowbell(sample_rate: u32) -> Vec<f32> {
    let duration_secs = 0.3;
    let n = num_samples(sample_rate, duration_secs);
    let mut output = Vec::with_capacity(n);
    let coeff = (3000.0 / sample_rate as f64).min(1.0);
    let mut lp = 0.0_f64;

    for i in 0..n {
        let t = i as f64 / sample_rate as f64;
        let norm = i as f64 / n as f64;
        let sq = |f: f64| if (t * f).fract() < 0.5 { 1.0 } else { -1.0 };
        let raw = (sq(540.0) + sq(800.0)) * 0.5;
        lp += (raw - lp) * coeff;
        let amp = (-norm * 8.0).exp();
        output.push((lp * amp * 0.6) as f32);
    }

    output
}

/// Hi-hat: high-passed white noise with a fast (closed) or slow (open)
/// exponential decay.
pub fn generate_hihat(sample_rate: u32, seed: u64, duration_secs: f64) -> Vec<f32> {
    let n = num_samples(sample_rate, duration_secs);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut output = Vec::with_capacity(n);

    let mut prev_input = 0.0_f64;
    let mut prev_output = 0.0_f64;
    let alpha = 0.85;

    for i in 0..n {
        let norm = i as f64 / n as f64;
        let amp = (-norm * 8.0).exp();
        let noise: f64 = rng.gen_range(-1.0..1.0);

        // One-pole high-pass: y[n] = alpha * (y[n-1] + x[n] - x[n-1])
        let filtered = alpha * (prev_output + noise - prev_input);
        prev_input = noise;
        prev_output = filtered;

        output.push((filtered * amp * 0.6).clamp(-1.0, 1.0) as f32);
    }

    output
}

/// One piano note (~2s): a stack of slightly inharmonic partials with
/// register-dependent decay and a soft hammer attack.
pub fn generate_piano_note(sample_rate: u32, freq: f64) -> Vec<f32> {
    let duration_secs = 2.0;
    let n = num_samples(sample_rate, duration_secs);
    let attack = num_samples(sample_rate, 0.004).max(1);
    let nyquist = sample_rate as f64 / 2.0;
    let partials: Vec<(f64, f64, f64)> = (1..=8)
        .map(|k| {
            let k = k as f64;
            let f = freq * k * (1.0 + 0.0004 * k * k);
            let gain = 0.6 / k;
            let decay = 1.5 + k * 0.8 + freq / 400.0;
            (f, gain, decay)
        })
        .filter(|(f, _, _)| *f < nyquist)
        .collect();

    let mut output = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64 / sample_rate as f64;
        let onset = (i as f64 / attack as f64).min(1.0);
        let v: f64 = partials
            .iter()
            .map(|(f, gain, decay)| (t * f * TAU).sin() * gain * (-t * decay).exp())
            .sum();
        output.push((v * onset * 0.8).clamp(-1.0, 1.0) as f32);
    }

    output
}

/// Build the nine-voice drum bank in [`super::DRUM_NAMES`] order.
pub fn build_tr808(sample_rate: u32, seed: u64) -> PcmBank {
    let voices = [
        generate_bass_drum(sample_rate),
        generate_snare(sample_rate, seed),
        generate_tom(sample_rate, 160.0),
        generate_tom(sample_rate, 110.0),
        generate_rimshot(sample_rate, seed.wrapping_add(1)),
        generate_clap(sample_rate, seed.wrapping_add(2)),
        generate_cowbell(sample_rate),
        generate_hihat(sample_rate, seed.wrapping_add(3), 0.4),
        generate_hihat(sample_rate, seed.wrapping_add(4), 0.08),
    ];
    PcmBank::new(voices.iter().map(|v| Pcm::from_f32(v)).collect())
}

/// Base pitches of the piano bank: C2, C4 and C6.
pub const PIANO_NOTES: [f32; 3] = [65.41, 261.63, 1046.5];

/// Build the three-note piano bank.
pub fn build_piano(sample_rate: u32) -> PianoBank {
    PianoBank::new(
        PIANO_NOTES
            .iter()
            .map(|f| (*f, Pcm::from_f32(&generate_piano_note(sample_rate, *f as f64))))
            .collect(),
    )
}
