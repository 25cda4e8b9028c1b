//! Step sequencers: `seq` (latching) and `loop` (re-evaluating).
//!
//! ```text
//! seq(tempo, step, step, ...)
//! seq((offset, tempo), ...)       start `offset` beats into the cycle
//! step = value                    one beat
//!      | (beats, value)           custom length
//!      | (beats, v1, v2, ..., vn) glissando v1 → vn over n-1 equal spans
//! ```
//!
//! Step boundaries are recomputed from the current tempo at the start of
//! every cycle, so tempo changes land on a cycle boundary.

use crate::engine::program::{Args, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Glide {
    /// Holds one value.
    Plain,
    /// Slides from this step's value to the next step's value.
    Slide,
    /// Zero-length target of the last slide in a glissando.
    Endpoint,
}

#[derive(Debug, Clone)]
struct Step {
    /// Argument index the step came from.
    arg: usize,
    /// Position inside the argument's value chain.
    elem: usize,
    has_duration: bool,
    glide: Glide,
    /// Number of sub-spans sharing the argument's duration.
    spans: usize,
    start: usize,
    end: usize,
    value: f32,
}

#[derive(Debug, Default)]
pub struct SeqState {
    steps: Vec<Step>,
    built: bool,
    /// Sample position within the current cycle, before the offset.
    t: usize,
    offset: usize,
    duration: usize,
    cursor: usize,
}

/// `seq`: step values are evaluated once per cycle and replayed.
pub fn seq(args: &mut Args, state: &mut SeqState) -> f32 {
    run(args, state, true)
}

/// `loop`: the active step is evaluated on every sample.
pub fn looped(args: &mut Args, state: &mut SeqState) -> f32 {
    run(args, state, false)
}

fn run(args: &mut Args, state: &mut SeqState, latch: bool) -> f32 {
    if !state.built {
        state.build(args);
    }
    if state.steps.is_empty() {
        return f32::NAN;
    }
    if state.t == 0 && !state.start_cycle(args, latch) {
        return f32::NAN;
    }

    let t = (state.t + state.offset) % state.duration;
    state.seek(t);

    let i = state.cursor;
    let step = &state.steps[i];
    let out = match step.glide {
        Glide::Plain if latch => {
            if t + 1 < step.end {
                step.value
            } else {
                f32::NAN
            }
        }
        Glide::Plain => {
            if t == step.start {
                f32::NAN
            } else {
                value_node(args, step).map_or(f32::NAN, |n| args.eval(n))
            }
        }
        Glide::Slide => {
            let next = &state.steps[(i + 1) % state.steps.len()];
            let progress = (t - step.start) as f32 / (step.end - step.start) as f32;
            if latch {
                if t + 1 == step.end && next.glide == Glide::Endpoint {
                    f32::NAN
                } else {
                    step.value + (next.value - step.value) * progress
                }
            } else if t == step.start && step.elem == 0 {
                f32::NAN
            } else {
                let from = value_node(args, step).map_or(f32::NAN, |n| args.eval(n));
                let to = value_node(args, next).map_or(f32::NAN, |n| args.eval(n));
                from + (to - from) * progress
            }
        }
        Glide::Endpoint => f32::NAN,
    };

    state.t = (state.t + 1) % state.duration;
    out
}

/// The value expression a step plays.
fn value_node<'n>(args: &Args<'n, '_, '_>, step: &Step) -> Option<&'n Node> {
    let node = args.node(step.arg)?;
    let values = match node.as_pair() {
        Some((_, tail)) if step.has_duration => tail,
        _ => node,
    };
    Some(values.chain_nth(step.elem))
}

impl SeqState {
    /// Derive the step list from the argument shapes. Runs once; the shapes
    /// of a compiled program never change.
    fn build(&mut self, args: &Args) {
        self.built = true;
        for arg in 1..args.len() {
            let Some(node) = args.node(arg) else { break };
            let (has_duration, values) = match node.as_pair() {
                Some((_, tail)) => (true, tail),
                None => (false, node),
            };
            let n = values.chain_len();
            let step = |elem, glide, spans| Step {
                arg,
                elem,
                has_duration,
                glide,
                spans,
                start: 0,
                end: 0,
                value: f32::NAN,
            };
            if n == 1 {
                self.steps.push(step(0, Glide::Plain, 1));
            } else {
                for elem in 0..n - 1 {
                    self.steps.push(step(elem, Glide::Slide, n - 1));
                }
                self.steps.push(step(n - 1, Glide::Endpoint, 0));
            }
        }
    }

    /// Lay out step boundaries for a new cycle. Returns `false` when the
    /// tempo or step lengths leave nothing to play.
    fn start_cycle(&mut self, args: &mut Args, latch: bool) -> bool {
        let Some(tempo_node) = args.node(0) else {
            return false;
        };
        let (offset_beats, tempo) = match tempo_node.as_pair() {
            Some((offset, tempo)) => (args.eval(offset), args.eval(tempo)),
            None => (0.0, args.eval(tempo_node)),
        };
        if !tempo.is_finite() || tempo <= 0.0 {
            return false;
        }
        let samples_per_beat = args.sample_rate() * 60.0 / tempo;

        let mut t = 0usize;
        let mut current_arg = None;
        let mut beats = 1.0;
        for i in 0..self.steps.len() {
            let step = &self.steps[i];
            if current_arg != Some(step.arg) {
                current_arg = Some(step.arg);
                beats = match (step.has_duration, args.node(step.arg).and_then(Node::as_pair)) {
                    (true, Some((duration, _))) => args.eval(duration),
                    _ => 1.0,
                };
            }
            let span = match step.glide {
                Glide::Endpoint => 0,
                _ => span_samples(beats * samples_per_beat / step.spans as f32),
            };
            let value = if latch {
                value_node(args, step).map_or(f32::NAN, |n| args.eval(n))
            } else {
                f32::NAN
            };
            let Some(end) = t.checked_add(span).filter(|&end| end <= MAX_CYCLE) else {
                return false;
            };
            let step = &mut self.steps[i];
            step.start = t;
            t = end;
            step.end = t;
            step.value = value;
        }

        if t == 0 {
            return false;
        }
        self.duration = t;
        self.offset = if offset_beats.is_finite() {
            ((offset_beats * samples_per_beat) as i64).rem_euclid(t as i64) as usize
        } else {
            0
        };
        self.cursor = 0;
        true
    }

    /// Move the cursor to the step covering `t`, wrapping around the list.
    fn seek(&mut self, t: usize) {
        let len = self.steps.len();
        for _ in 0..len {
            let step = &self.steps[self.cursor];
            if step.start <= t && t < step.end {
                return;
            }
            self.cursor = (self.cursor + 1) % len;
        }
    }
}

/// Longest cycle, in samples. Longer ones cannot be played.
const MAX_CYCLE: usize = i64::MAX as usize;

/// Truncate a sample count, treating NaN and negatives as empty.
fn span_samples(x: f32) -> usize {
    if x.is_finite() && x > 0.0 {
        x as usize
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::Engine;

    /// Render `n` samples at 4 Hz with gaps shown as -1.
    fn render(source: &str, n: usize) -> Vec<f32> {
        let mut engine = Engine::new(4);
        engine.compile(&format!("({source}) || -1")).unwrap();
        (0..n).map(|_| engine.next_sample()).collect()
    }

    #[test]
    fn cycles_too_long_to_count_are_silent() {
        const BIG: &str = "1000000000000000000000000000000";
        for source in [
            format!("seq(60, ({BIG}, 1), 2)"),
            format!("seq(1 / {BIG}, 1, 2)"),
            format!("loop(60, ({BIG}, 1), ({BIG}, 2))"),
        ] {
            assert_eq!(render(&source, 4), vec![-1.0; 4], "{source}");
        }
    }

    #[test]
    fn plain_steps_with_trailing_gap() {
        assert_eq!(
            render("seq(60, 1, 2, 3)", 24),
            vec![
                1.0, 1.0, 1.0, -1.0, 2.0, 2.0, 2.0, -1.0, 3.0, 3.0, 3.0, -1.0, //
                1.0, 1.0, 1.0, -1.0, 2.0, 2.0, 2.0, -1.0, 3.0, 3.0, 3.0, -1.0,
            ]
        );
    }

    #[test]
    fn step_durations() {
        assert_eq!(
            render("seq(60, 1, (1.5, 2), 3, (0.5, 4))", 16),
            vec![
                1.0, 1.0, 1.0, -1.0, 2.0, 2.0, 2.0, 2.0, 2.0, -1.0, 3.0, 3.0, 3.0, -1.0, 4.0,
                -1.0,
            ]
        );
    }

    #[test]
    fn glissando() {
        assert_eq!(
            render("seq(60, (3, 1, 4, 5, 2), 6)", 16),
            vec![
                1.0, 1.75, 2.5, 3.25, 4.0, 4.25, 4.5, 4.75, 5.0, 4.25, 3.5, -1.0, 6.0, 6.0, 6.0,
                -1.0,
            ]
        );
    }

    #[test]
    fn starting_offset() {
        assert_eq!(
            render("seq((1, 60), 1, 2, 3)", 12),
            vec![2.0, 2.0, 2.0, -1.0, 3.0, 3.0, 3.0, -1.0, 1.0, 1.0, 1.0, -1.0]
        );
    }

    #[test]
    fn single_step() {
        assert_eq!(
            render("seq(120, 7)", 4),
            vec![7.0, -1.0, 7.0, -1.0]
        );
    }

    #[test]
    fn missing_or_bad_tempo_is_silent() {
        assert_eq!(render("seq()", 2), vec![-1.0, -1.0]);
        assert_eq!(render("seq(120)", 2), vec![-1.0, -1.0]);
        assert_eq!(render("seq(0, 1)", 2), vec![-1.0, -1.0]);
        assert_eq!(render("seq(-60, 1)", 2), vec![-1.0, -1.0]);
    }

    #[test]
    fn tempo_follows_variable() {
        assert_eq!(
            render("bpm = 120, seq(bpm, 1, 2)", 4),
            vec![1.0, -1.0, 2.0, -1.0]
        );
    }

    #[test]
    fn latching_holds_random_values() {
        let mut engine = Engine::new(4);
        engine.compile("seq(60, r() + 1)").unwrap();
        let first: Vec<f32> = (0..3).map(|_| engine.next_sample()).collect();
        assert!(first.iter().all(|v| *v == first[0]));
    }

    #[test]
    fn loop_gaps_at_step_start() {
        assert_eq!(
            render("loop(60, 1, 2)", 8),
            vec![-1.0, 1.0, 1.0, 1.0, -1.0, 2.0, 2.0, 2.0]
        );
    }

    #[test]
    fn loop_reevaluates_every_sample() {
        let mut engine = Engine::new(4);
        engine.compile("n = 0, loop(60, n = n + 1)").unwrap();
        let out: Vec<f32> = (0..4).map(|_| engine.next_sample()).collect();
        // First sample is the step gap: the engine holds its initial 0.
        assert_eq!(out, vec![0.0, 1.0, 1.0, 1.0]);

        let mut engine = Engine::new(4);
        engine.compile("loop(60, t)").unwrap();
        let out: Vec<f32> = (0..4).map(|_| engine.next_sample()).collect();
        assert_eq!(out, vec![0.0, 2000.0, 4000.0, 6000.0]);
    }

    #[test]
    fn loop_glissando_interpolates_live() {
        assert_eq!(
            render("loop(60, (2, 0, 8))", 8),
            vec![-1.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]
        );
    }

    #[test]
    fn independent_sequencers_keep_separate_state() {
        assert_eq!(
            render("seq(60, 1, 2) + seq(120, 10, 20)", 4),
            vec![11.0, -1.0, 21.0, -1.0]
        );
    }
}
