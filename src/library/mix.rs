//! Mixing: `mix` sums its inputs through a soft clipper; `each` maps one
//! body expression over a list of argument tuples.

use crate::engine::program::{Args, Node};

#[derive(Debug, Default)]
pub struct MixState {
    /// Last non-NaN value of each input.
    last: Vec<f32>,
}

/// `mix(a, b, ...)`: NaN inputs repeat their previous value.
pub fn mix(args: &mut Args, state: &mut MixState) -> f32 {
    let n = args.len();
    if n == 0 {
        return 0.0;
    }
    if state.last.len() != n {
        state.last.resize(n, 0.0);
    }
    let mut sum = 0.0;
    for i in 0..n {
        let v = args.get(i, 0.0);
        if !v.is_nan() {
            state.last[i] = v;
        }
        sum += state.last[i];
    }
    saturate(sum / (n as f32).sqrt())
}

/// Cubic soft clipper, flat beyond ±1.25.
fn saturate(v: f32) -> f32 {
    if v <= -1.25 {
        -0.984375
    } else if v >= 1.25 {
        0.984375
    } else {
        1.1 * v - 0.2 * v * v * v
    }
}

/// `each(pattern, body, list...)`, after binding: the arguments are laid out
/// as `[pattern, body_1 .. body_n, list_1 .. list_n]`, one private body copy
/// per list so every copy keeps its own function state.
pub fn each(args: &mut Args) -> f32 {
    if args.len() < 3 {
        return f32::NAN;
    }
    let n = (args.len() - 1) / 2;
    let Some(pattern) = args.node(0) else {
        return f32::NAN;
    };
    let names = pattern.chain_len();

    let mut sum = 0.0;
    for i in 0..n {
        let (Some(body), Some(list)) = (args.node(1 + i), args.node(1 + n + i)) else {
            continue;
        };
        for j in 0..names {
            if let Node::Var(var) = pattern.chain_nth(j) {
                let v = args.eval(list.chain_nth(j));
                args.assign(*var, v);
            }
        }
        let v = args.eval(body);
        if !v.is_nan() {
            sum += v;
        }
    }
    sum / (n as f32).sqrt()
}
