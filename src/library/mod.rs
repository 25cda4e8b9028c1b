//! Synthesis function library.
//!
//! Every function takes lazily evaluated arguments ([`Args`]) and its own
//! private [`NodeState`], and returns one sample. NaN is the in-band
//! "no signal / reset" token and flows through all of them.

pub mod delay;
pub mod env;
pub mod filter;
pub mod fm;
pub mod mix;
pub mod osc;
pub mod pluck;
pub mod sampler;
pub mod seq;
pub mod util;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::engine::program::Args;
use crate::instrument::{PcmBank, PianoBank};

pub use sampler::SampleLoader;

/// Identifier of a user-registered sample function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleId(pub(crate) usize);

/// A callable function known to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Byte,
    S,
    R,
    L,
    A,
    Scale,
    Hz,
    Sin,
    Tri,
    Saw,
    Sqr,
    Fm,
    Seq,
    Loop,
    Env,
    Mix,
    Each,
    Lpf,
    Hpf,
    Bpf,
    Bsf,
    Delay,
    Pluck,
    Tr808,
    Piano,
    Sample(SampleId),
}

const BUILTINS: &[(&str, Builtin)] = &[
    ("byte", Builtin::Byte),
    ("s", Builtin::S),
    ("r", Builtin::R),
    ("l", Builtin::L),
    ("a", Builtin::A),
    ("scale", Builtin::Scale),
    ("hz", Builtin::Hz),
    ("sin", Builtin::Sin),
    ("tri", Builtin::Tri),
    ("saw", Builtin::Saw),
    ("sqr", Builtin::Sqr),
    ("fm", Builtin::Fm),
    ("seq", Builtin::Seq),
    ("loop", Builtin::Loop),
    ("env", Builtin::Env),
    ("mix", Builtin::Mix),
    ("each", Builtin::Each),
    ("lpf", Builtin::Lpf),
    ("hpf", Builtin::Hpf),
    ("bpf", Builtin::Bpf),
    ("bsf", Builtin::Bsf),
    ("delay", Builtin::Delay),
    ("pluck", Builtin::Pluck),
    ("tr808", Builtin::Tr808),
    ("piano", Builtin::Piano),
];

/// Private state of one function-call node.
///
/// Starts [`NodeState::Vacant`]; a function installs its own variant on
/// first evaluation.
#[derive(Debug, Default)]
pub enum NodeState {
    #[default]
    Vacant,
    Osc(osc::OscState),
    Fm(fm::FmState),
    Seq(seq::SeqState),
    Env(env::EnvState),
    Mix(mix::MixState),
    Biquad(filter::BiquadState),
    Delay(delay::DelayState),
    Pluck(pluck::PluckState),
    Player(sampler::PlayerState),
}

macro_rules! state_accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        fn $name(&mut self) -> &mut $ty {
            if !matches!(self, NodeState::$variant(_)) {
                *self = NodeState::$variant(<$ty>::default());
            }
            match self {
                NodeState::$variant(state) => state,
                _ => unreachable!("state variant installed above"),
            }
        }
    };
}

impl NodeState {
    state_accessor!(osc, Osc, osc::OscState);
    state_accessor!(fm, Fm, fm::FmState);
    state_accessor!(seq, Seq, seq::SeqState);
    state_accessor!(env, Env, env::EnvState);
    state_accessor!(mix, Mix, mix::MixState);
    state_accessor!(biquad, Biquad, filter::BiquadState);
    state_accessor!(delay, Delay, delay::DelayState);
    state_accessor!(pluck, Pluck, pluck::PluckState);
    state_accessor!(player, Player, sampler::PlayerState);
}

impl Builtin {
    pub(crate) fn call(self, args: &mut Args<'_, '_, '_>, state: &mut NodeState) -> f32 {
        match self {
            Builtin::Byte => util::byte(args),
            Builtin::S => util::s(args),
            Builtin::R => util::r(args),
            Builtin::L => util::l(args),
            Builtin::A => util::a(args),
            Builtin::Scale => util::scale(args),
            Builtin::Hz => util::hz(args),
            Builtin::Sin => osc::sin(args, state.osc()),
            Builtin::Tri => osc::tri(args, state.osc()),
            Builtin::Saw => osc::saw(args, state.osc()),
            Builtin::Sqr => osc::sqr(args, state.osc()),
            Builtin::Fm => fm::fm(args, state.fm()),
            Builtin::Seq => seq::seq(args, state.seq()),
            Builtin::Loop => seq::looped(args, state.seq()),
            Builtin::Env => env::env(args, state.env()),
            Builtin::Mix => mix::mix(args, state.mix()),
            Builtin::Each => mix::each(args),
            Builtin::Lpf => filter::lpf(args, state.biquad()),
            Builtin::Hpf => filter::hpf(args, state.biquad()),
            Builtin::Bpf => filter::bpf(args, state.biquad()),
            Builtin::Bsf => filter::bsf(args, state.biquad()),
            Builtin::Delay => delay::delay(args, state.delay()),
            Builtin::Pluck => pluck::pluck(args, state.pluck()),
            Builtin::Tr808 => sampler::tr808(args, state.player()),
            Builtin::Piano => sampler::piano(args, state.player()),
            Builtin::Sample(id) => sampler::sample(args, state.player(), id),
        }
    }
}

/// Error returned when a sample function cannot be registered.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterError {
    /// The name is already taken by a built-in function.
    Reserved(String),
    /// The name is not a valid identifier.
    InvalidName(String),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::Reserved(name) => {
                write!(f, "'{name}' is a built-in function and cannot be redefined")
            }
            RegisterError::InvalidName(name) => write!(f, "'{name}' is not a valid function name"),
        }
    }
}

impl std::error::Error for RegisterError {}

/// The function table plus the PCM data and sample loader the players read.
///
/// Built once per engine. Sample functions can be registered later; their
/// ids are stable, so programs compiled earlier stay valid.
pub struct Library {
    functions: HashMap<String, Builtin>,
    samples: Vec<String>,
    loader: Option<Arc<dyn SampleLoader>>,
    drums: Arc<PcmBank>,
    piano: Arc<PianoBank>,
}

impl Library {
    pub fn new(drums: Arc<PcmBank>, piano: Arc<PianoBank>) -> Self {
        let functions = BUILTINS
            .iter()
            .map(|(name, f)| (name.to_string(), *f))
            .collect();
        Self {
            functions,
            samples: Vec::new(),
            loader: None,
            drums,
            piano,
        }
    }

    /// Resolve a function name.
    pub fn lookup(&self, name: &str) -> Option<Builtin> {
        self.functions.get(name).copied()
    }

    /// Register `name` as a sample-player function. Registering the same
    /// sample twice returns the existing id.
    pub fn register_sample(&mut self, name: &str) -> Result<SampleId, RegisterError> {
        if let Some(existing) = self.functions.get(name) {
            return match existing {
                Builtin::Sample(id) => Ok(*id),
                _ => Err(RegisterError::Reserved(name.to_string())),
            };
        }
        let valid = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '#');
        if !valid {
            return Err(RegisterError::InvalidName(name.to_string()));
        }
        let id = SampleId(self.samples.len());
        self.samples.push(name.to_string());
        self.functions.insert(name.to_string(), Builtin::Sample(id));
        Ok(id)
    }

    pub fn sample_name(&self, id: SampleId) -> Option<&str> {
        self.samples.get(id.0).map(String::as_str)
    }

    /// Names of all registered sample functions, in registration order.
    pub fn sample_names(&self) -> &[String] {
        &self.samples
    }

    pub fn set_loader(&mut self, loader: Arc<dyn SampleLoader>) {
        self.loader = Some(loader);
    }

    pub fn loader(&self) -> Option<&dyn SampleLoader> {
        self.loader.as_deref()
    }

    pub fn drums(&self) -> &PcmBank {
        &self.drums
    }

    pub fn piano(&self) -> &PianoBank {
        &self.piano
    }
}

/// Mutable per-engine evaluation context.
#[derive(Debug)]
pub struct Runtime {
    pub(crate) sample_rate: f32,
    pub(crate) rng: ChaCha8Rng,
}

impl Runtime {
    pub fn new(sample_rate: u32, seed: u64) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
