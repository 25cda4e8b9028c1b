//! Glitch, a per-sample expression synthesizer for algorithmic music.
//!
//! A script is compiled into an expression tree that is evaluated once per
//! output sample. Signal functions keep private state per call site, new
//! scripts are swapped in on the beat, and MIDI notes drive a small bank of
//! voices exposed to the script as variables.

pub mod audio;
pub mod config;
pub mod dsl;
pub mod engine;
pub mod instrument;
pub mod library;
pub mod math;
pub mod midi;
pub mod osc;
pub mod render;

pub use dsl::{CompileError, ErrorKind};
pub use engine::{Engine, SharedEngine};
