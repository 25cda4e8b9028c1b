//! The synthesis engine: variable table, function library, the current and
//! pending programs, and the per-sample scheduler.
//!
//! An [`Engine`] is single-threaded. [`SharedEngine`] wraps it for use from
//! an audio callback plus control threads.

pub mod program;
pub mod shared;
pub mod vars;
pub mod voices;

use std::sync::Arc;

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::debug;

use crate::dsl::{self, CompileError, Compiler, Expr};
use crate::instrument::{build_piano, build_tr808, DRUM_NAMES};
use crate::library::{Library, RegisterError, Runtime, SampleId, SampleLoader};
use crate::midi::message::{MidiMessage, MOD_WHEEL};

pub use program::Program;
pub use shared::SharedEngine;
pub use vars::{VarId, VarTable};
pub use voices::{VoiceBank, VOICES};

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 0x6c69_7463_68;

/// Transport units per second. `t` counts these regardless of sample rate.
const TRANSPORT_RATE: f64 = 8000.0;

/// Programs waiting to be released by a control thread.
const RETIRED_CAPACITY: usize = 8;

pub struct Engine {
    vars: VarTable,
    lib: Library,
    rt: Runtime,
    current: Option<Program>,
    pending: Option<Program>,
    frame: u64,
    last: f32,
    last_bpm: f32,
    tempo_origin: u64,
    voices: VoiceBank,
    t: VarId,
    x: VarId,
    y: VarId,
    bpm: VarId,
    retired_tx: HeapProd<Program>,
    retired_rx: HeapCons<Program>,
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_seed(sample_rate, DEFAULT_SEED)
    }

    /// Create an engine whose random functions and synthesized drums follow
    /// `seed`.
    pub fn with_seed(sample_rate: u32, seed: u64) -> Self {
        let sample_rate = sample_rate.max(1);
        let lib = Library::new(
            Arc::new(build_tr808(sample_rate, seed)),
            Arc::new(build_piano(sample_rate)),
        );
        Self::with_library(sample_rate, seed, lib)
    }

    /// Create an engine around an existing function library.
    pub fn with_library(sample_rate: u32, seed: u64, lib: Library) -> Self {
        let mut vars = VarTable::new();
        let t = vars.define("t", 0.0);
        let x = vars.define("x", 0.0);
        let y = vars.define("y", 0.0);
        let bpm = vars.define("bpm", 0.0);
        let voices = VoiceBank::new(&mut vars);
        for (name, value) in dsl::note::note_constants() {
            vars.define_constant(&name, value);
        }
        for (i, name) in DRUM_NAMES.iter().enumerate() {
            vars.define_constant(name, i as f32);
        }
        let (retired_tx, retired_rx) = HeapRb::<Program>::new(RETIRED_CAPACITY).split();

        Self {
            vars,
            lib,
            rt: Runtime::new(sample_rate.max(1), seed),
            current: None,
            pending: None,
            frame: 0,
            last: 0.0,
            last_bpm: 0.0,
            tempo_origin: 0,
            voices,
            t,
            x,
            y,
            bpm,
            retired_tx,
            retired_rx,
        }
    }

    /// Parse and bind `source`, making it the pending program.
    ///
    /// On error nothing changes: the current and pending programs keep
    /// playing and no variables are created.
    pub fn compile(&mut self, source: &str) -> Result<(), CompileError> {
        let expr = Compiler::parse(source)?;
        self.load(&expr).map(drop)
    }

    /// Bind an already parsed expression and make it the pending program.
    /// Returns the pending program it replaced, so the caller decides where
    /// it is dropped.
    pub fn load(&mut self, expr: &Expr) -> Result<Option<Program>, CompileError> {
        let program = dsl::bind(expr, &mut self.vars, &self.lib)?;
        Ok(self.pending.replace(program))
    }

    /// Produce one sample.
    pub fn next_sample(&mut self) -> f32 {
        let bpm = self.vars.get(self.bpm);
        if bpm.to_bits() != self.last_bpm.to_bits() {
            self.last_bpm = bpm;
            self.tempo_origin = self.frame;
        }
        if self.pending.is_some() && self.may_promote(bpm) {
            self.promote();
        }

        let t = (self.frame as f64 * TRANSPORT_RATE / self.rt.sample_rate as f64).floor();
        self.vars.set(self.t, t as f32);

        if let Some(program) = self.current.as_mut() {
            let v = program.eval(&mut self.vars, &mut self.rt, &self.lib);
            if !v.is_nan() {
                self.last = v;
            }
        }

        self.voices.decay(&mut self.vars, self.rt.sample_rate);
        self.frame += 1;
        self.last
    }

    /// Fill an interleaved buffer, one sample per frame copied to every
    /// channel.
    pub fn fill(&mut self, buffer: &mut [f32], channels: usize) {
        for frame in buffer.chunks_mut(channels.max(1)) {
            let v = self.next_sample();
            frame.fill(v);
        }
    }

    /// Pending programs wait for the first sample of a beat while a tempo is
    /// set; otherwise they start right away.
    fn may_promote(&self, bpm: f32) -> bool {
        if self.current.is_none() || !bpm.is_finite() || bpm <= 0.0 {
            return true;
        }
        let per_sample = bpm as f64 / 60.0 / self.rt.sample_rate as f64;
        let beat = (self.frame - self.tempo_origin) as f64 * per_sample;
        beat.fract() < per_sample
    }

    fn promote(&mut self) {
        let Some(next) = self.pending.take() else {
            return;
        };
        if let Some(old) = self.current.replace(next) {
            if let Err(program) = self.retired_tx.try_push(old) {
                // Queue full: free it on this thread.
                drop(program);
            }
        }
    }

    /// Take the programs replaced during playback so they can be dropped
    /// off the audio thread.
    pub fn drain_retired(&mut self) -> Vec<Program> {
        let mut retired = Vec::new();
        while let Some(program) = self.retired_rx.try_pop() {
            retired.push(program);
        }
        retired
    }

    /// Route a decoded MIDI message to the voices and the `x`/`y` controls.
    pub fn apply_midi(&mut self, msg: &MidiMessage) {
        match *msg {
            MidiMessage::NoteOn { note, velocity, .. } => {
                if self.voices.note_on(&mut self.vars, note, velocity).is_none() {
                    debug!(note, "all voices busy, note dropped");
                }
            }
            MidiMessage::NoteOff { note, .. } => {
                self.voices.note_off(&mut self.vars, note);
            }
            MidiMessage::PitchBend { value, .. } => {
                self.vars.set(self.x, (value as f32 - 8192.0) / 8192.0);
            }
            MidiMessage::ControlChange {
                controller: MOD_WHEEL,
                value,
                ..
            } => {
                self.vars.set(self.y, value as f32 / 127.0);
            }
            MidiMessage::ControlChange { controller, .. } => {
                debug!(controller, "ignoring control change");
            }
            MidiMessage::Other { status } => {
                debug!(status, "ignoring MIDI message");
            }
        }
    }

    /// Decode and apply a raw MIDI message.
    pub fn midi(&mut self, bytes: &[u8]) {
        match MidiMessage::parse(bytes) {
            Some(msg) => self.apply_midi(&msg),
            None => debug!(?bytes, "ignoring malformed MIDI message"),
        }
    }

    /// Set a variable, creating it if needed. Constants are left alone and
    /// `false` is returned.
    pub fn set(&mut self, name: &str, value: f32) -> bool {
        if let Some(id) = self.vars.lookup(name) {
            if self.vars.is_constant(id) {
                return false;
            }
        }
        let id = self.vars.intern(name);
        self.vars.set(id, value);
        true
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.vars.value_of(name)
    }

    /// Stop playback: drop both programs, rewind the transport and free all
    /// voices. Variables keep their values.
    pub fn reset(&mut self) {
        self.current = None;
        self.pending = None;
        self.frame = 0;
        self.last = 0.0;
        self.tempo_origin = 0;
        self.last_bpm = self.vars.get(self.bpm);
        self.voices.reset(&mut self.vars);
        self.drain_retired();
    }

    /// Register `name` as a sample-player function read through the loader.
    pub fn register_sample(&mut self, name: &str) -> Result<SampleId, RegisterError> {
        self.lib.register_sample(name)
    }

    pub fn set_loader(&mut self, loader: Arc<dyn SampleLoader>) {
        self.lib.set_loader(loader);
    }

    pub fn library(&self) -> &Library {
        &self.lib
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn sample_rate(&self) -> u32 {
        self.rt.sample_rate as u32
    }

    /// Frames produced since construction or the last [`reset`](Self::reset).
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of voices currently holding a note.
    pub fn active_voices(&self) -> usize {
        self.voices.active(&self.vars)
    }
}
