//! Thread-shared engine handle.
//!
//! One mutex guards the whole engine. The audio callback takes it once per
//! buffer; control threads take it once per script reload, MIDI event or
//! variable change. Script text is parsed before the lock is taken, and any
//! programs that fall out of use are dropped after it is released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::{Engine, Program};
use crate::dsl::{CompileError, Compiler};
use crate::library::{RegisterError, SampleId, SampleLoader};

#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Audio-thread entry point. A poisoned lock produces silence rather
    /// than a panic on the real-time thread.
    pub fn fill(&self, buffer: &mut [f32], channels: usize) {
        match self.inner.lock() {
            Ok(mut engine) => engine.fill(buffer, channels),
            Err(_) => buffer.fill(0.0),
        }
    }

    /// Compile a script and queue it for playback.
    pub fn compile(&self, source: &str) -> Result<(), CompileError> {
        let expr = Compiler::parse(source)?;
        let replaced = self.control(|engine| engine.load(&expr))?;
        if replaced.is_some() {
            debug!("replaced a program that never started");
        }
        Ok(())
    }

    /// Feed a raw MIDI message to the voice router.
    pub fn midi(&self, bytes: &[u8]) {
        self.control(|engine| engine.midi(bytes));
    }

    pub fn set(&self, name: &str, value: f32) -> bool {
        let written = self.control(|engine| engine.set(name, value));
        if !written {
            warn!(name, "cannot set a constant");
        }
        written
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.lock().get(name)
    }

    pub fn register_sample(&self, name: &str) -> Result<SampleId, RegisterError> {
        self.control(|engine| engine.register_sample(name))
    }

    pub fn set_loader(&self, loader: Arc<dyn SampleLoader>) {
        self.control(|engine| engine.set_loader(loader));
    }

    pub fn reset(&self) {
        self.control(Engine::reset);
    }

    pub fn sample_rate(&self) -> u32 {
        self.lock().sample_rate()
    }

    /// Run `f` under the lock, then drop any retired programs after
    /// releasing it.
    fn control<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        let (result, retired): (R, Vec<Program>) = {
            let mut engine = self.lock();
            let result = f(&mut engine);
            (result, engine.drain_retired())
        };
        drop(retired);
        result
    }

    fn lock(&self) -> MutexGuard<'_, Engine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
