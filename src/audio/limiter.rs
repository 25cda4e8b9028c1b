//! Master limiter: hard clamp on the output.

/// Hard limiter that clamps samples to `[-ceiling, ceiling]`. Samples that
/// are not finite numbers become silence.
#[derive(Debug, Clone)]
pub struct Limiter {
    ceiling: f32,
}

impl Limiter {
    /// Create a new limiter with the given ceiling (should be in `(0.0, 1.0]`).
    pub fn new(ceiling: f32) -> Self {
        debug_assert!(ceiling > 0.0 && ceiling <= 1.0);
        Self { ceiling }
    }

    #[inline]
    pub fn process(&self, sample: f32) -> f32 {
        if !sample.is_finite() {
            return 0.0;
        }
        sample.clamp(-self.ceiling, self.ceiling)
    }

    /// Clamp an entire buffer in-place.
    #[inline]
    pub fn process_block(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self { ceiling: 0.95 }
    }
}
