//! Injectable randomness for spawns, gravity and colors

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform samples used by the simulation.
///
/// Only `unit` is required; the helpers derive everything else from it so a
/// scripted source controls every draw.
pub trait RandomSource: Send {
    /// Uniform sample in `[0, 1)`
    fn unit(&mut self) -> f32;

    /// Uniform sample in `[min, max)`
    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.unit() * (max - min)
    }

    /// Uniform index in `0..len` (`len` must be non-zero)
    fn index(&mut self, len: usize) -> usize {
        ((self.unit() * len as f32) as usize).min(len.saturating_sub(1))
    }

    /// Fair coin flip
    fn coin(&mut self) -> bool {
        self.unit() < 0.5
    }

    /// Random sign, `1.0` or `-1.0`
    fn sign(&mut self) -> f32 {
        if self.coin() {
            1.0
        } else {
            -1.0
        }
    }
}

impl RandomSource for ChaCha8Rng {
    fn unit(&mut self) -> f32 {
        // 24 random mantissa bits keep the result strictly below 1.0
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// Production random source seeded from OS entropy
pub fn entropy_source() -> ChaCha8Rng {
    ChaCha8Rng::from_entropy()
}

/// Replays a fixed sequence of unit samples, cycling when exhausted
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<f32>,
    cursor: usize,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(values: Vec<f32>) -> Self {
        assert!(!values.is_empty(), "scripted source needs at least one value");
        Self { values, cursor: 0 }
    }

    /// Always returns the same sample
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn unit(&mut self) -> f32 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}
