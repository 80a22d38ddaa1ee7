//! Uniform random sources
//!
//! Game code draws all randomness through [`RandomSource`] so that a seeded
//! engine replays identically and tests can script exact draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::math::{Quat, Quaternion};

/// Source of uniform random numbers
pub trait RandomSource {
    /// Uniform float in `[0, 1)`
    fn next_f32(&mut self) -> f32;

    /// Uniform integer in `[low, high)`; returns `low` for an empty range
    fn range_usize(&mut self, low: usize, high: usize) -> usize;

    /// Uniform float in `[low, high]`
    fn range_f32(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        low + (high - low) * self.next_f32()
    }

    /// Uniformly distributed orientation (Shoemake's method)
    fn rotation(&mut self) -> Quat {
        let u1 = self.next_f32();
        let u2 = self.next_f32() * std::f32::consts::TAU;
        let u3 = self.next_f32() * std::f32::consts::TAU;
        let a = (1.0 - u1).sqrt();
        let b = u1.sqrt();
        Quat::from_quaternion(Quaternion::new(
            b * u3.cos(),
            a * u2.sin(),
            a * u2.cos(),
            b * u3.sin(),
        ))
    }
}

/// `StdRng`-backed random source
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Create a reproducible source from a seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a source seeded from the operating system
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f32(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    fn range_usize(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    fn range_f32(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Replays a fixed list of `[0, 1)` draws, cycling when it runs out
///
/// Integer ranges map a draw `u` to `low + floor(u * (high - low))`, so a
/// test can steer every choice exactly.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: Vec<f32>,
    cursor: usize,
}

impl ScriptedRandom {
    /// Create a source replaying `draws`; an empty script always yields 0
    pub fn new(draws: impl Into<Vec<f32>>) -> Self {
        Self {
            draws: draws.into(),
            cursor: 0,
        }
    }

    /// Number of draws taken so far
    pub fn taken(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f32(&mut self) -> f32 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let draw = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        draw.clamp(0.0, 1.0 - f32::EPSILON)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn range_usize(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        let span = high - low;
        let offset = (self.next_f32() * span as f32) as usize;
        low + offset.min(span - 1)
    }
}
