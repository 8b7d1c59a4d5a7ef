//! Deterministic pseudo-random source for jiggling coincident points.
//!
//! Uses the same linear congruential generator as d3-force so that layouts
//! are reproducible across runs given the same seed.

const A: u64 = 1_664_525;
const C: u64 = 1_013_904_223;
const M: u64 = 4_294_967_296; // 2^32

/// Default seed (d3-force starts its generator at 1)
pub const DEFAULT_SEED: u32 = 1;

/// Linear congruential generator producing values in `[0, 1)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Create a generator with the given seed
    pub fn new(seed: u32) -> Self {
        Self {
            state: u64::from(seed),
        }
    }

    /// Next value in `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        self.state = (A * self.state + C) % M;
        self.state as f64 / M as f64
    }

    /// A tiny offset in `[-0.5e-6, 0.5e-6)` used to separate coincident points
    ///
    /// Never returns exactly zero.
    pub fn jiggle(&mut self) -> f64 {
        loop {
            let offset = (self.next_f64() - 0.5) * 1e-6;
            if offset != 0.0 {
                return offset;
            }
        }
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
