//! Gaussian noise source.
//!
//! Box–Muller transform over a uniform draw in the open interval (0, 1).
//! A uniform draw of exactly 0 is redrawn so the logarithm never sees it.

use rand::distributions::Standard;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Standard-normal sampler scaled per call.
pub struct GaussianNoise<R = StdRng> {
    rng: R,
}

impl GaussianNoise<StdRng> {
    /// Fixed seed: identical sequences across runs.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> GaussianNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Sample from N(0, sigma²).
    pub fn sample(&mut self, sigma: f64) -> f64 {
        let u = self.open_unit();
        let v = self.open_unit();
        sigma * (-2.0 * u.ln()).sqrt() * (2.0 * core::f64::consts::PI * v).cos()
    }

    /// Uniform draw in (0, 1).
    fn open_unit(&mut self) -> f64 {
        loop {
            let u: f64 = self.rng.sample(Standard);
            if u > 0.0 {
                return u;
            }
        }
    }
}
