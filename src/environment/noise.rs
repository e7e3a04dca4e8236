//! Measurement noise
//!
//! ```text
//! noisy_i = max(0, x_i + x_i · level · ξ_i),   ξ_i ~ N(0, 1)
//! ```
//!
//! The noise scales with the magnitude of each component and readings are
//! floored at zero.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::physics::ReactorState;

/// Relative Gaussian sensor noise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementNoise {
    level: f64,
}

impl MeasurementNoise {
    pub fn new(level: f64) -> Self {
        Self { level }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Perturb every component of `state`
    ///
    /// Always draws five normals in the order `Ca, Cb, Cc, T, V`, also for
    /// `level = 0`, so the random stream does not depend on the noise level.
    pub fn perturb<R: Rng + ?Sized>(&self, state: &ReactorState, rng: &mut R) -> ReactorState {
        state.map(|_, value| {
            let xi: f64 = rng.sample(StandardNormal);
            (value + value * self.level * xi).max(0.0)
        })
    }
}
