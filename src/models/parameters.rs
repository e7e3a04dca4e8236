//! Process parameters of the CSTR
//!
//! The parameter set is split in two:
//!
//! - [`ProcessParameters`]: the values that differ between the model and
//!   "reality". Sampled once per episode inside an uncertainty band and
//!   then perturbed by disturbances.
//! - [`ReactorConstants`]: values that are known exactly and never change
//!   (outflow, density, heat capacity, activation energies, heats of
//!   reaction).

use rand::Rng;
use serde::{Deserialize, Serialize};

// =================================================================================================
// Uncertain parameters
// =================================================================================================

/// Parameters subject to uncertainty and disturbances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessParameters {
    /// Feed temperature Tf \[K\]
    pub tf: f64,
    /// Feed concentration of A, Caf \[mol/m³\]
    pub caf: f64,
    /// Heat-transfer coefficient times area UA \[W/K\]
    pub ua: f64,
    /// Pre-exponential factor of A → B \[1/min\]
    pub k0_ab: f64,
    /// Pre-exponential factor of B → C \[1/min\]
    pub k0_bc: f64,
}

impl ProcessParameters {
    /// Nominal (model-assumed) values
    pub fn nominal() -> Self {
        Self {
            tf: 350.0,
            caf: 1.0,
            ua: 5e4,
            k0_ab: 7.2e10,
            k0_bc: 8.2e10,
        }
    }

    /// Sample a "true" parameter set around the nominal values
    ///
    /// Each parameter is `nominal · (1 + level · (u − 0.5))` with
    /// `u ~ U[0, 1)`, so it lies within `±level/2` of nominal. Draws are
    /// consumed in the order `Tf, Caf, UA, k0_AB, k0_BC`.
    ///
    /// `level = 0` still consumes five draws and returns the nominal set.
    pub fn sample_uncertain<R: Rng + ?Sized>(level: f64, rng: &mut R) -> Self {
        let nominal = Self::nominal();
        let mut perturb = |value: f64| value * (1.0 + level * (rng.gen::<f64>() - 0.5));

        Self {
            tf: perturb(nominal.tf),
            caf: perturb(nominal.caf),
            ua: perturb(nominal.ua),
            k0_ab: perturb(nominal.k0_ab),
            k0_bc: perturb(nominal.k0_bc),
        }
    }
}

impl Default for ProcessParameters {
    fn default() -> Self {
        Self::nominal()
    }
}

// =================================================================================================
// Fixed constants
// =================================================================================================

/// Constants of the reactor that are never perturbed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactorConstants {
    /// Outlet flow Fout \[m³/min\]
    pub fout: f64,
    /// Density ρ \[kg/m³\]
    pub rho: f64,
    /// Heat capacity Cp \[J/(kg·K)\]
    pub cp: f64,
    /// Heat released by A → B \[J/mol\]
    pub heat_ab: f64,
    /// Activation energy over gas constant for A → B \[K\]
    pub e_over_r_ab: f64,
    /// Heat released by B → C \[J/mol\]
    pub heat_bc: f64,
    /// Activation energy over gas constant for B → C \[K\]
    pub e_over_r_bc: f64,
}

impl Default for ReactorConstants {
    fn default() -> Self {
        Self {
            fout: 100.0,
            rho: 1000.0,
            cp: 0.239,
            heat_ab: 5e3,
            e_over_r_ab: 8750.0,
            heat_bc: 4e3,
            e_over_r_bc: 10750.0,
        }
    }
}

impl ReactorConstants {
    /// Volumetric heat capacity ρ·Cp
    #[inline]
    pub fn heat_capacity(&self) -> f64 {
        self.rho * self.cp
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_zero_uncertainty_returns_nominal() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let sampled = ProcessParameters::sample_uncertain(0.0, &mut rng);
        assert_eq!(sampled, ProcessParameters::nominal());
    }

    #[test]
    fn test_sampled_parameters_stay_in_band() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let nominal = ProcessParameters::nominal();
        let level = 0.1;

        for _ in 0..200 {
            let sampled = ProcessParameters::sample_uncertain(level, &mut rng);
            for (value, reference) in [
                (sampled.tf, nominal.tf),
                (sampled.caf, nominal.caf),
                (sampled.ua, nominal.ua),
                (sampled.k0_ab, nominal.k0_ab),
                (sampled.k0_bc, nominal.k0_bc),
            ] {
                let relative = (value - reference) / reference;
                assert!(relative.abs() <= level / 2.0 + 1e-12);
            }
        }
    }

    #[test]
    fn test_sampling_is_seed_deterministic() {
        let a = ProcessParameters::sample_uncertain(0.2, &mut ChaCha8Rng::seed_from_u64(3));
        let b = ProcessParameters::sample_uncertain(0.2, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_heat_capacity() {
        let constants = ReactorConstants::default();
        assert!((constants.heat_capacity() - 239.0).abs() < 1e-12);
    }
}
