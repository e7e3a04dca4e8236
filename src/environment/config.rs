//! Environment configuration
//!
//! Every field has a default, so a JSON file only needs to name what it
//! changes:
//!
//! ```json
//! { "noise_level": 0.0, "solver": { "method": "runge_kutta4", "substeps": 20 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::control::{ControlLimits, GainScaling};
use crate::environment::RearmPolicy;
use crate::error::{CstrResult, SimulationError};
use crate::physics::{ControlAction, ReactorState};
use crate::solver::SolverType;

/// Settings of one closed-loop environment
///
/// # Example
///
/// ```rust
/// use cstr_rs::environment::EnvironmentConfig;
///
/// let config = EnvironmentConfig::from_json_str(r#"{ "simulation_steps": 50 }"#).unwrap();
/// assert_eq!(config.simulation_steps, 50);
/// assert_eq!(config.transport_delay_steps, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Episode horizon in steps
    pub simulation_steps: usize,
    /// Control interval \[min\]
    pub dt: f64,
    /// Relative width of the parameter uncertainty band
    pub uncertainty_level: f64,
    /// Relative standard deviation of the measurement noise
    pub noise_level: f64,
    /// Actuator delay in steps (0 is treated as 1)
    pub actuator_delay_steps: usize,
    /// Transport delay in steps (0 is treated as 1)
    pub transport_delay_steps: usize,
    pub enable_disturbances: bool,
    /// Steps between disturbances
    pub disturbance_interval: usize,
    pub disturbance_rearm: RearmPolicy,
    pub setpoint_cb: f64,
    pub setpoint_v: f64,
    /// `[Ca, Cb, Cc, T, V]` at the start of every episode
    pub initial_state: [f64; 5],
    /// `[Tc, Fin]` seeded into the control history and actuator buffer
    pub default_control: [f64; 2],
    pub gain_scaling: GainScaling,
    pub control_limits: ControlLimits,
    pub solver: SolverType,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            simulation_steps: 100,
            dt: 1.0,
            uncertainty_level: 0.1,
            noise_level: 0.02,
            actuator_delay_steps: 1,
            transport_delay_steps: 2,
            enable_disturbances: true,
            disturbance_interval: 20,
            disturbance_rearm: RearmPolicy::default(),
            setpoint_cb: 0.70,
            setpoint_v: 100.0,
            initial_state: [0.8, 0.0, 0.0, 325.0, 100.0],
            default_control: [300.0, 100.0],
            gain_scaling: GainScaling::default(),
            control_limits: ControlLimits::default(),
            solver: SolverType::default(),
        }
    }
}

impl EnvironmentConfig {
    /// No noise, no uncertainty, no disturbances, one step of delay on both paths
    pub fn deterministic() -> Self {
        Self {
            uncertainty_level: 0.0,
            noise_level: 0.0,
            actuator_delay_steps: 1,
            transport_delay_steps: 1,
            enable_disturbances: false,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> CstrResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> CstrResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> CstrResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn initial_state(&self) -> ReactorState {
        ReactorState::from_array(self.initial_state)
    }

    pub fn default_control(&self) -> ControlAction {
        ControlAction::from_array(self.default_control)
    }

    /// Actuator buffer length
    pub fn actuator_delay(&self) -> usize {
        self.actuator_delay_steps.max(1)
    }

    /// Measurement buffer length
    pub fn transport_delay(&self) -> usize {
        self.transport_delay_steps.max(1)
    }

    /// Reject settings the simulator cannot run with
    pub fn validate(&self) -> CstrResult<()> {
        if self.simulation_steps == 0 {
            return Err(SimulationError::configuration(
                "simulation_steps must be greater than 0",
            ));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimulationError::configuration(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        for (name, value) in [
            ("uncertainty_level", self.uncertainty_level),
            ("noise_level", self.noise_level),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimulationError::configuration(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        if self.disturbance_interval == 0 {
            return Err(SimulationError::configuration(
                "disturbance_interval must be greater than 0",
            ));
        }
        if !(self.setpoint_cb.is_finite() && self.setpoint_v.is_finite()) {
            return Err(SimulationError::configuration("setpoints must be finite"));
        }

        let initial = self.initial_state();
        if let Some((variable, value)) = initial.first_non_finite() {
            return Err(SimulationError::configuration(format!(
                "initial {} must be finite, got {}",
                variable, value
            )));
        }
        if initial.volume() <= 0.0 || initial.temperature() <= 0.0 {
            return Err(SimulationError::configuration(
                "initial volume and temperature must be positive",
            ));
        }

        self.gain_scaling.validate()?;
        self.control_limits.validate()?;
        if !self.control_limits.contains(&self.default_control()) {
            return Err(SimulationError::configuration(format!(
                "default control {:?} lies outside the control limits",
                self.default_control
            )));
        }

        self.solver.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EnvironmentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation_steps, 100);
        assert_eq!(config.disturbance_rearm, RearmPolicy::Interval);
    }

    #[test]
    fn test_deterministic_preset() {
        let config = EnvironmentConfig::deterministic();
        assert_eq!(config.noise_level, 0.0);
        assert_eq!(config.uncertainty_level, 0.0);
        assert!(!config.enable_disturbances);
        assert_eq!(config.actuator_delay(), 1);
        assert_eq!(config.transport_delay(), 1);
    }

    #[test]
    fn test_zero_delay_treated_as_one() {
        let config = EnvironmentConfig {
            actuator_delay_steps: 0,
            transport_delay_steps: 0,
            ..EnvironmentConfig::default()
        };
        assert_eq!(config.actuator_delay(), 1);
        assert_eq!(config.transport_delay(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_dt = EnvironmentConfig {
            dt: 0.0,
            ..EnvironmentConfig::default()
        };
        assert!(bad_dt.validate().is_err());

        let bad_noise = EnvironmentConfig {
            noise_level: -0.1,
            ..EnvironmentConfig::default()
        };
        assert!(bad_noise.validate().is_err());

        let empty_tank = EnvironmentConfig {
            initial_state: [0.8, 0.0, 0.0, 325.0, 0.0],
            ..EnvironmentConfig::default()
        };
        assert!(empty_tank.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_with_legacy_rearm() {
        let json = r#"{
            "disturbance_rearm": "cumulative",
            "solver": { "method": "euler", "substeps": 100 }
        }"#;
        let config = EnvironmentConfig::from_json_str(json).unwrap();
        assert_eq!(config.disturbance_rearm, RearmPolicy::Cumulative);
        assert_eq!(config.solver, SolverType::Euler { substeps: 100 });

        let again = EnvironmentConfig::from_json_str(&config.to_json_string().unwrap()).unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "dt": 0.5, "enable_disturbances": false }}"#).unwrap();

        let config = EnvironmentConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.dt, 0.5);
        assert!(!config.enable_disturbances);
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        let result = EnvironmentConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(SimulationError::Json(_))));
    }
}
