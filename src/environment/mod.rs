//! Closed-loop environment
//!
//! Wraps the reactor model, the controller and a numerical solver into an
//! interactive episode with a step/reset contract. Between the controller
//! and the plant sit the imperfections of a real loop:
//!
//! - **Parameter uncertainty**: the "true" parameters are sampled around
//!   nominal at every reset
//! - **Actuator delay**: [`DelayBuffer`] on the control path
//! - **Transport delay**: [`DelayBuffer`] on the measurement path
//! - **Measurement noise**: [`MeasurementNoise`]
//! - **Disturbances**: [`DisturbanceGenerator`]
//!
//! # Example
//!
//! ```rust
//! use cstr_rs::environment::{ClosedLoopSimulator, Environment, EnvironmentConfig};
//!
//! let mut env = ClosedLoopSimulator::with_seed(EnvironmentConfig::deterministic(), 0).unwrap();
//! let (observation, _) = env.reset(Some(0));
//! assert_eq!(observation.volume(), 100.0);
//!
//! let result = env.step(&[0.0; 6]).unwrap();
//! assert!(!result.done);
//! assert!(!result.truncated);
//! ```

pub mod config;
pub mod delay;
pub mod disturbance;
pub mod log;
pub mod noise;
pub mod observation;
pub mod simulator;

pub use config::EnvironmentConfig;
pub use delay::DelayBuffer;
pub use disturbance::{Disturbance, DisturbanceGenerator, PendingFix, RearmPolicy};
pub use log::{EpisodeLog, TimeSeriesRecord};
pub use noise::MeasurementNoise;
pub use observation::{Observation, ObservationBounds, OBSERVATION_DIM};
pub use simulator::{ClosedLoopSimulator, Environment, ResetInfo, StepInfo, StepResult};
