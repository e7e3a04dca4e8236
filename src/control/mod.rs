//! Feedback control
//!
//! The controller sees the plant only through delayed, noisy measurements
//! and acts through a delayed actuator (both handled by the environment).
//! This module holds the pieces that do not know about delays:
//!
//! - [`GainScaling`] maps a normalized action vector onto [`PidGains`]
//! - [`VelocityPid`] turns gains, error and history into a clamped
//!   [`ControlAction`](crate::physics::ControlAction)
//! - [`ControlLimits`] holds the clamp ranges
//! - [`RollingHistory`] keeps the two most recent errors and controls

pub mod gains;
pub mod history;
pub mod limits;
pub mod pid;

pub use gains::{GainScaling, LoopGains, PidGains, ACTION_DIM};
pub use history::{RollingHistory, TrackingError};
pub use limits::ControlLimits;
pub use pid::{VelocityPid, GAIN_EPSILON};
