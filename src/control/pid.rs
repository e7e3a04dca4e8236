//! Velocity-form PID controller
//!
//! # Algorithm
//!
//! Each loop computes an increment and adds it to the previous control:
//!
//! ```text
//! Δu = Kp·(e_t − e_{t-1}) + (Kp/Ki')·e_t·dt − Kp·Kd'·(e_t − 2e_{t-1} + e_{t-2})/dt
//! u_t = clamp(u_{t-1} + Δu)
//! ```
//!
//! with `Ki' = Ki + ε` and `Kd' = Kd + ε`, `ε = 1e-8`. The offset keeps a
//! zero integral gain finite; it slightly perturbs an exact zero gain and
//! is kept as part of the control law.
//!
//! Loop 1 drives `Tc` from the Cb error, loop 2 drives `Fin` from the
//! volume error. The loops do not interact.

use crate::control::gains::{LoopGains, PidGains};
use crate::control::history::{RollingHistory, TrackingError};
use crate::control::limits::ControlLimits;
use crate::physics::ControlAction;

/// Offset added to `Ki` and `Kd` before use
pub const GAIN_EPSILON: f64 = 1e-8;

/// Two decoupled velocity-form PID loops with output clamping
///
/// # Example
///
/// ```rust
/// use cstr_rs::control::{ControlLimits, PidGains, RollingHistory, TrackingError, VelocityPid};
/// use cstr_rs::physics::ControlAction;
///
/// let pid = VelocityPid::new(ControlLimits::default());
/// let gains = PidGains::from_array([10.0, 5.0, 0.1, 0.5, 0.5, 0.1]);
///
/// let errors = RollingHistory::new(2, TrackingError::new(0.7, 0.0));
/// let controls = RollingHistory::new(2, ControlAction::new(300.0, 100.0));
///
/// // Cb below setpoint: the velocity form only reacts through the integral term
/// let u = pid.update(&gains, TrackingError::new(0.7, 0.0), &errors, &controls, 1.0);
/// assert!(u.tc() > 300.0);
/// assert_eq!(u.fin(), 100.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityPid {
    limits: ControlLimits,
    epsilon: f64,
}

impl VelocityPid {
    pub fn new(limits: ControlLimits) -> Self {
        Self {
            limits,
            epsilon: GAIN_EPSILON,
        }
    }

    pub fn limits(&self) -> &ControlLimits {
        &self.limits
    }

    /// Increment of one loop
    ///
    /// `e1` and `e2` are the previous two errors, most recent first.
    fn delta(&self, gains: &LoopGains, e: f64, e1: f64, e2: f64, dt: f64) -> f64 {
        let ki = gains.ki + self.epsilon;
        let kd = gains.kd + self.epsilon;

        let proportional = gains.kp * (e - e1);
        let integral = (gains.kp / ki) * e * dt;
        let derivative = gains.kp * kd * (e - 2.0 * e1 + e2) / dt;

        proportional + integral - derivative
    }

    /// Next clamped control from the current error and both histories
    ///
    /// `errors` and `controls` must not yet contain the current step.
    pub fn update(
        &self,
        gains: &PidGains,
        error: TrackingError,
        errors: &RollingHistory<TrackingError>,
        controls: &RollingHistory<ControlAction>,
        dt: f64,
    ) -> ControlAction {
        let e1 = errors.latest();
        let e2 = errors.previous();
        let previous = controls.latest();

        let tc = previous.tc() + self.delta(&gains.cb, error.cb, e1.cb, e2.cb, dt);
        let fin = previous.fin() + self.delta(&gains.v, error.v, e1.v, e2.v, dt);

        ControlAction::new(self.limits.clamp_tc(tc), self.limits.clamp_fin(fin))
    }
}

impl Default for VelocityPid {
    fn default() -> Self {
        Self::new(ControlLimits::default())
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn histories(
        e1: TrackingError,
        e2: TrackingError,
        u: ControlAction,
    ) -> (RollingHistory<TrackingError>, RollingHistory<ControlAction>) {
        let mut errors = RollingHistory::new(2, e2);
        errors.push(e1);
        (errors, RollingHistory::new(2, u))
    }

    #[test]
    fn test_increment_matches_formula() {
        let pid = VelocityPid::default();
        let gains = PidGains::from_array([2.0, 4.0, 0.5, 0.3, 1.5, 0.2]);
        let (errors, controls) = histories(
            TrackingError::new(0.2, 1.0),
            TrackingError::new(0.3, 2.0),
            ControlAction::new(320.0, 100.0),
        );

        let e = TrackingError::new(0.1, 0.5);
        let dt = 1.0;
        let u = pid.update(&gains, e, &errors, &controls, dt);

        let ki = 4.0 + 1e-8;
        let kd = 0.5 + 1e-8;
        let expected_tc = 320.0
            + 2.0 * (0.1 - 0.2)
            + (2.0 / ki) * 0.1 * dt
            - 2.0 * kd * (0.1 - 2.0 * 0.2 + 0.3) / dt;
        assert_relative_eq!(u.tc(), expected_tc, epsilon = 1e-12);

        let ki = 1.5 + 1e-8;
        let kd = 0.2 + 1e-8;
        let expected_fin = 100.0
            + 0.3 * (0.5 - 1.0)
            + (0.3 / ki) * 0.5 * dt
            - 0.3 * kd * (0.5 - 2.0 * 1.0 + 2.0) / dt;
        assert_relative_eq!(u.fin(), expected_fin, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_integral_gain_stays_finite() {
        let pid = VelocityPid::default();
        let gains = PidGains::from_array([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let (errors, controls) = histories(
            TrackingError::default(),
            TrackingError::default(),
            ControlAction::new(300.0, 100.0),
        );

        let u = pid.update(&gains, TrackingError::new(1e-9, -1e-9), &errors, &controls, 1.0);

        assert!(u.tc().is_finite() && u.fin().is_finite());
        // Kp/ε amplifies a tiny error by 1e8
        assert_relative_eq!(u.tc(), 300.0 + 1e-9 + 1e-9 * 1e8, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_error_keeps_previous_control() {
        let pid = VelocityPid::default();
        let gains = PidGains::from_array([25.0, 20.0, 10.0, 1.0, 2.0, 1.0]);
        let (errors, controls) = histories(
            TrackingError::default(),
            TrackingError::default(),
            ControlAction::new(333.0, 101.0),
        );

        let u = pid.update(&gains, TrackingError::default(), &errors, &controls, 1.0);
        assert_eq!(u, ControlAction::new(333.0, 101.0));
    }

    #[test]
    fn test_output_is_clamped() {
        let pid = VelocityPid::default();
        let gains = PidGains::from_array([25.0, 0.0, 0.02, 1.0, 0.0, 0.01]);
        let (errors, controls) = histories(
            TrackingError::default(),
            TrackingError::default(),
            ControlAction::new(300.0, 100.0),
        );

        let high = pid.update(&gains, TrackingError::new(10.0, 10.0), &errors, &controls, 1.0);
        assert_eq!(high.to_array(), [450.0, 105.0]);

        let low = pid.update(&gains, TrackingError::new(-10.0, -10.0), &errors, &controls, 1.0);
        assert_eq!(low.to_array(), [290.0, 95.0]);
    }
}
