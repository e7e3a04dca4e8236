//! Helper functions for integration tests

use cstr_rs::control::{GainScaling, LoopGains, PidGains, ACTION_DIM};
use cstr_rs::environment::EnvironmentConfig;
use cstr_rs::physics::ReactorState;
use cstr_rs::rollout::ConstantPolicy;
use cstr_rs::solver::SolverType;

/// Assert that two reactor states agree component-wise within `tolerance`
pub fn assert_states_close(
    state1: &ReactorState,
    state2: &ReactorState,
    tolerance: f64,
    message: &str,
) {
    for (i, (v1, v2)) in state1
        .to_array()
        .iter()
        .zip(state2.to_array().iter())
        .enumerate()
    {
        let diff = (v1 - v2).abs();
        assert!(
            diff < tolerance,
            "{}: component {} differs by {} (tolerance {})",
            message, i, diff, tolerance
        );
    }
}

/// Compute relative error: |actual - expected| / |expected|
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// Default environment with a fixed-step solver, for tests that run
/// many episodes
pub fn fast_config(simulation_steps: usize) -> EnvironmentConfig {
    EnvironmentConfig {
        simulation_steps,
        solver: SolverType::RungeKutta4 { substeps: 200 },
        ..EnvironmentConfig::default()
    }
}

/// Gains `(10, 5, 0.1, 0.5, 0.5, 0.1)`
pub fn tuned_gains() -> PidGains {
    PidGains {
        cb: LoopGains { kp: 10.0, ki: 5.0, kd: 0.1 },
        v: LoopGains { kp: 0.5, ki: 0.5, kd: 0.1 },
    }
}

/// Constant policy requesting [`tuned_gains`] under the default scaling
pub fn tuned_policy() -> ConstantPolicy {
    ConstantPolicy::from_gains(&GainScaling::default(), &tuned_gains())
}

/// Normalized action of [`tuned_policy`]
pub fn tuned_action() -> [f64; ACTION_DIM] {
    *tuned_policy().action()
}
