//! Common utilities for integration tests

#![allow(dead_code)]

pub mod mock_models;
pub mod reference;
pub mod test_helpers;

// Re-export commonly used items
pub use mock_models::{ExponentialDecay, LinearHeating};
pub use reference::{reference_cb_trajectory, ReferenceLoop};
pub use test_helpers::{
    assert_states_close,
    fast_config,
    relative_error,
    tuned_action,
    tuned_gains,
    tuned_policy,
};
