//! Error types
//!
//! Every fallible operation in the crate returns [`CstrResult`].
//! Variants map onto the three failure classes of the closed loop:
//!
//! - **Fatal numerical errors**: the plant left its physical domain
//!   (non-positive volume or temperature, non-finite values). The episode
//!   cannot continue because every later history entry would be poisoned.
//! - **Configuration errors**: malformed actions or environment settings,
//!   rejected before anything is mutated.
//! - **Collaborator errors**: rendering, export and I/O failures.
//!
//! Noise-induced negative readings and disturbances are *not* errors.

use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum SimulationError {
    /// The plant state or its derivative left the physically valid domain
    #[error("Fatal numerical error at step {step}: {variable} = {value} ({reason})")]
    FatalNumerical {
        step: usize,
        variable: String,
        value: f64,
        reason: String,
    },

    /// Invalid action vector or environment configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// `step` was called after the horizon was reached and before `reset`
    #[error("Episode finished after {horizon} steps; call reset() before stepping again")]
    EpisodeFinished { horizon: usize },

    /// Adaptive integration could not complete the requested interval
    #[error("Integration failed: {reason}")]
    IntegrationFailed { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl SimulationError {
    /// Shorthand for a [`SimulationError::FatalNumerical`]
    pub fn fatal(step: usize, variable: impl Into<String>, value: f64, reason: impl Into<String>) -> Self {
        Self::FatalNumerical {
            step,
            variable: variable.into(),
            value,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`SimulationError::Configuration`]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Attach the simulation step at which a numerical failure surfaced
    ///
    /// Models and solvers do not know the episode step; the simulator
    /// stamps it on the way out. Other variants pass through unchanged.
    pub fn at_step(self, step: usize) -> Self {
        match self {
            Self::FatalNumerical { variable, value, reason, .. } => Self::FatalNumerical {
                step,
                variable,
                value,
                reason,
            },
            other => other,
        }
    }

    /// True for errors that end the episode
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FatalNumerical { .. } | Self::IntegrationFailed { .. }
        )
    }
}

pub type CstrResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_error_message() {
        let error = SimulationError::fatal(12, "V", -0.5, "volume must stay positive");
        let message = error.to_string();

        assert!(message.contains("step 12"));
        assert!(message.contains("V = -0.5"));
        assert!(error.is_fatal());
    }

    #[test]
    fn test_at_step_rewrites_fatal_only() {
        let error = SimulationError::fatal(0, "T", -1.0, "temperature must stay positive").at_step(42);
        assert!(error.to_string().contains("step 42"));

        let error = SimulationError::configuration("bad").at_step(42);
        assert!(!error.to_string().contains("42"));
    }

    #[test]
    fn test_configuration_error_is_not_fatal() {
        let error = SimulationError::configuration("action must have 6 components");
        assert!(!error.is_fatal());
        assert!(error.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: SimulationError = io.into();
        assert!(matches!(error, SimulationError::Io(_)));
    }
}
