//! Physical model traits and types
//!
//! This module defines the core API for physical models:
//! - `PhysicalModel`: trait for all plant models
//! - `StateVariable`: type-safe identifiers for the state components

use std::fmt;

use crate::error::CstrResult;
use crate::physics::state::{ControlAction, ReactorState};

// =================================================================================================
// State variables (Type-safe Identifiers)
// =================================================================================================

/// Components of the reactor state vector `x = (Ca, Cb, Cc, T, V)`
///
/// Used instead of bare indices wherever a component is named: exports,
/// plots, error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVariable {
    /// Concentration of reactant A (mol/m³)
    ConcentrationA,

    /// Concentration of product B (mol/m³)
    ConcentrationB,

    /// Concentration of by-product C (mol/m³)
    ConcentrationC,

    /// Reactor temperature (K)
    Temperature,

    /// Reactor volume (m³)
    Volume,
}

impl StateVariable {
    /// All variables, in state-vector order
    pub const ALL: [StateVariable; 5] = [
        StateVariable::ConcentrationA,
        StateVariable::ConcentrationB,
        StateVariable::ConcentrationC,
        StateVariable::Temperature,
        StateVariable::Volume,
    ];

    /// Position in the state vector
    pub fn index(&self) -> usize {
        match self {
            StateVariable::ConcentrationA => 0,
            StateVariable::ConcentrationB => 1,
            StateVariable::ConcentrationC => 2,
            StateVariable::Temperature => 3,
            StateVariable::Volume => 4,
        }
    }

    /// Short symbol (`Ca`, `Cb`, ...)
    pub fn symbol(&self) -> &'static str {
        match self {
            StateVariable::ConcentrationA => "Ca",
            StateVariable::ConcentrationB => "Cb",
            StateVariable::ConcentrationC => "Cc",
            StateVariable::Temperature => "T",
            StateVariable::Volume => "V",
        }
    }

    /// Physical unit
    pub fn unit(&self) -> &'static str {
        match self {
            StateVariable::ConcentrationA
            | StateVariable::ConcentrationB
            | StateVariable::ConcentrationC => "mol/m³",
            StateVariable::Temperature => "K",
            StateVariable::Volume => "m³",
        }
    }
}

impl fmt::Display for StateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// =================================================================================================
// Physical Model Trait
// =================================================================================================

/// Trait for plant models
///
/// # Responsibility
/// Computes the right-hand side `f(x, u)` of `dx/dt = f(x, u)` at a given
/// state under a given (constant over the interval) control.
/// Does NOT integrate it (that's the Solver's job).
///
/// The model provides the "physics" (equations), the Solver provides
/// the "numerics" (method to integrate them).
///
/// # Purity
///
/// `compute_physics` must be free of side effects: solvers evaluate it
/// several times per step at trial states that are later discarded.
///
/// # Failure
///
/// A model returns [`SimulationError::FatalNumerical`](crate::SimulationError::FatalNumerical)
/// when the state is outside the domain where its equations are defined
/// (for the CSTR: `V <= 0`, `T <= 0`) or when a derivative is not finite.
pub trait PhysicalModel: Send + Sync {
    /// Computes the time derivative of the state
    ///
    /// # Arguments
    /// * `state` - Current (possibly trial) state of the plant
    /// * `control` - Manipulated variables held constant over the interval
    ///
    /// # Returns
    /// `dx/dt`, stored in a [`ReactorState`] with the same layout as `state`
    fn compute_physics(
        &self,
        state: &ReactorState,
        control: &ControlAction,
    ) -> CstrResult<ReactorState>;

    /// Name of the model (used to display and logging)
    fn name(&self) -> &str;

    /// Description of the model (option)
    fn description(&self) -> Option<&str> {
        None
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_variable_indices_follow_vector_order() {
        for (position, variable) in StateVariable::ALL.iter().enumerate() {
            assert_eq!(variable.index(), position);
        }
    }

    #[test]
    fn test_state_variable_display() {
        assert_eq!(StateVariable::ConcentrationB.to_string(), "Cb");
        assert_eq!(StateVariable::Temperature.unit(), "K");
        assert_eq!(StateVariable::Volume.unit(), "m³");
    }
}
