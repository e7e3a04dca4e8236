//! Reactor state and control vectors
//!
//! Fixed-size wrappers around `nalgebra` vectors. The wrappers give the
//! components names (`cb()`, `volume()`, `tc()`, ...) while keeping the
//! vector arithmetic the solvers need (`+`, `* f64`).

use nalgebra::{Vector2, Vector5};
use serde::{Deserialize, Serialize};

use crate::physics::traits::StateVariable;

// =================================================================================================
// Reactor State
// =================================================================================================

/// State vector `x = (Ca, Cb, Cc, T, V)`
///
/// Also used to carry derivatives `dx/dt`, which share the layout.
///
/// # Example
/// ```
/// use cstr_rs::physics::ReactorState;
///
/// let state = ReactorState::new(0.8, 0.0, 0.0, 325.0, 100.0);
/// assert_eq!(state.temperature(), 325.0);
/// assert_eq!(state.volume(), 100.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactorState {
    values: Vector5<f64>,
}

impl ReactorState {
    /// Create a state from its five components
    pub fn new(ca: f64, cb: f64, cc: f64, temperature: f64, volume: f64) -> Self {
        Self {
            values: Vector5::new(ca, cb, cc, temperature, volume),
        }
    }

    /// Create from an array in state-vector order
    pub fn from_array(values: [f64; 5]) -> Self {
        Self {
            values: Vector5::from(values),
        }
    }

    /// Create from an `nalgebra` vector
    pub fn from_vector(values: Vector5<f64>) -> Self {
        Self { values }
    }

    /// All components zero
    pub fn zeros() -> Self {
        Self {
            values: Vector5::zeros(),
        }
    }

    pub fn ca(&self) -> f64 {
        self.values[0]
    }

    pub fn cb(&self) -> f64 {
        self.values[1]
    }

    pub fn cc(&self) -> f64 {
        self.values[2]
    }

    pub fn temperature(&self) -> f64 {
        self.values[3]
    }

    pub fn volume(&self) -> f64 {
        self.values[4]
    }

    /// Get a component by identifier
    pub fn get(&self, variable: StateVariable) -> f64 {
        self.values[variable.index()]
    }

    /// Set a component by identifier
    pub fn set(&mut self, variable: StateVariable, value: f64) {
        self.values[variable.index()] = value;
    }

    /// Underlying vector
    pub fn as_vector(&self) -> &Vector5<f64> {
        &self.values
    }

    /// Components as a plain array
    pub fn to_array(&self) -> [f64; 5] {
        [
            self.values[0],
            self.values[1],
            self.values[2],
            self.values[3],
            self.values[4],
        ]
    }

    /// Apply a closure to every component, in the order `Ca, Cb, Cc, T, V`
    pub fn map(&self, mut f: impl FnMut(StateVariable, f64) -> f64) -> Self {
        let mut result = *self;
        for variable in StateVariable::ALL {
            result.set(variable, f(variable, self.get(variable)));
        }
        result
    }

    /// First component that is NaN or infinite, if any
    pub fn first_non_finite(&self) -> Option<(StateVariable, f64)> {
        StateVariable::ALL
            .iter()
            .map(|&variable| (variable, self.get(variable)))
            .find(|(_, value)| !value.is_finite())
    }

    /// Largest absolute component
    pub fn max_abs(&self) -> f64 {
        self.values.amax()
    }
}

// Operator overloading for numerical operations

impl std::ops::Add for ReactorState {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            values: self.values + rhs.values,
        }
    }
}

impl std::ops::Sub for ReactorState {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            values: self.values - rhs.values,
        }
    }
}

impl std::ops::Mul<f64> for ReactorState {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self {
            values: self.values * scalar,
        }
    }
}

// =================================================================================================
// Control Action
// =================================================================================================

/// Control vector `u = (Tc, Fin)`
///
/// `Tc` is the cooling-jacket temperature (K), `Fin` the inlet flow
/// (m³/min).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlAction {
    values: Vector2<f64>,
}

impl ControlAction {
    pub fn new(tc: f64, fin: f64) -> Self {
        Self {
            values: Vector2::new(tc, fin),
        }
    }

    pub fn from_array(values: [f64; 2]) -> Self {
        Self::new(values[0], values[1])
    }

    /// Cooling-jacket temperature (K)
    pub fn tc(&self) -> f64 {
        self.values[0]
    }

    /// Inlet flow rate (m³/min)
    pub fn fin(&self) -> f64 {
        self.values[1]
    }

    pub fn as_vector(&self) -> &Vector2<f64> {
        &self.values
    }

    pub fn to_array(&self) -> [f64; 2] {
        [self.values[0], self.values[1]]
    }
}

// =================================================================================================
// Tests
// =================================================================================================
