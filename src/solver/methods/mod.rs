//! Numerical methods for the reactor equations
//!
//! This module contains concrete implementations of the [`Solver`](crate::solver::Solver) trait.
//!
//! # Available Methods
//!
//! ## Fixed sub-stepping
//!
//! - **[`EulerSolver`]**: Forward Euler method
//!   - Order: First-order O(h)
//!   - Cost: 1 function evaluation per sub-step
//!   - Use: baselines and benchmarks
//!
//! - **[`RK4Solver`]**: Classical fourth-order Runge-Kutta
//!   - Order: Fourth-order O(h⁴)
//!   - Cost: 4 function evaluations per sub-step
//!   - Use: fast closed-loop rollouts with a known sub-step count
//!
//! ## Adaptive
//!
//! - **[`DormandPrinceSolver`]**: embedded 5(4) pair with mixed error control
//!   - Cost: 6 function evaluations per accepted step (FSAL)
//!   - Use: **default** for the closed-loop environment
//!
//! # Design Philosophy
//!
//! Each solver is:
//! - **Self-contained**: no shared mutable state
//! - **Stateless**: reused across intervals and episodes
//! - **Copy**: cheap to hand to worker threads

mod dormand_prince;
mod euler;
mod rk4;

#[cfg(test)]
pub(crate) mod test_models;

// Re-exports for convenience
pub use dormand_prince::DormandPrinceSolver;
pub use euler::EulerSolver;
pub use rk4::RK4Solver;
