//! Fixed-window histories for the velocity-form controller
//!
//! The derivative term needs `e_t`, `e_{t-1}` and `e_{t-2}`, so the error
//! history can never hold fewer than two entries. [`RollingHistory`] is
//! seeded full at construction and drops its oldest entry on every push,
//! which keeps its length constant for the whole episode.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Error vector `(setpoint − measurement)` of both loops
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackingError {
    pub cb: f64,
    pub v: f64,
}

impl TrackingError {
    pub fn new(cb: f64, v: f64) -> Self {
        Self { cb, v }
    }

    /// Sum of squared components
    pub fn squared_norm(&self) -> f64 {
        self.cb * self.cb + self.v * self.v
    }
}

/// Sliding window of the most recent values, oldest first
///
/// # Example
///
/// ```rust
/// use cstr_rs::control::RollingHistory;
///
/// let mut history = RollingHistory::new(2, 0);
/// history.push(1);
/// history.push(2);
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.latest(), 2);
/// assert_eq!(history.previous(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RollingHistory<T> {
    window: VecDeque<T>,
}

impl<T: Copy> RollingHistory<T> {
    /// Minimum window length
    pub const MIN_CAPACITY: usize = 2;

    /// Window of `capacity` copies of `initial`; capacity is raised to 2
    pub fn new(capacity: usize, initial: T) -> Self {
        let capacity = capacity.max(Self::MIN_CAPACITY);
        Self {
            window: std::iter::repeat(initial).take(capacity).collect(),
        }
    }

    /// Append `value` and drop the oldest entry
    pub fn push(&mut self, value: T) {
        self.window.pop_front();
        self.window.push_back(value);
    }

    /// Most recent entry (`x_{t-1}` from the controller's point of view)
    pub fn latest(&self) -> T {
        self.back(0)
    }

    /// Entry before the most recent one (`x_{t-2}`)
    pub fn previous(&self) -> T {
        self.back(1)
    }

    /// Entry `n` positions before the most recent one
    ///
    /// Indices past the window return the oldest entry.
    pub fn back(&self, n: usize) -> T {
        let index = self.window.len().saturating_sub(n + 1);
        self.window[index]
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.window.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_at_least_two() {
        let history = RollingHistory::new(0, 1.0);
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest(), 1.0);
        assert_eq!(history.previous(), 1.0);
    }

    #[test]
    fn test_push_keeps_length_constant() {
        let mut history = RollingHistory::new(3, 0);
        for i in 1..=10 {
            history.push(i);
            assert_eq!(history.len(), 3);
        }
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![8, 9, 10]);
    }

    #[test]
    fn test_back_saturates_on_oldest() {
        let mut history = RollingHistory::new(2, 0);
        history.push(5);
        assert_eq!(history.back(0), 5);
        assert_eq!(history.back(1), 0);
        assert_eq!(history.back(10), 0);
    }

    #[test]
    fn test_tracking_error_norm() {
        let error = TrackingError::new(0.3, -4.0);
        assert!((error.squared_norm() - 16.09).abs() < 1e-12);
    }
}
