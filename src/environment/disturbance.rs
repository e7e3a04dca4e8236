//! Randomized process disturbances
//!
//! Once the step counter reaches the scheduled disturbance step, one of
//! three upsets is drawn uniformly:
//!
//! | kind                | effect                                   |
//! |---------------------|------------------------------------------|
//! | feed temperature    | `Tf  *= 1 + 0.1·(u − 0.5)`               |
//! | feed concentration  | `Caf *= 1 + 0.1·(u − 0.5)`               |
//! | cooling upset       | `UA  *= 0.8`, restored 3 steps later     |
//!
//! Feed changes are permanent for the rest of the episode. The cooling
//! upset stores the heat-transfer coefficient it replaced and puts it back
//! exactly at the scheduled step.
//!
//! # Re-arming
//!
//! [`RearmPolicy::Interval`] schedules the next disturbance `interval`
//! steps after the one that just fired. [`RearmPolicy::Cumulative`]
//! reproduces the legacy rule `next += step + interval`, whose gap grows
//! with every disturbance.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::ProcessParameters;

/// Relative jitter span of the feed disturbances (±5 %)
pub const FEED_JITTER: f64 = 0.1;

/// Factor applied to `UA` during a cooling upset
pub const COOLING_UPSET_FACTOR: f64 = 0.8;

/// Steps until a cooling upset is reverted
pub const COOLING_FIX_DELAY: usize = 3;

// =================================================================================================
// Disturbance kinds
// =================================================================================================

/// Kind of process upset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disturbance {
    FeedTemperature,
    FeedConcentration,
    CoolingUpset,
}

impl Disturbance {
    pub const ALL: [Disturbance; 3] = [
        Disturbance::FeedTemperature,
        Disturbance::FeedConcentration,
        Disturbance::CoolingUpset,
    ];

    /// Human-readable label, as reported in step diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            Disturbance::FeedTemperature => "Feed temperature disturbance",
            Disturbance::FeedConcentration => "Feed concentration disturbance",
            Disturbance::CoolingUpset => "Cooling system upset",
        }
    }
}

impl fmt::Display for Disturbance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rule for scheduling the next disturbance after one fires at `step`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RearmPolicy {
    /// `next = step + interval`
    #[default]
    Interval,
    /// `next += step + interval`
    Cumulative,
}

impl RearmPolicy {
    pub fn next_step(&self, previous_next: usize, step: usize, interval: usize) -> usize {
        match self {
            RearmPolicy::Interval => step + interval,
            RearmPolicy::Cumulative => previous_next + step + interval,
        }
    }
}

/// A cooling upset waiting to be reverted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingFix {
    /// Step at which `UA` is restored
    pub step: usize,
    /// `UA` before the upset
    pub restore_ua: f64,
}

// =================================================================================================
// Generator
// =================================================================================================

/// Disturbance scheduler for one episode
///
/// # Example
///
/// ```rust
/// use cstr_rs::environment::{Disturbance, DisturbanceGenerator, RearmPolicy};
/// use cstr_rs::models::ProcessParameters;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut generator = DisturbanceGenerator::new(20, RearmPolicy::Interval);
/// let mut params = ProcessParameters::nominal();
/// let mut rng = ChaCha8Rng::seed_from_u64(0);
///
/// generator.force(Disturbance::CoolingUpset, 5, &mut params, &mut rng);
/// assert_eq!(params.ua, 5e4 * 0.8);
///
/// for step in 6..8 {
///     assert!(generator.apply_pending_fix(step, &mut params).is_none());
/// }
/// assert_eq!(generator.apply_pending_fix(8, &mut params), Some(5e4));
/// assert_eq!(params.ua, 5e4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DisturbanceGenerator {
    interval: usize,
    policy: RearmPolicy,
    next_step: usize,
    pending_fix: Option<PendingFix>,
}

impl DisturbanceGenerator {
    /// First disturbance is scheduled at step `interval`
    pub fn new(interval: usize, policy: RearmPolicy) -> Self {
        Self {
            interval,
            policy,
            next_step: interval,
            pending_fix: None,
        }
    }

    /// Restore the start-of-episode schedule
    pub fn reset(&mut self) {
        self.next_step = self.interval;
        self.pending_fix = None;
    }

    pub fn next_step(&self) -> usize {
        self.next_step
    }

    pub fn pending_fix(&self) -> Option<PendingFix> {
        self.pending_fix
    }

    pub fn policy(&self) -> RearmPolicy {
        self.policy
    }

    /// Fire a random disturbance if `step` has reached the schedule
    ///
    /// Draws the kind (`0..3`), then one jitter uniform for feed changes.
    /// Nothing is drawn when no disturbance is due.
    pub fn maybe_disturb<R: Rng + ?Sized>(
        &mut self,
        step: usize,
        params: &mut ProcessParameters,
        rng: &mut R,
    ) -> Option<Disturbance> {
        if step < self.next_step {
            return None;
        }

        let kind = Disturbance::ALL[rng.gen_range(0..Disturbance::ALL.len())];
        self.apply(kind, step, params, rng);
        self.next_step = self.policy.next_step(self.next_step, step, self.interval);

        Some(kind)
    }

    /// Advance the schedule as if a disturbance had fired at `step`
    ///
    /// Returns `false`, leaving the schedule alone, when none is due yet.
    /// No random numbers are drawn.
    pub fn rearm_if_due(&mut self, step: usize) -> bool {
        if step < self.next_step {
            return false;
        }
        self.next_step = self.policy.next_step(self.next_step, step, self.interval);
        true
    }

    /// Apply a given disturbance at `step` without touching the schedule
    pub fn force<R: Rng + ?Sized>(
        &mut self,
        kind: Disturbance,
        step: usize,
        params: &mut ProcessParameters,
        rng: &mut R,
    ) -> Disturbance {
        self.apply(kind, step, params, rng);
        kind
    }

    fn apply<R: Rng + ?Sized>(
        &mut self,
        kind: Disturbance,
        step: usize,
        params: &mut ProcessParameters,
        rng: &mut R,
    ) {
        match kind {
            Disturbance::FeedTemperature => {
                let before = params.tf;
                params.tf *= 1.0 + FEED_JITTER * (rng.gen::<f64>() - 0.5);
                info!(step, before, after = params.tf, "{}", kind);
            }
            Disturbance::FeedConcentration => {
                let before = params.caf;
                params.caf *= 1.0 + FEED_JITTER * (rng.gen::<f64>() - 0.5);
                info!(step, before, after = params.caf, "{}", kind);
            }
            Disturbance::CoolingUpset => {
                // A second upset keeps the original value to restore
                let restore_ua = match self.pending_fix {
                    Some(pending) => pending.restore_ua,
                    None => params.ua,
                };
                params.ua *= COOLING_UPSET_FACTOR;
                self.pending_fix = Some(PendingFix {
                    step: step + COOLING_FIX_DELAY,
                    restore_ua,
                });
                warn!(step, ua = params.ua, fix_at = step + COOLING_FIX_DELAY, "{}", kind);
            }
        }
    }

    /// Revert a pending cooling upset scheduled for `step`
    ///
    /// Returns the restored `UA` when a fix was applied.
    pub fn apply_pending_fix(&mut self, step: usize, params: &mut ProcessParameters) -> Option<f64> {
        match self.pending_fix {
            Some(pending) if pending.step == step => {
                params.ua = pending.restore_ua;
                self.pending_fix = None;
                info!(step, ua = params.ua, "Cooling system restored");
                Some(pending.restore_ua)
            }
            _ => None,
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================
