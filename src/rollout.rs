//! Batch evaluation of seeded episodes
//!
//! A [`Policy`] maps observations to normalized gain actions. Each episode
//! gets its own [`ClosedLoopSimulator`] and RNG, so episodes are
//! independent and can be evaluated in any order. With the `parallel`
//! feature, [`run_batch`] spreads them over the rayon thread pool; results
//! come back in seed order either way.
//!
//! # Example
//!
//! ```rust,no_run
//! use cstr_rs::environment::EnvironmentConfig;
//! use cstr_rs::rollout::{run_batch, BatchReport, ConstantPolicy};
//!
//! let config = EnvironmentConfig::default();
//! let results = run_batch(&config, &[1, 2, 3, 4], |_| ConstantPolicy::new([0.0; 6]));
//! let report = BatchReport::from_results(&results);
//! println!("{} episodes, mean reward {:?}", report.completed, report.mean_reward);
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::control::{GainScaling, PidGains, ACTION_DIM};
use crate::environment::{ClosedLoopSimulator, Disturbance, Environment, EnvironmentConfig, Observation};
use crate::error::CstrResult;
use crate::physics::ReactorState;

// =================================================================================================
// Policies
// =================================================================================================

/// Agent choosing the normalized gain action from an observation
pub trait Policy {
    fn act(&mut self, observation: &Observation) -> [f64; ACTION_DIM];
}

/// Closures are policies
impl<F> Policy for F
where
    F: FnMut(&Observation) -> [f64; ACTION_DIM],
{
    fn act(&mut self, observation: &Observation) -> [f64; ACTION_DIM] {
        self(observation)
    }
}

/// Same action at every step, i.e. a fixed PID tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantPolicy {
    action: [f64; ACTION_DIM],
}

impl ConstantPolicy {
    pub fn new(action: [f64; ACTION_DIM]) -> Self {
        Self { action }
    }

    /// Policy that always requests `gains` under `scaling`
    ///
    /// # Example
    ///
    /// ```rust
    /// use cstr_rs::control::{GainScaling, LoopGains, PidGains};
    /// use cstr_rs::rollout::ConstantPolicy;
    ///
    /// let gains = PidGains {
    ///     cb: LoopGains { kp: 10.0, ki: 5.0, kd: 0.1 },
    ///     v: LoopGains { kp: 0.5, ki: 0.5, kd: 0.1 },
    /// };
    /// let policy = ConstantPolicy::from_gains(&GainScaling::default(), &gains);
    /// let scaled = GainScaling::default().scale(policy.action()).unwrap();
    /// assert!((scaled.cb.kp - 10.0).abs() < 1e-9);
    /// ```
    pub fn from_gains(scaling: &GainScaling, gains: &PidGains) -> Self {
        Self::new(scaling.normalize(gains))
    }

    pub fn action(&self) -> &[f64; ACTION_DIM] {
        &self.action
    }
}

impl Policy for ConstantPolicy {
    fn act(&mut self, _observation: &Observation) -> [f64; ACTION_DIM] {
        self.action
    }
}

// =================================================================================================
// Episode Summary
// =================================================================================================

/// Outcome of one complete episode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub seed: u64,
    /// Steps taken (the horizon, unless the episode failed)
    pub steps: usize,
    /// Sum of the per-step rewards
    pub total_reward: f64,
    /// True plant state after the last step
    pub final_state: ReactorState,
    /// `(step index, kind)` of every disturbance, indices counted from 0
    pub disturbances: Vec<(usize, Disturbance)>,
}

impl EpisodeSummary {
    pub fn mean_reward(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            self.total_reward / self.steps as f64
        }
    }
}

/// Aggregate over a batch; failed episodes are counted, not averaged
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub completed: usize,
    pub failed: usize,
    /// Mean total reward of the completed episodes
    pub mean_reward: Option<f64>,
    /// Seed of the completed episode with the highest total reward
    pub best_seed: Option<u64>,
}

impl BatchReport {
    pub fn from_results(results: &[CstrResult<EpisodeSummary>]) -> Self {
        let completed: Vec<&EpisodeSummary> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        let failed = results.len() - completed.len();

        let mean_reward = if completed.is_empty() {
            None
        } else {
            Some(completed.iter().map(|s| s.total_reward).sum::<f64>() / completed.len() as f64)
        };

        let best_seed = completed
            .iter()
            .max_by(|a, b| a.total_reward.total_cmp(&b.total_reward))
            .map(|s| s.seed);

        Self {
            completed: completed.len(),
            failed,
            mean_reward,
            best_seed,
        }
    }
}

// =================================================================================================
// Runners
// =================================================================================================

/// Run one full episode from `reset(Some(seed))` to the horizon
///
/// # Errors
///
/// Propagates configuration errors and the first fatal numerical error
/// of the episode.
pub fn run_episode<P: Policy + ?Sized>(
    config: &EnvironmentConfig,
    seed: u64,
    policy: &mut P,
) -> CstrResult<EpisodeSummary> {
    let mut env = ClosedLoopSimulator::with_seed(config.clone(), seed)?;
    let (mut observation, _) = env.reset(Some(seed));

    let mut summary = EpisodeSummary {
        seed,
        steps: 0,
        total_reward: 0.0,
        final_state: *env.true_state(),
        disturbances: Vec::new(),
    };

    loop {
        let action = policy.act(&observation);
        let result = env.step(&action)?;

        if let Some(kind) = result.info.disturbance {
            summary.disturbances.push((summary.steps, kind));
        }
        summary.steps += 1;
        summary.total_reward += result.reward;
        summary.final_state = result.info.true_state;

        observation = result.observation;
        if result.done || result.truncated {
            break;
        }
    }

    info!(
        seed,
        steps = summary.steps,
        total_reward = summary.total_reward,
        "Episode finished"
    );
    Ok(summary)
}

/// Run one episode per seed
///
/// `policy_factory` builds a fresh policy for each seed. The result at
/// index `i` belongs to `seeds[i]`.
pub fn run_batch<F, P>(
    config: &EnvironmentConfig,
    seeds: &[u64],
    policy_factory: F,
) -> Vec<CstrResult<EpisodeSummary>>
where
    F: Fn(u64) -> P + Sync,
    P: Policy,
{
    debug!(episodes = seeds.len(), parallel = cfg!(feature = "parallel"), "Starting batch");

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        seeds
            .par_iter()
            .map(|&seed| {
                let mut policy = policy_factory(seed);
                run_episode(config, seed, &mut policy)
            })
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        seeds
            .iter()
            .map(|&seed| {
                let mut policy = policy_factory(seed);
                run_episode(config, seed, &mut policy)
            })
            .collect()
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SolverType;

    fn short_config() -> EnvironmentConfig {
        EnvironmentConfig {
            simulation_steps: 25,
            solver: SolverType::RungeKutta4 { substeps: 50 },
            ..EnvironmentConfig::default()
        }
    }

    #[test]
    fn test_constant_policy_runs_full_horizon() {
        let mut policy = ConstantPolicy::new([0.0; ACTION_DIM]);
        let summary = run_episode(&short_config(), 5, &mut policy).unwrap();

        assert_eq!(summary.seed, 5);
        assert_eq!(summary.steps, 25);
        assert!(summary.total_reward <= 0.0);
        assert!(summary.mean_reward() <= 0.0);
        assert!(summary.final_state.volume() > 0.0);
    }

    #[test]
    fn test_disturbances_recorded_with_step() {
        let config = EnvironmentConfig {
            disturbance_interval: 5,
            ..short_config()
        };
        let summary = run_episode(&config, 9, &mut ConstantPolicy::new([0.0; ACTION_DIM])).unwrap();

        let steps: Vec<usize> = summary.disturbances.iter().map(|(step, _)| *step).collect();
        assert_eq!(steps, vec![5, 10, 15, 20]);
    }

    #[test]
    fn test_closure_policy() {
        let mut calls = 0;
        let mut policy = |observation: &Observation| {
            calls += 1;
            assert_eq!(observation.setpoint_cb(), 0.70);
            [0.5, 0.0, 0.0, 0.0, 0.0, 0.0]
        };
        let summary = run_episode(&short_config(), 1, &mut policy).unwrap();

        assert_eq!(summary.steps, 25);
        assert_eq!(calls, 25);
    }

    #[test]
    fn test_invalid_action_propagates() {
        let result = run_episode(&short_config(), 1, &mut ConstantPolicy::new([2.0; ACTION_DIM]));
        assert!(matches!(result, Err(crate::SimulationError::Configuration(_))));
    }

    #[test]
    fn test_batch_matches_individual_runs_in_seed_order() {
        let config = short_config();
        let seeds = [3, 1, 4, 1, 5];
        let results = run_batch(&config, &seeds, |_| ConstantPolicy::new([0.0; ACTION_DIM]));

        assert_eq!(results.len(), seeds.len());
        for (result, &seed) in results.iter().zip(seeds.iter()) {
            let batch = result.as_ref().unwrap();
            let single = run_episode(&config, seed, &mut ConstantPolicy::new([0.0; ACTION_DIM])).unwrap();
            assert_eq!(batch, &single);
        }
    }

    #[test]
    fn test_batch_report() {
        let results = run_batch(&short_config(), &[10, 11], |_| ConstantPolicy::new([0.0; ACTION_DIM]));
        let report = BatchReport::from_results(&results);

        assert_eq!(report.completed, 2);
        assert_eq!(report.failed, 0);
        assert!(report.mean_reward.unwrap() <= 0.0);
        assert!(matches!(report.best_seed, Some(10) | Some(11)));
    }
}
