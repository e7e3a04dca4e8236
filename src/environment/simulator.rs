//! Closed-loop simulator
//!
//! # State machine
//!
//! ```text
//!            reset                 step (k < horizon − 1)
//!   ─────────────────▶ Running ◀──────────────┐
//!                        │  └─────────────────┘
//!                        │ step (k = horizon − 1) or fatal error
//!                        ▼
//!                       Done ── step ──▶ EpisodeFinished
//!                        │
//!                        └── reset ──▶ Running
//! ```
//!
//! # One step
//!
//! ```text
//! action ─▶ gains ─▶ PID(delayed noisy error) ─▶ actuator buffer ─▶ plant ─▶ noise ─▶ transport buffer ─▶ observation
//! ```
//!
//! All randomness comes from one owned `ChaCha8Rng`. With a fixed seed and
//! action sequence, two simulators produce bit-identical episodes.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::control::{PidGains, RollingHistory, TrackingError, VelocityPid};
use crate::environment::{
    DelayBuffer, Disturbance, DisturbanceGenerator, EnvironmentConfig, EpisodeLog,
    MeasurementNoise, Observation, ObservationBounds, TimeSeriesRecord,
};
use crate::error::{CstrResult, SimulationError};
use crate::models::{CstrModel, ProcessParameters};
use crate::output::Renderer;
use crate::physics::{ControlAction, ReactorState};
use crate::solver::{validate_state, Solver, SolverConfiguration};

// =================================================================================================
// Step/reset contract
// =================================================================================================

/// Capabilities of an interactive episode
pub trait Environment {
    /// Start a new episode; `Some(seed)` reseeds the random source
    fn reset(&mut self, seed: Option<u64>) -> (Observation, ResetInfo);

    /// Advance by one control interval
    fn step(&mut self, action: &[f64]) -> CstrResult<StepResult>;

    /// Hand the episode log to the attached renderer, if any
    fn render(&mut self) -> CstrResult<()>;

    /// Release rendering resources; safe to call repeatedly
    fn close(&mut self);
}

/// Information returned by `reset`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResetInfo {
    /// Seed passed to `reset`, if any
    pub seed: Option<u64>,
    /// "True" parameters sampled for this episode
    pub parameters: ProcessParameters,
}

/// Diagnostics of one step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Gains obtained from the action
    pub pid_gains: PidGains,
    /// Control computed this step (enters the actuator buffer)
    pub control_action: ControlAction,
    /// Control that reached the plant this step
    pub applied_control: ControlAction,
    /// Plant state after integration
    pub true_state: ReactorState,
    /// Disturbance fired this step
    pub disturbance: Option<Disturbance>,
}

/// Result of one step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    /// Negative squared tracking error of the true state, always ≤ 0
    pub reward: f64,
    /// Horizon reached
    pub done: bool,
    /// Never set: episodes only end at the horizon
    pub truncated: bool,
    pub info: StepInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Done,
}

// =================================================================================================
// Simulator
// =================================================================================================

/// CSTR under velocity-form PID control with uncertainty, noise, delays and disturbances
///
/// # Example
///
/// ```rust
/// use cstr_rs::environment::{ClosedLoopSimulator, Environment, EnvironmentConfig};
///
/// let config = EnvironmentConfig {
///     simulation_steps: 5,
///     ..EnvironmentConfig::default()
/// };
/// let mut env = ClosedLoopSimulator::with_seed(config, 7).unwrap();
///
/// let (observation, _) = env.reset(Some(7));
/// assert_eq!(observation.setpoint_cb(), 0.70);
///
/// for k in 0..5 {
///     let result = env.step(&[0.0; 6]).unwrap();
///     assert!(result.reward <= 0.0);
///     assert_eq!(result.done, k == 4);
/// }
/// assert!(env.step(&[0.0; 6]).is_err());
/// ```
pub struct ClosedLoopSimulator {
    config: EnvironmentConfig,
    solver: Box<dyn Solver>,
    pid: VelocityPid,
    noise: MeasurementNoise,
    disturbances: DisturbanceGenerator,
    rng: ChaCha8Rng,

    // ====== Episode state ======
    parameters: ProcessParameters,
    true_state: ReactorState,
    measured_state: ReactorState,
    errors: RollingHistory<TrackingError>,
    controls: RollingHistory<ControlAction>,
    control_buffer: DelayBuffer<ControlAction>,
    measurement_buffer: DelayBuffer<ReactorState>,
    step_count: usize,
    phase: Phase,
    forced_disturbance: Option<Disturbance>,

    log: EpisodeLog,
    renderer: Option<Box<dyn Renderer>>,
}

impl ClosedLoopSimulator {
    /// Build a simulator seeded from system entropy
    pub fn new(config: EnvironmentConfig) -> CstrResult<Self> {
        Self::build(config, ChaCha8Rng::from_entropy())
    }

    /// Build a simulator whose first episode uses `seed`
    pub fn with_seed(config: EnvironmentConfig, seed: u64) -> CstrResult<Self> {
        Self::build(config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn build(config: EnvironmentConfig, rng: ChaCha8Rng) -> CstrResult<Self> {
        config.validate()?;
        let solver = SolverConfiguration::new(config.solver.clone()).build()?;

        let initial = config.initial_state();
        let default_control = config.default_control();

        let mut simulator = Self {
            solver,
            pid: VelocityPid::new(config.control_limits),
            noise: MeasurementNoise::new(config.noise_level),
            disturbances: DisturbanceGenerator::new(
                config.disturbance_interval,
                config.disturbance_rearm,
            ),
            rng,
            parameters: ProcessParameters::nominal(),
            true_state: initial,
            measured_state: initial,
            errors: RollingHistory::new(2, TrackingError::default()),
            controls: RollingHistory::new(2, default_control),
            control_buffer: DelayBuffer::new(config.actuator_delay(), default_control),
            measurement_buffer: DelayBuffer::new(config.transport_delay(), initial),
            step_count: 0,
            phase: Phase::Running,
            forced_disturbance: None,
            log: EpisodeLog::with_capacity(config.simulation_steps + 1),
            renderer: None,
            config,
        };

        simulator.start_episode(None);
        Ok(simulator)
    }

    // ====== Accessors ======

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    pub fn observation_bounds(&self) -> ObservationBounds {
        ObservationBounds::default()
    }

    pub fn true_state(&self) -> &ReactorState {
        &self.true_state
    }

    /// Measurement that left the transport buffer last
    pub fn measured_state(&self) -> &ReactorState {
        &self.measured_state
    }

    /// Current "true" parameters, including disturbances
    pub fn process_parameters(&self) -> &ProcessParameters {
        &self.parameters
    }

    /// Steps taken in the current episode
    pub fn current_step(&self) -> usize {
        self.step_count
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn errors(&self) -> &RollingHistory<TrackingError> {
        &self.errors
    }

    pub fn controls(&self) -> &RollingHistory<ControlAction> {
        &self.controls
    }

    pub fn control_buffer(&self) -> &DelayBuffer<ControlAction> {
        &self.control_buffer
    }

    pub fn measurement_buffer(&self) -> &DelayBuffer<ReactorState> {
        &self.measurement_buffer
    }

    pub fn disturbance_schedule(&self) -> &DisturbanceGenerator {
        &self.disturbances
    }

    pub fn log(&self) -> &EpisodeLog {
        &self.log
    }

    // ====== Collaborators ======

    /// Attach a renderer used by [`Environment::render`]
    pub fn attach_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = Some(renderer);
    }

    /// Fire `kind` during the next step, whether disturbances are enabled or not
    ///
    /// No kind is drawn. With disturbances enabled, a forced disturbance that
    /// lands on a scheduled step takes that slot: the schedule re-arms from
    /// it and no second disturbance fires. On any other step the schedule is
    /// left untouched.
    pub fn force_disturbance(&mut self, kind: Disturbance) {
        self.forced_disturbance = Some(kind);
    }

    // ====== Internals ======

    fn start_episode(&mut self, seed: Option<u64>) -> (Observation, ResetInfo) {
        if let Some(seed) = seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }

        // Five uniforms, then five normals
        self.parameters =
            ProcessParameters::sample_uncertain(self.config.uncertainty_level, &mut self.rng);
        self.true_state = self.config.initial_state();
        let measured = self.noise.perturb(&self.true_state, &mut self.rng);

        let default_control = self.config.default_control();
        self.controls = RollingHistory::new(2, default_control);
        self.control_buffer = DelayBuffer::new(self.config.actuator_delay(), default_control);
        self.measurement_buffer = DelayBuffer::new(self.config.transport_delay(), measured);
        self.measured_state = measured;

        let initial_error = self.tracking_error(&measured);
        self.errors = RollingHistory::new(2, initial_error);

        self.disturbances.reset();
        self.forced_disturbance = None;
        self.step_count = 0;
        self.phase = Phase::Running;

        self.log.clear();
        self.log.push(TimeSeriesRecord {
            time: 0.0,
            state: self.true_state,
            control: default_control,
            setpoint_cb: self.config.setpoint_cb,
            setpoint_v: self.config.setpoint_v,
            disturbance: None,
        });

        info!(
            seed = ?seed,
            tf = self.parameters.tf,
            caf = self.parameters.caf,
            ua = self.parameters.ua,
            k0_ab = self.parameters.k0_ab,
            k0_bc = self.parameters.k0_bc,
            "Episode reset"
        );

        let observation = Observation::new(
            &measured,
            &measured,
            self.config.setpoint_cb,
            self.config.setpoint_v,
        );
        let info = ResetInfo {
            seed,
            parameters: self.parameters,
        };
        (observation, info)
    }

    fn tracking_error(&self, state: &ReactorState) -> TrackingError {
        TrackingError::new(
            self.config.setpoint_cb - state.cb(),
            self.config.setpoint_v - state.volume(),
        )
    }

    fn run_disturbances(&mut self, step: usize) -> Option<Disturbance> {
        let fired = match self.forced_disturbance.take() {
            Some(kind) => {
                let kind = self
                    .disturbances
                    .force(kind, step, &mut self.parameters, &mut self.rng);
                if self.config.enable_disturbances && self.disturbances.rearm_if_due(step) {
                    debug!(
                        step,
                        next = self.disturbances.next_step(),
                        "Forced disturbance took the scheduled slot"
                    );
                }
                Some(kind)
            }
            None if self.config.enable_disturbances => {
                self.disturbances
                    .maybe_disturb(step, &mut self.parameters, &mut self.rng)
            }
            None => None,
        };

        self.disturbances
            .apply_pending_fix(step, &mut self.parameters);

        fired
    }

    fn advance_plant(&self, control: &ControlAction, step: usize) -> CstrResult<ReactorState> {
        let model = CstrModel::with_parameters(self.parameters);
        let next = self
            .solver
            .integrate(&model, &self.true_state, control, self.config.dt)
            .map_err(|e| e.at_step(step))?;
        validate_state(&next, step)?;
        Ok(next)
    }
}

impl Environment for ClosedLoopSimulator {
    fn reset(&mut self, seed: Option<u64>) -> (Observation, ResetInfo) {
        self.start_episode(seed)
    }

    fn step(&mut self, action: &[f64]) -> CstrResult<StepResult> {
        if self.phase == Phase::Done {
            return Err(SimulationError::EpisodeFinished {
                horizon: self.config.simulation_steps,
            });
        }

        let step = self.step_count;
        let dt = self.config.dt;

        // ====== Step 1: Action → gains (rejects malformed actions) ======
        let pid_gains = self.config.gain_scaling.scale(action)?;

        // ====== Step 2-3: Delayed, noisy measurement and error ======
        let measured = self.measurement_buffer.oldest();
        let error = self.tracking_error(&measured);

        // ====== Step 4: Control (cold start for the first two steps) ======
        let control_action = if step < 2 {
            self.controls.latest()
        } else {
            self.pid
                .update(&pid_gains, error, &self.errors, &self.controls, dt)
        };

        // ====== Step 5: Actuator delay ======
        let applied_control = self.control_buffer.push_pop(control_action);

        // ====== Step 6: Histories ======
        self.controls.push(control_action);
        self.errors.push(error);

        // ====== Step 7: Disturbances and pending cooling fix ======
        let disturbance = self.run_disturbances(step);

        // ====== Step 8: Plant integration ======
        let true_state = match self.advance_plant(&applied_control, step) {
            Ok(state) => state,
            Err(failure) => {
                error!(step, %failure, "Closed-loop step failed");
                self.phase = Phase::Done;
                return Err(failure);
            }
        };
        self.true_state = true_state;

        // ====== Step 9: Noise and transport delay ======
        let noisy = self.noise.perturb(&true_state, &mut self.rng);
        let previous_measured = self.measured_state;
        self.measured_state = self.measurement_buffer.push_pop(noisy);

        // ====== Step 10: Reward on the true state ======
        let reward = -self.tracking_error(&true_state).squared_norm();

        // ====== Step 11: Observation ======
        let observation = Observation::new(
            &self.measured_state,
            &previous_measured,
            self.config.setpoint_cb,
            self.config.setpoint_v,
        );

        // ====== Step 12: Log ======
        self.log.push(TimeSeriesRecord {
            time: (step + 1) as f64 * dt,
            state: true_state,
            control: applied_control,
            setpoint_cb: self.config.setpoint_cb,
            setpoint_v: self.config.setpoint_v,
            disturbance,
        });

        // ====== Step 13: Counter and termination ======
        self.step_count += 1;
        let done = self.step_count >= self.config.simulation_steps;
        if done {
            self.phase = Phase::Done;
        }

        debug!(step, reward, cb = true_state.cb(), v = true_state.volume(), "Step");

        Ok(StepResult {
            observation,
            reward,
            done,
            truncated: false,
            info: StepInfo {
                pid_gains,
                control_action,
                applied_control,
                true_state,
                disturbance,
            },
        })
    }

    fn render(&mut self) -> CstrResult<()> {
        match self.renderer.as_mut() {
            Some(renderer) => renderer.render(&self.log),
            None => Ok(()),
        }
    }

    fn close(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.close();
        }
    }
}

impl std::fmt::Debug for ClosedLoopSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosedLoopSimulator")
            .field("solver", &self.solver.name())
            .field("step", &self.step_count)
            .field("phase", &self.phase)
            .field("true_state", &self.true_state)
            .field("parameters", &self.parameters)
            .finish()
    }
}

// =================================================================================================
// Tests
// =================================================================================================
