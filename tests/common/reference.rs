//! Noise-free closed loop written out step by step
//!
//! Shares only the plant model and the integrator with the crate. Gain
//! offsets, the incremental PID law, clamping, cold start and both delay
//! lines are spelled out here, so a bookkeeping change in the simulator
//! shows up as a trajectory mismatch.

use std::collections::VecDeque;

use cstr_rs::control::PidGains;
use cstr_rs::models::CstrModel;
use cstr_rs::physics::{ControlAction, ReactorState};
use cstr_rs::solver::{RK4Solver, Solver};

const EPSILON: f64 = 1e-8;

pub struct ReferenceLoop {
    gains: PidGains,
    solver: RK4Solver,
    model: CstrModel,
    dt: f64,
    setpoint_cb: f64,
    setpoint_v: f64,
    state: ReactorState,
    /// (e_{t-2}, e_{t-1}) for each loop, as `[cb, v]`
    errors: VecDeque<[f64; 2]>,
    last_control: ControlAction,
    actuator: VecDeque<ControlAction>,
    measurement: VecDeque<ReactorState>,
    step: usize,
}

impl ReferenceLoop {
    /// Nominal parameters, `x0 = (0.8, 0, 0, 325, 100)`, `u0 = (300, 100)`
    pub fn new(gains: PidGains, substeps: usize, actuator_delay: usize, transport_delay: usize) -> Self {
        let state = ReactorState::new(0.8, 0.0, 0.0, 325.0, 100.0);
        let control = ControlAction::new(300.0, 100.0);
        let (setpoint_cb, setpoint_v) = (0.70, 100.0);
        let initial_error = [setpoint_cb - state.cb(), setpoint_v - state.volume()];

        Self {
            gains,
            solver: RK4Solver::with_substeps(substeps),
            model: CstrModel::nominal(),
            dt: 1.0,
            setpoint_cb,
            setpoint_v,
            state,
            errors: VecDeque::from(vec![initial_error, initial_error]),
            last_control: control,
            actuator: VecDeque::from(vec![control; actuator_delay.max(1)]),
            measurement: VecDeque::from(vec![state; transport_delay.max(1)]),
            step: 0,
        }
    }

    fn delta(kp: f64, ki: f64, kd: f64, e: f64, e1: f64, e2: f64, dt: f64) -> f64 {
        let ki = ki + EPSILON;
        let kd = kd + EPSILON;
        kp * (e - e1) + (kp / ki) * e * dt - kp * kd * (e - 2.0 * e1 + e2) / dt
    }

    /// One closed-loop interval; returns the true state afterwards
    pub fn step(&mut self) -> ReactorState {
        let measured = self.measurement[0];
        let e = [
            self.setpoint_cb - measured.cb(),
            self.setpoint_v - measured.volume(),
        ];

        let control = if self.step < 2 {
            self.last_control
        } else {
            let e1 = self.errors[1];
            let e2 = self.errors[0];
            let (cb, v) = (&self.gains.cb, &self.gains.v);
            let tc = self.last_control.tc() + Self::delta(cb.kp, cb.ki, cb.kd, e[0], e1[0], e2[0], self.dt);
            let fin = self.last_control.fin() + Self::delta(v.kp, v.ki, v.kd, e[1], e1[1], e2[1], self.dt);
            ControlAction::new(tc.clamp(290.0, 450.0), fin.clamp(95.0, 105.0))
        };

        self.actuator.push_back(control);
        let applied = self.actuator.pop_front().unwrap_or(control);

        self.last_control = control;
        self.errors.push_back(e);
        self.errors.pop_front();

        self.state = self
            .solver
            .integrate(&self.model, &self.state, &applied, self.dt)
            .expect("reference integration failed");

        self.measurement.push_back(self.state);
        self.measurement.pop_front();

        self.step += 1;
        self.state
    }
}

/// Cb after each of `steps` intervals, both delays of one step
pub fn reference_cb_trajectory(gains: PidGains, substeps: usize, steps: usize) -> Vec<f64> {
    let mut reference = ReferenceLoop::new(gains, substeps, 1, 1);
    (0..steps).map(|_| reference.step().cb()).collect()
}
