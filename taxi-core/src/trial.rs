//! A single trial: one start state stepped until it ends.
use crate::{
    record::{Record, RecordValue},
    util::StopFlag,
    Env, Solver, Transition,
};
use anyhow::Result;
use log::trace;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a [`Trial`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    /// Built, no step taken yet.
    Created,
    /// At least one step taken, not finished.
    Running,
    /// Reached a terminal state.
    Terminated,
    /// Ran out of its step budget.
    StepCapped,
    /// Stopped through a [`StopFlag`].
    Cancelled,
}

impl TrialStatus {
    /// Returns `true` for the three final statuses.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            TrialStatus::Terminated | TrialStatus::StepCapped | TrialStatus::Cancelled
        )
    }
}

impl fmt::Display for TrialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrialStatus::Created => "created",
            TrialStatus::Running => "running",
            TrialStatus::Terminated => "terminated",
            TrialStatus::StepCapped => "step_capped",
            TrialStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Summary of a finished trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome<O> {
    /// Start state.
    pub start: O,

    /// Final status.
    pub status: TrialStatus,

    /// Number of steps taken.
    pub steps: usize,

    /// Sum of rewards.
    pub reward: f64,
}

impl<O> TrialOutcome<O> {
    /// Converts the outcome into a [`Record`].
    pub fn to_record(&self) -> Record {
        Record::from_slice(&[
            ("trial_steps", RecordValue::Scalar(self.steps as f32)),
            ("trial_reward", RecordValue::Scalar(self.reward as f32)),
            ("trial_status", RecordValue::String(self.status.to_string())),
        ])
    }
}

/// Drives a solver from one start state until the state is terminal, the step
/// budget is spent or the trial is cancelled.
pub struct Trial<'a, E: Env> {
    env: &'a E,
    start: E::Obs,
    obs: E::Obs,
    max_steps: usize,
    steps: usize,
    reward: f64,
    status: TrialStatus,
    stop: Option<StopFlag>,
}

impl<'a, E: Env> Trial<'a, E> {
    /// Creates a trial, validating the start state with [`Env::reset`].
    pub fn new(env: &'a E, start: &E::Obs, max_steps: usize) -> Result<Self> {
        let start = env.reset(start)?;
        Ok(Self {
            env,
            obs: start.clone(),
            start,
            max_steps,
            steps: 0,
            reward: 0.0,
            status: TrialStatus::Created,
            stop: None,
        })
    }

    /// Attaches a cancellation flag checked before every step.
    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Current status.
    pub fn status(&self) -> TrialStatus {
        self.status
    }

    /// Current state.
    pub fn obs(&self) -> &E::Obs {
        &self.obs
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    fn update_status(&mut self) {
        if self.env.is_terminal(&self.obs) {
            self.status = TrialStatus::Terminated;
        } else if self.stop.as_ref().map_or(false, |s| s.is_stopped()) {
            self.status = TrialStatus::Cancelled;
        } else if self.steps >= self.max_steps {
            self.status = TrialStatus::StepCapped;
        }
    }

    /// Takes one `select_action` → `step` → `observe` cycle.
    ///
    /// Returns the record produced by [`Solver::observe`]. Does nothing once the
    /// trial is finished.
    pub fn step<S>(&mut self, solver: &mut S, rng: &mut dyn RngCore) -> Result<Record>
    where
        S: Solver<E> + ?Sized,
    {
        if self.status == TrialStatus::Created {
            solver.begin_trial(self.env, &self.obs);
            self.status = TrialStatus::Running;
            self.update_status();
        }
        if self.status.is_finished() {
            return Ok(Record::empty());
        }

        let act = solver.select_action(self.env, &self.obs, rng);
        let step = self.env.step(&self.obs, &act);
        trace!("{:?} --{:?}--> {:?} ({})", self.obs, act, step.obs, step.reward);

        self.steps += 1;
        self.reward += step.reward;
        let transition = Transition::from_step(self.obs.clone(), step);
        let record = solver.observe(self.env, &transition)?;
        self.obs = transition.next_obs;
        self.update_status();

        Ok(record)
    }

    /// Runs the trial to completion.
    ///
    /// Non-empty solver records are passed to `on_record`.
    pub fn run<S>(
        mut self,
        solver: &mut S,
        rng: &mut dyn RngCore,
        mut on_record: impl FnMut(Record),
    ) -> Result<TrialOutcome<E::Obs>>
    where
        S: Solver<E> + ?Sized,
    {
        loop {
            let record = self.step(solver, rng)?;
            if !record.is_empty() {
                on_record(record);
            }
            if self.status.is_finished() {
                break;
            }
        }

        Ok(TrialOutcome {
            start: self.start,
            status: self.status,
            steps: self.steps,
            reward: self.reward,
        })
    }
}
