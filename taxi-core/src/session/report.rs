use crate::{
    evaluator::ProbeResult,
    record::{Record, RecordValue},
    trial::{TrialOutcome, TrialStatus},
};
use chrono::prelude::{DateTime, Local};

/// What a session did, trial by trial.
#[derive(Debug, Clone)]
pub struct SessionReport<O> {
    /// Solver name.
    pub solver: String,

    /// Seed of the session's random stream.
    pub seed: u64,

    /// Wall-clock start of the session.
    pub started: DateTime<Local>,

    /// Outcome of every trial run, in order.
    pub outcomes: Vec<TrialOutcome<O>>,

    /// Probe results of the final evaluation, empty without probes.
    pub probe_results: Vec<ProbeResult>,

    /// Number of trials after which every probe first passed.
    pub trials_to_solve: Option<usize>,

    /// `true` if the session was stopped through its stop flag.
    pub cancelled: bool,
}

impl<O> SessionReport<O> {
    /// Number of trials run.
    pub fn n_trials(&self) -> usize {
        self.outcomes.len()
    }

    /// Reward of every trial.
    pub fn trial_rewards(&self) -> Vec<f64> {
        self.outcomes.iter().map(|o| o.reward).collect()
    }

    /// Steps of every trial.
    pub fn trial_steps(&self) -> Vec<usize> {
        self.outcomes.iter().map(|o| o.steps).collect()
    }

    /// Sum of rewards over all trials.
    pub fn total_reward(&self) -> f64 {
        self.outcomes.iter().map(|o| o.reward).sum()
    }

    /// Sum of steps over all trials.
    pub fn total_steps(&self) -> usize {
        self.outcomes.iter().map(|o| o.steps).sum()
    }

    /// Number of trials that reached a terminal state.
    pub fn n_terminated(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == TrialStatus::Terminated)
            .count()
    }

    /// `true` if every probe of the final evaluation passed.
    pub fn probes_passed(&self) -> bool {
        self.probe_results.iter().all(|r| r.success)
    }

    /// Summarizes the session as a [`Record`].
    pub fn to_record(&self) -> Record {
        let mut record = Record::from_slice(&[
            ("solver", RecordValue::String(self.solver.clone())),
            ("started", RecordValue::DateTime(self.started)),
            ("n_trials", RecordValue::Scalar(self.n_trials() as f32)),
            ("total_reward", RecordValue::Scalar(self.total_reward() as f32)),
            ("total_steps", RecordValue::Scalar(self.total_steps() as f32)),
            (
                "trial_rewards",
                RecordValue::Array1(self.outcomes.iter().map(|o| o.reward as f32).collect()),
            ),
        ]);
        if let Some(n) = self.trials_to_solve {
            record.insert("trials_to_solve", RecordValue::Scalar(n as f32));
        }
        record
    }
}
