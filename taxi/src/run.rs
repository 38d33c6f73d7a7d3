//! Runs the solvers of a [`RunConfig`].
use crate::RunConfig;
use anyhow::Result;
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use taxi_core::{
    attempt, record::NullRecorder, Attempt, Configurable, MeasureDistribution, Session,
    SessionReport, SessionRunner, Solver,
};
use taxi_env::{Action, State, TaxiEnv};
use taxi_solver::{DoorMax, FactoredRMax, MaxQ, QLearner, RMax, RandomSolver};

/// A solver variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverChoice {
    /// [`RandomSolver`].
    #[serde(rename = "random")]
    Random,
    /// [`QLearner`].
    #[serde(rename = "qlearner")]
    QLearner,
    /// [`RMax`].
    #[serde(rename = "rmax")]
    RMax,
    /// [`FactoredRMax`].
    #[serde(rename = "factored_rmax")]
    FactoredRMax,
    /// [`DoorMax`].
    #[serde(rename = "doormax")]
    DoorMax,
    /// [`MaxQ`].
    #[serde(rename = "maxq")]
    MaxQ,
}

impl SolverChoice {
    /// Every variant.
    pub const ALL: [SolverChoice; 6] = [
        SolverChoice::Random,
        SolverChoice::QLearner,
        SolverChoice::RMax,
        SolverChoice::FactoredRMax,
        SolverChoice::DoorMax,
        SolverChoice::MaxQ,
    ];

    /// Name of the variant, the same as the name of the solver it builds.
    pub fn name(&self) -> &'static str {
        match self {
            SolverChoice::Random => "random",
            SolverChoice::QLearner => "qlearner",
            SolverChoice::RMax => "rmax",
            SolverChoice::FactoredRMax => "factored_rmax",
            SolverChoice::DoorMax => "doormax",
            SolverChoice::MaxQ => "maxq",
        }
    }
}

impl fmt::Display for SolverChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A solver of any variant.
pub type BoxedSolver = Box<dyn Solver<TaxiEnv> + Send>;

/// Builds a fresh solver of the given variant.
///
/// A variant without an entry in `config` is built with its default
/// configuration.
pub fn build_solver(
    choice: SolverChoice,
    config: &RunConfig,
    env: &TaxiEnv,
) -> Result<BoxedSolver> {
    let solvers = &config.solvers;
    let solver: BoxedSolver = match choice {
        SolverChoice::Random => Box::new(RandomSolver::new()),
        SolverChoice::QLearner => Box::new(QLearner::build(
            solvers.qlearner.clone().unwrap_or_default(),
            env,
        )?),
        SolverChoice::RMax => Box::new(RMax::build(
            solvers.rmax.clone().unwrap_or_default(),
            env,
        )?),
        SolverChoice::FactoredRMax => Box::new(FactoredRMax::build(
            solvers.factored_rmax.clone().unwrap_or_default(),
            env,
        )?),
        SolverChoice::DoorMax => Box::new(DoorMax::build(
            solvers.doormax.clone().unwrap_or_default(),
            env,
        )?),
        SolverChoice::MaxQ => Box::new(MaxQ::build(
            solvers.maxq.clone().unwrap_or_default(),
            env,
        )?),
    };
    Ok(solver)
}

/// One line of a run summary, one per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    /// Solver name.
    pub solver: String,
    /// Session seed.
    pub seed: u64,
    /// Trials run.
    pub trials: usize,
    /// Trials that delivered the passenger.
    pub terminated: usize,
    /// Steps over all trials.
    pub steps: usize,
    /// Reward over all trials.
    pub reward: f64,
    /// Trials after which every probe first passed.
    pub trials_to_solve: Option<usize>,
    /// `true` if every probe passed at the end of the session.
    pub probes_passed: bool,
}

impl From<&SessionReport<State>> for SessionRow {
    fn from(report: &SessionReport<State>) -> Self {
        Self {
            solver: report.solver.clone(),
            seed: report.seed,
            trials: report.n_trials(),
            terminated: report.n_terminated(),
            steps: report.total_steps(),
            reward: report.total_reward(),
            trials_to_solve: report.trials_to_solve,
            probes_passed: report.probes_passed(),
        }
    }
}

/// Reports of every session of one solver.
#[derive(Debug, Clone)]
pub struct SolverSummary {
    /// Variant that ran.
    pub choice: SolverChoice,

    /// Reports in session order.
    pub reports: Vec<SessionReport<State>>,
}

impl SolverSummary {
    /// Distribution of the total steps of a session.
    pub fn steps(&self) -> MeasureDistribution {
        self.reports.iter().map(|r| r.total_steps() as f64).collect()
    }

    /// Distribution of the total reward of a session.
    pub fn rewards(&self) -> MeasureDistribution {
        self.reports.iter().map(|r| r.total_reward()).collect()
    }

    /// Distribution of the trials needed to pass every probe, over the
    /// sessions that did.
    pub fn trials_to_solve(&self) -> MeasureDistribution {
        self.reports
            .iter()
            .filter_map(|r| r.trials_to_solve)
            .map(|n| n as f64)
            .collect()
    }

    /// Number of sessions whose final probe evaluation passed.
    pub fn n_probes_passed(&self) -> usize {
        self.reports.iter().filter(|r| r.probes_passed()).count()
    }

    /// One row per session.
    pub fn rows(&self) -> Vec<SessionRow> {
        self.reports.iter().map(SessionRow::from).collect()
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Runs every session of one solver.
///
/// Every session builds its own solver, so sessions are independent:
///
/// ```mermaid
/// flowchart LR
///   A[RunConfig] -->|build_solver| B[Solver]
///   A -->|build_probes| C[Session]
///   B --> D[SessionRunner]
///   C --> D
///   D -->|one per seed| E[SessionReport]
/// ```
pub fn run_solver(
    choice: SolverChoice,
    config: &RunConfig,
    env: &TaxiEnv,
) -> Result<SolverSummary> {
    let probes = config.build_probes(env.world())?;
    let session = Session::build(config.session.clone()).probes(probes);
    let runner = SessionRunner::new(config.runner.clone(), session);
    info!("Run {}", choice);
    let reports = runner.run(env, || build_solver(choice, config, env))?;
    Ok(SolverSummary { choice, reports })
}

/// Runs every enabled solver in turn.
pub fn run_all(config: &RunConfig, env: &TaxiEnv) -> Result<Vec<SolverSummary>> {
    config
        .solvers
        .enabled()
        .into_iter()
        .map(|choice| run_solver(choice, config, env))
        .collect()
}

/// Trains the replay solver for one session and replays the scenario with its
/// greedy policy.
///
/// The session uses the first session seed of the run. Returns `None` if no
/// replay is configured.
pub fn replay(config: &RunConfig, env: &TaxiEnv) -> Result<Option<Attempt<State, Action>>> {
    let replay = match &config.replay {
        Some(replay) => replay,
        None => return Ok(None),
    };
    let start = replay.scenario.state(env.world())?;
    let seed = config
        .runner
        .session_seeds()
        .first()
        .copied()
        .unwrap_or(config.runner.seed);

    let mut solver = build_solver(replay.solver, config, env)?;
    let probes = config.build_probes(env.world())?;
    let session = Session::build(config.session.clone()).probes(probes);
    let report = session.run(env, &mut solver, seed, &mut NullRecorder::new())?;
    info!(
        "Trained {} for replay in {} trials",
        replay.solver,
        report.n_trials()
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let attempt = attempt(env, &solver, &start, replay.scenario.max_steps, &mut rng)?;
    Ok(Some(attempt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_names_match_solvers() -> Result<()> {
        let config = RunConfig::default();
        let env = <TaxiEnv as taxi_core::Env>::build(&config.taxi_config())?;
        for choice in SolverChoice::ALL.iter() {
            let solver = build_solver(*choice, &config, &env)?;
            assert_eq!(solver.name(), choice.name());
            let yaml = serde_yaml::to_string(choice)?;
            assert!(yaml.contains(choice.name()));
        }
        Ok(())
    }
}
