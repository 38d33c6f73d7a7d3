//! Session: a sequence of trials against one solver.
mod config;
mod report;
use crate::{
    evaluator::{Evaluator, Probe, ProbeEvaluator},
    record::AggregateRecorder,
    trial::{Trial, TrialStatus},
    util::{derive_seed, StopFlag},
    Env, Solver,
};
use anyhow::Result;
use chrono::Local;
pub use config::SessionConfig;
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
pub use report::SessionReport;

/// Stream index of the probe evaluator's seed, derived from the session seed.
const PROBE_STREAM: u64 = 1;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Runs the trials of one session.
///
/// A session owns nothing but its configuration: the solver is passed in, so
/// whatever it learned survives from one trial to the next. Start states are
/// drawn from a [`StdRng`] seeded with the session seed, and the same stream
/// feeds the solver's exploration, so one seed reproduces a whole session.
///
/// ```mermaid
/// graph LR
///     A[reset_random] --> B[Trial]
///     B -->|select_action| C[Solver]
///     C -->|Act| D[Env::step]
///     D -->|Transition| C
///     B --> E[TrialOutcome]
///     E --> F{probe_interval?}
///     F -->|yes| G[ProbeEvaluator]
///     G -->|all passed| H[trials_to_solve]
///     F -->|no| A
/// ```
pub struct Session<E: Env> {
    config: SessionConfig,
    probes: Vec<Probe<E::Obs>>,
    stop: Option<StopFlag>,
}

impl<E: Env> Session<E> {
    /// Creates a session.
    pub fn build(config: SessionConfig) -> Self {
        Self {
            config,
            probes: vec![],
            stop: None,
        }
    }

    /// Sets the probes evaluated during and after the session.
    pub fn probes(mut self, probes: Vec<Probe<E::Obs>>) -> Self {
        self.probes = probes;
        self
    }

    /// Attaches a cancellation flag.
    pub fn stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = Some(stop);
        self
    }

    /// The configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn is_stopped(&self) -> bool {
        self.stop.as_ref().map_or(false, |s| s.is_stopped())
    }

    /// Runs the session.
    ///
    /// Every trial is stored in `recorder` as one record; solver diagnostics
    /// and the record of every probe evaluation are stored alongside. Errors raised by the solver end the session.
    pub fn run<S>(
        &self,
        env: &E,
        solver: &mut S,
        seed: u64,
        recorder: &mut dyn AggregateRecorder,
    ) -> Result<SessionReport<E::Obs>>
    where
        S: Solver<E> + ?Sized,
    {
        self.config.validate()?;
        for probe in self.probes.iter() {
            env.reset(&probe.obs)?;
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut evaluator =
            ProbeEvaluator::<E>::new(self.probes.clone(), derive_seed(seed, PROBE_STREAM));
        let mut report = SessionReport {
            solver: solver.name().to_string(),
            seed,
            started: Local::now(),
            outcomes: Vec::with_capacity(self.config.max_trials),
            probe_results: vec![],
            trials_to_solve: None,
            cancelled: false,
        };
        info!("Start session of {} with seed {}", report.solver, seed);

        for i in 0..self.config.max_trials {
            if self.is_stopped() {
                report.cancelled = true;
                break;
            }

            let start = env.reset_random(&mut rng);
            let mut trial = Trial::new(env, &start, self.config.max_trial_steps)?;
            if let Some(stop) = &self.stop {
                trial = trial.with_stop_flag(stop.clone());
            }
            let outcome = trial.run(solver, &mut rng, |record| recorder.store(record))?;
            debug!(
                "Trial {}: {} after {} steps, reward {}",
                i + 1,
                outcome.status,
                outcome.steps,
                outcome.reward
            );
            recorder.store(outcome.to_record());
            if (i + 1) % self.config.flush_record_interval == 0 {
                recorder.flush((i + 1) as _);
            }

            let cancelled = outcome.status == TrialStatus::Cancelled;
            report.outcomes.push(outcome);
            if cancelled {
                report.cancelled = true;
                break;
            }

            let probe_now = self.config.probe_interval > 0
                && (i + 1) % self.config.probe_interval == 0
                && !self.probes.is_empty();
            if probe_now {
                recorder.store(evaluator.evaluate(env, &*solver)?);
                let passed = evaluator.results().iter().all(|r| r.success);
                report.probe_results = evaluator.results().to_vec();
                if passed && report.trials_to_solve.is_none() {
                    debug!("All probes passed after {} trials", i + 1);
                    report.trials_to_solve = Some(i + 1);
                    if self.config.stop_on_probe_success {
                        break;
                    }
                }
            }
        }

        if !self.probes.is_empty() {
            recorder.store(evaluator.evaluate(env, &*solver)?);
            report.probe_results = evaluator.results().to_vec();
        }
        recorder.flush(report.n_trials() as _);

        info!(
            "End session of {}: {} trials, total reward {}",
            report.solver,
            report.n_trials(),
            report.total_reward()
        );

        Ok(report)
    }
}
