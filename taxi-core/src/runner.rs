//! Runs many independent sessions, optionally on worker threads.
use crate::{
    record::LogRecorder,
    session::{Session, SessionReport},
    util::{derive_seed, StopFlag},
    Env, Solver,
};
use anyhow::Result;
use crossbeam_channel::{bounded, unbounded};
use log::info;
use serde::{Deserialize, Serialize};

/// Configuration of [`SessionRunner`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct RunnerConfig {
    /// Number of sessions.
    pub sessions: usize,

    /// Number of worker threads, `1` runs the sessions on the calling thread.
    #[serde(default = "default_n_workers")]
    pub n_workers: usize,

    /// Root seed the session seeds are derived from.
    #[serde(default)]
    pub seed: u64,

    /// Explicit session seeds, overriding `sessions` and `seed`.
    #[serde(default)]
    pub seeds: Option<Vec<u64>>,
}

fn default_n_workers() -> usize {
    1
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            sessions: 1,
            n_workers: default_n_workers(),
            seed: 0,
            seeds: None,
        }
    }
}

impl RunnerConfig {
    /// Sets the number of sessions.
    pub fn sessions(mut self, v: usize) -> Self {
        self.sessions = v;
        self
    }

    /// Sets the number of worker threads.
    pub fn n_workers(mut self, v: usize) -> Self {
        self.n_workers = v;
        self
    }

    /// Sets the root seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets explicit session seeds.
    pub fn seeds(mut self, v: Vec<u64>) -> Self {
        self.seeds = Some(v);
        self
    }

    /// Seed of every session, in session order.
    pub fn session_seeds(&self) -> Vec<u64> {
        match &self.seeds {
            Some(seeds) => seeds.clone(),
            None => (0..self.sessions as u64)
                .map(|i| derive_seed(self.seed, i))
                .collect(),
        }
    }
}

/// Runs sessions of a solver.
///
/// Every session gets a fresh solver from the factory passed to
/// [`SessionRunner::run`], so sessions share nothing but the environment.
/// Reports come back in session order whatever the number of workers.
pub struct SessionRunner<E: Env> {
    config: RunnerConfig,
    session: Session<E>,
    stop: StopFlag,
}

impl<E: Env> SessionRunner<E> {
    /// Creates a runner.
    ///
    /// The stop flag of `session` is replaced by the runner's own flag.
    pub fn new(config: RunnerConfig, session: Session<E>) -> Self {
        let stop = StopFlag::new();
        Self {
            config,
            session: session.stop_flag(stop.clone()),
            stop,
        }
    }

    /// Flag that cancels every running and pending session.
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    fn run_one<S, F>(
        &self,
        env: &E,
        build_solver: &F,
        index: usize,
        seed: u64,
    ) -> Result<SessionReport<E::Obs>>
    where
        S: Solver<E>,
        F: Fn() -> Result<S>,
    {
        let mut solver = build_solver()?;
        let mut recorder = LogRecorder::new(format!("{} session {}", solver.name(), index));
        self.session.run(env, &mut solver, seed, &mut recorder)
    }

    /// Runs every session and returns the reports in session order.
    ///
    /// The first failing session, in session order, decides the error.
    pub fn run<S, F>(&self, env: &E, build_solver: F) -> Result<Vec<SessionReport<E::Obs>>>
    where
        E: Sync,
        E::Obs: Send + Sync,
        S: Solver<E>,
        F: Fn() -> Result<S> + Sync,
    {
        let seeds = self.config.session_seeds();
        info!(
            "Run {} sessions on {} worker(s)",
            seeds.len(),
            self.config.n_workers.max(1)
        );

        if self.config.n_workers <= 1 {
            return seeds
                .iter()
                .enumerate()
                .map(|(i, seed)| self.run_one(env, &build_solver, i, *seed))
                .collect();
        }

        let (job_sender, job_receiver) = bounded(seeds.len());
        for job in seeds.iter().copied().enumerate() {
            job_sender.send(job)?;
        }
        drop(job_sender);
        let (result_sender, result_receiver) = unbounded();

        std::thread::scope(|scope| {
            for _ in 0..self.config.n_workers {
                let job_receiver = job_receiver.clone();
                let result_sender = result_sender.clone();
                let build_solver = &build_solver;
                scope.spawn(move || {
                    for (i, seed) in job_receiver.iter() {
                        let result = self.run_one(env, build_solver, i, seed);
                        if result.is_err() {
                            self.stop.stop();
                        }
                        if result_sender.send((i, result)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_sender);

        let mut results: Vec<(usize, Result<SessionReport<E::Obs>>)> =
            result_receiver.iter().collect();
        results.sort_by_key(|(i, _)| *i);
        results.into_iter().map(|(_, r)| r).collect()
    }
}
