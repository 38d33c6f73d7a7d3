//! A solver acting uniformly at random.
use anyhow::Result;
use rand::{Rng, RngCore};
use taxi_core::{record::Record, Configurable, Policy, Solver, Transition};
use taxi_env::{Action, State, TaxiEnv};

/// Picks every action uniformly and learns nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSolver {}

impl RandomSolver {
    /// Creates the solver.
    pub fn new() -> Self {
        Self {}
    }
}

impl Configurable<TaxiEnv> for RandomSolver {
    type Config = ();

    fn build(_config: (), _env: &TaxiEnv) -> Result<Self> {
        Ok(Self::new())
    }
}

impl Policy<TaxiEnv> for RandomSolver {
    fn act(&self, _env: &TaxiEnv, _obs: &State, rng: &mut dyn RngCore) -> Action {
        Action::ALL[rng.gen_range(0..Action::COUNT)]
    }
}

impl Solver<TaxiEnv> for RandomSolver {
    fn name(&self) -> &str {
        "random"
    }

    fn select_action(&mut self, env: &TaxiEnv, obs: &State, rng: &mut dyn RngCore) -> Action {
        self.act(env, obs, rng)
    }

    fn observe(&mut self, _env: &TaxiEnv, _transition: &Transition<TaxiEnv>) -> Result<Record> {
        Ok(Record::empty())
    }
}
