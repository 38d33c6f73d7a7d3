//! Probe evaluation.
use super::{attempt, Evaluator};
use crate::{
    record::{Record, RecordValue},
    Env, Policy,
};
use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

/// A fixed start state with a step budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe<O> {
    /// Start state.
    pub obs: O,

    /// Steps allowed to reach a terminal state.
    pub max_steps: usize,
}

impl<O> Probe<O> {
    /// Creates a probe.
    pub fn new(obs: O, max_steps: usize) -> Self {
        Self { obs, max_steps }
    }
}

/// Result of running one [`Probe`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Steps taken.
    pub steps: usize,

    /// `true` if a terminal state was reached within the budget.
    pub success: bool,

    /// Sum of rewards.
    pub reward: f64,
}

/// Runs a list of probes with a greedy policy.
///
/// The evaluator owns its random stream, so evaluating never perturbs the
/// stream of the session that is learning.
pub struct ProbeEvaluator<E: Env> {
    probes: Vec<Probe<E::Obs>>,
    rng: StdRng,
    results: Vec<ProbeResult>,
}

impl<E: Env> ProbeEvaluator<E> {
    /// Creates an evaluator; the probe start states are validated when run.
    pub fn new(probes: Vec<Probe<E::Obs>>, seed: u64) -> Self {
        Self {
            probes,
            rng: StdRng::seed_from_u64(seed),
            results: vec![],
        }
    }

    /// The probes.
    pub fn probes(&self) -> &[Probe<E::Obs>] {
        &self.probes
    }

    /// Results of the last [`Evaluator::evaluate`], one per probe.
    pub fn results(&self) -> &[ProbeResult] {
        &self.results
    }

    /// Runs every probe in order.
    pub fn run<P>(&mut self, env: &E, policy: &P) -> Result<Vec<ProbeResult>>
    where
        P: Policy<E> + ?Sized,
    {
        let mut results = Vec::with_capacity(self.probes.len());
        for probe in self.probes.iter() {
            let attempt = attempt(env, policy, &probe.obs, probe.max_steps, &mut self.rng)?;
            results.push(ProbeResult {
                steps: attempt.len(),
                success: attempt.succeeded,
                reward: attempt.total_reward(),
            });
        }
        Ok(results)
    }
}

impl<E: Env> Evaluator<E> for ProbeEvaluator<E> {
    /// Runs the probes and reports how many passed; the results are kept for
    /// [`ProbeEvaluator::results`].
    fn evaluate<P>(&mut self, env: &E, policy: &P) -> Result<Record>
    where
        P: Policy<E> + ?Sized,
    {
        self.results = self.run(env, policy)?;
        let n_success = self.results.iter().filter(|r| r.success).count();
        Ok(Record::from_slice(&[
            ("probes_passed", RecordValue::Scalar(n_success as f32)),
            ("probes_total", RecordValue::Scalar(self.results.len() as f32)),
            (
                "probe_steps",
                RecordValue::Array1(self.results.iter().map(|r| r.steps as f32).collect()),
            ),
        ]))
    }
}
