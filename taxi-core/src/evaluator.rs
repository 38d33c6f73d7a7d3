//! Evaluate a [`Policy`] on scripted start states.
use crate::{record::Record, Env, Policy};
use anyhow::Result;
mod attempt;
mod probe_evaluator;
pub use attempt::{attempt, Attempt, AttemptStep};
pub use probe_evaluator::{Probe, ProbeEvaluator, ProbeResult};

/// Evaluates a [`Policy`].
///
/// Evaluation only reads the policy; learning state is never touched.
pub trait Evaluator<E: Env> {
    /// Evaluates the policy.
    fn evaluate<P>(&mut self, env: &E, policy: &P) -> Result<Record>
    where
        P: Policy<E> + ?Sized;
}
