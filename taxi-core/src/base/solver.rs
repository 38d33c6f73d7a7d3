//! Solver.
use super::{Env, Policy, Transition};
use crate::record::Record;
use anyhow::Result;
use rand::RngCore;

/// A learning solver.
///
/// A solver is a [`Policy`] that additionally picks exploratory actions during
/// trials and learns from the resulting transitions. What it learns persists
/// across trials of the same session.
pub trait Solver<E: Env>: Policy<E> {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Called once at the start of every trial.
    ///
    /// Solvers keeping per-trial bookkeeping, such as a call stack, reset it here.
    #[allow(unused_variables)]
    fn begin_trial(&mut self, env: &E, obs: &E::Obs) {}

    /// Chooses the action to take during learning.
    fn select_action(&mut self, env: &E, obs: &E::Obs, rng: &mut dyn RngCore) -> E::Act;

    /// Learns from a transition.
    ///
    /// The returned record carries solver diagnostics such as replanning counts.
    fn observe(&mut self, env: &E, transition: &Transition<E>) -> Result<Record>;
}

impl<E: Env, S: Solver<E> + ?Sized> Solver<E> for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn begin_trial(&mut self, env: &E, obs: &E::Obs) {
        (**self).begin_trial(env, obs)
    }

    fn select_action(&mut self, env: &E, obs: &E::Obs, rng: &mut dyn RngCore) -> E::Act {
        (**self).select_action(env, obs, rng)
    }

    fn observe(&mut self, env: &E, transition: &Transition<E>) -> Result<Record> {
        (**self).observe(env, transition)
    }
}
