//! Environment.
use super::{Act, Obs, Step};
use anyhow::Result;
use rand::RngCore;

/// Represents a deterministic, stateless environment.
///
/// The environment only describes dynamics. Callers own the current state and
/// pass it to [`Env::step`], which makes it safe to share one environment
/// between the learner, the evaluator and concurrent sessions.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// States of the environment.
    type Obs: Obs;

    /// Actions of the environment.
    type Act: Act;

    /// Builds an environment with a given configuration.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Validates a start state, returning it when it is a legal non-terminal state.
    fn reset(&self, obs: &Self::Obs) -> Result<Self::Obs>;

    /// Draws a legal non-terminal start state.
    fn reset_random(&self, rng: &mut dyn RngCore) -> Self::Obs;

    /// Applies an action to a state.
    ///
    /// This method is pure: the same state and action always give the same step.
    fn step(&self, obs: &Self::Obs, act: &Self::Act) -> Step<Self>
    where
        Self: Sized;

    /// Returns `true` if the state is terminal.
    fn is_terminal(&self, obs: &Self::Obs) -> bool;
}
