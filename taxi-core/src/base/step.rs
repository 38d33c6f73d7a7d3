//! Environment step.
use super::Env;
use std::fmt;

/// Represents the outcome of applying an action.
pub struct Step<E: Env> {
    /// Action.
    pub act: E::Act,

    /// State after the action.
    pub obs: E::Obs,

    /// Reward.
    pub reward: f64,

    /// Flag denoting if the resulting state is terminal.
    pub is_terminated: bool,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(obs: E::Obs, act: E::Act, reward: f64, is_terminated: bool) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
        }
    }

    #[inline]
    /// Terminated or not.
    pub fn is_done(&self) -> bool {
        self.is_terminated
    }
}

/// A transition `(s, a, r, s')` as seen by a learning solver.
pub struct Transition<E: Env> {
    /// State the action was taken in.
    pub obs: E::Obs,

    /// Action.
    pub act: E::Act,

    /// Reward.
    pub reward: f64,

    /// Resulting state.
    pub next_obs: E::Obs,

    /// Flag denoting if `next_obs` is terminal.
    pub is_terminated: bool,
}

impl<E: Env> Transition<E> {
    /// Builds a transition from the state before the step and the step itself.
    pub fn from_step(obs: E::Obs, step: Step<E>) -> Self {
        Self {
            obs,
            act: step.act,
            reward: step.reward,
            next_obs: step.obs,
            is_terminated: step.is_terminated,
        }
    }
}

impl<E: Env> Clone for Transition<E> {
    fn clone(&self) -> Self {
        Self {
            obs: self.obs.clone(),
            act: self.act,
            reward: self.reward,
            next_obs: self.next_obs.clone(),
            is_terminated: self.is_terminated,
        }
    }
}

impl<E: Env> fmt::Debug for Transition<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("obs", &self.obs)
            .field("act", &self.act)
            .field("reward", &self.reward)
            .field("next_obs", &self.next_obs)
            .field("is_terminated", &self.is_terminated)
            .finish()
    }
}
