//! Replay of a policy from one start state.
use crate::{Env, Policy};
use anyhow::Result;
use rand::RngCore;
use std::fmt;

/// One step of an [`Attempt`].
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptStep<O, A> {
    /// Action taken.
    pub act: A,

    /// State reached.
    pub obs: O,

    /// Reward received.
    pub reward: f64,
}

/// The trajectory of a policy followed from a start state.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt<O, A> {
    /// Start state.
    pub start: O,

    /// Steps in order.
    pub steps: Vec<AttemptStep<O, A>>,

    /// `true` if a terminal state was reached within the budget.
    pub succeeded: bool,
}

impl<O, A> Attempt<O, A> {
    /// Number of steps taken.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if no step was taken.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of rewards.
    pub fn total_reward(&self) -> f64 {
        self.steps.iter().map(|s| s.reward).sum()
    }
}

impl<O: fmt::Display, A: fmt::Debug> fmt::Display for Attempt<O, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start: {}", self.start)?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(
                f,
                "{:>3}: {:<8} -> {} ({})",
                i + 1,
                format!("{:?}", step.act),
                step.obs,
                step.reward
            )?;
        }
        write!(
            f,
            "{} after {} steps, reward {}",
            if self.succeeded { "solved" } else { "failed" },
            self.len(),
            self.total_reward()
        )
    }
}

/// Follows `policy` from `start` for at most `max_steps` steps.
pub fn attempt<E, P>(
    env: &E,
    policy: &P,
    start: &E::Obs,
    max_steps: usize,
    rng: &mut dyn RngCore,
) -> Result<Attempt<E::Obs, E::Act>>
where
    E: Env,
    P: Policy<E> + ?Sized,
{
    let start = env.reset(start)?;
    let mut obs = start.clone();
    let mut steps = Vec::new();

    while !env.is_terminal(&obs) && steps.len() < max_steps {
        let act = policy.act(env, &obs, rng);
        let step = env.step(&obs, &act);
        obs = step.obs.clone();
        steps.push(AttemptStep {
            act,
            obs: step.obs,
            reward: step.reward,
        });
    }

    Ok(Attempt {
        succeeded: env.is_terminal(&obs),
        start,
        steps,
    })
}
