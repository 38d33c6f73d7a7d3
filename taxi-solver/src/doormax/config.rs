//! Configuration of [`DoorMax`](super::DoorMax).
use crate::planner::{default_error_delta, default_max_iterations, PlannerParams};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use taxi_core::TaxiError;
use taxi_env::TaxiEnv;

/// Configuration of [`DoorMax`](super::DoorMax).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DoorMaxConfig {
    /// Discount factor, in `[0, 1)`.
    pub gamma: f64,

    /// Evidence after which a rule is trusted.
    pub known_count: usize,

    /// Learns rewards as rules instead of reading them from the cost model.
    #[serde(default)]
    pub use_reward_learner: bool,

    /// Lets the reward rules generalize over conditions.
    ///
    /// Exact reward rules need one observation per condition and action.
    /// Generalized rules need fewer, but a rule built from failed dropoffs
    /// also covers the delivering one until it is tried, so the learner stays
    /// exact unless set. Only used with `use_reward_learner`.
    #[serde(default)]
    pub generalize_rewards: bool,

    /// Lets rules predicting no change generalize over conditions.
    ///
    /// A generalized "no change" rule can hide an effect that was never
    /// tried, e.g. a successful dropoff, so these rules stay exact unless set.
    #[serde(default)]
    pub generalize_unchanged: bool,

    /// Value iteration stops once no value moves by this much.
    #[serde(default = "default_error_delta")]
    pub error_delta: f64,

    /// Sweep cap of value iteration.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Optimistic reward of unmodelled pairs, the largest reward of the cost
    /// model if not given.
    #[serde(default)]
    pub rmax: Option<f64>,
}

impl Default for DoorMaxConfig {
    fn default() -> Self {
        Self {
            gamma: 0.3,
            known_count: 1,
            use_reward_learner: false,
            generalize_rewards: false,
            generalize_unchanged: false,
            error_delta: default_error_delta(),
            max_iterations: default_max_iterations(),
            rmax: None,
        }
    }
}

impl DoorMaxConfig {
    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the evidence threshold.
    pub fn known_count(mut self, v: usize) -> Self {
        self.known_count = v;
        self
    }

    /// Enables or disables the reward learner.
    pub fn use_reward_learner(mut self, v: bool) -> Self {
        self.use_reward_learner = v;
        self
    }

    /// Enables or disables generalization of reward rules.
    pub fn generalize_rewards(mut self, v: bool) -> Self {
        self.generalize_rewards = v;
        self
    }

    /// Enables or disables generalization of "no change" rules.
    pub fn generalize_unchanged(mut self, v: bool) -> Self {
        self.generalize_unchanged = v;
        self
    }

    /// Sets the convergence threshold of value iteration.
    pub fn error_delta(mut self, v: f64) -> Self {
        self.error_delta = v;
        self
    }

    /// Sets the sweep cap of value iteration.
    pub fn max_iterations(mut self, v: usize) -> Self {
        self.max_iterations = v;
        self
    }

    /// Sets the optimistic reward.
    pub fn rmax(mut self, v: f64) -> Self {
        self.rmax = Some(v);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), TaxiError> {
        if self.known_count == 0 {
            return Err(TaxiError::InvalidConfig(
                "known_count must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn planner_params(&self, env: &TaxiEnv) -> PlannerParams {
        PlannerParams {
            gamma: self.gamma,
            error_delta: self.error_delta,
            max_iterations: self.max_iterations,
            rmax: self.rmax.unwrap_or_else(|| env.max_reward()),
        }
    }

    /// Constructs [`DoorMaxConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DoorMaxConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_doormax_config() -> Result<()> {
        let config = DoorMaxConfig::default()
            .gamma(0.9)
            .use_reward_learner(true)
            .error_delta(1e-3);
        let dir = TempDir::new("doormax_config")?;
        let path = dir.path().join("doormax_config.yaml");
        config.save(&path)?;
        assert_eq!(DoorMaxConfig::load(&path)?, config);
        Ok(())
    }
}
