//! Configuration of [`FactoredRMax`](super::FactoredRMax).
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

/// Configuration of [`FactoredRMax`](super::FactoredRMax).
///
/// The per-factor thresholds fall back to `known_count`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct FactoredRMaxConfig {
    /// Discount factor, in `[0, 1)`.
    pub gamma: f64,

    /// Observations after which a factor context is known.
    pub known_count: usize,

    /// Threshold of the taxi position factor.
    #[serde(default)]
    pub taxi_known_count: Option<usize>,

    /// Threshold of the passenger status factor.
    #[serde(default)]
    pub passenger_known_count: Option<usize>,

    /// Threshold of the reward factor.
    #[serde(default)]
    pub reward_known_count: Option<usize>,

    /// Value iteration stops once no value moves by this much.
    #[serde(default = "default_error_delta")]
    pub error_delta: f64,

    /// Sweep cap of value iteration.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Optimistic reward of unknown pairs, the largest reward of the cost
    /// model if not given.
    #[serde(default)]
    pub rmax: Option<f64>,
}

impl Default for FactoredRMaxConfig {
    fn default() -> Self {
        Self {
            gamma: 0.3,
            known_count: 1,
            taxi_known_count: None,
            passenger_known_count: None,
            reward_known_count: None,
            error_delta: default_error_delta(),
            max_iterations: default_max_iterations(),
            rmax: None,
        }
    }
}

impl FactoredRMaxConfig {
    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the default known threshold.
    pub fn known_count(mut self, v: usize) -> Self {
        self.known_count = v;
        self
    }

    /// Sets the threshold of the taxi position factor.
    pub fn taxi_known_count(mut self, v: usize) -> Self {
        self.taxi_known_count = Some(v);
        self
    }

    /// Sets the threshold of the passenger status factor.
    pub fn passenger_known_count(mut self, v: usize) -> Self {
        self.passenger_known_count = Some(v);
        self
    }

    /// Sets the threshold of the reward factor.
    pub fn reward_known_count(mut self, v: usize) -> Self {
        self.reward_known_count = Some(v);
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

    /// Thresholds of the taxi, passenger and reward factors.
    pub fn thresholds(&self) -> Result<[usize; 3], TaxiError> {
        let t = [
            self.taxi_known_count.unwrap_or(self.known_count),
            self.passenger_known_count.unwrap_or(self.known_count),
            self.reward_known_count.unwrap_or(self.known_count),
        ];
        if t.iter().any(|k| *k == 0) {
            return Err(TaxiError::InvalidConfig(
                "known counts must be positive".to_string(),
            ));
        }
        Ok(t)
    }

    pub(crate) fn planner_params(&self, env: &TaxiEnv) -> PlannerParams {
        PlannerParams {
            gamma: self.gamma,
            error_delta: self.error_delta,
            max_iterations: self.max_iterations,
            rmax: self.rmax.unwrap_or_else(|| env.max_reward()),
        }
    }

    /// Constructs [`FactoredRMaxConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`FactoredRMaxConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
