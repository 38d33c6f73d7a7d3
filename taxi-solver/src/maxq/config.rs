//! Configuration of [`MaxQ`](super::MaxQ).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use taxi_core::TaxiError;

/// Configuration of [`MaxQ`](super::MaxQ).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MaxQConfig {
    /// Learning rate.
    pub alpha: f64,

    /// Discount factor.
    pub gamma: f64,

    /// Probability of a uniformly random subtask during learning.
    pub epsilon: f64,

    /// Completion target of a subtask whose parent ends with it.
    #[serde(default)]
    pub pseudo_reward: f64,
}

impl Default for MaxQConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.3,
            epsilon: 0.6,
            pseudo_reward: 0.0,
        }
    }
}

impl MaxQConfig {
    /// Sets the learning rate.
    pub fn alpha(mut self, v: f64) -> Self {
        self.alpha = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the exploration rate.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.epsilon = v;
        self
    }

    /// Sets the completion pseudo-reward.
    pub fn pseudo_reward(mut self, v: f64) -> Self {
        self.pseudo_reward = v;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), TaxiError> {
        for (name, v) in [("alpha", self.alpha), ("gamma", self.gamma), ("epsilon", self.epsilon)]
            .iter()
        {
            if !(0.0..=1.0).contains(v) {
                return Err(TaxiError::InvalidConfig(format!(
                    "{} must be in [0, 1], got {}",
                    name, v
                )));
            }
        }
        Ok(())
    }

    /// Constructs [`MaxQConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MaxQConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
