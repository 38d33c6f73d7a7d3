//! Rewards of the taxi domain.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Rewards paid by [`TaxiEnv`](crate::TaxiEnv).
///
/// Every value is a reward, so costs are negative. A successful dropoff pays
/// `success_dropoff`, which is `0` by default: reaching the goal ends the
/// stream of movement costs and earns nothing on top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Reward of every movement and of a successful pickup.
    pub movement: f64,

    /// Reward of a pickup where no waiting passenger is.
    pub miss_pickup: f64,

    /// Reward of a dropoff away from the destination.
    pub miss_dropoff: f64,

    /// Reward of a dropoff without a passenger.
    pub empty_dropoff: f64,

    /// Reward of the dropoff that delivers the passenger.
    pub success_dropoff: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            movement: -1.0,
            miss_pickup: -10.0,
            miss_dropoff: -10.0,
            empty_dropoff: -10.0,
            success_dropoff: 0.0,
        }
    }
}

impl CostModel {
    /// Sets the movement reward.
    pub fn movement(mut self, v: f64) -> Self {
        self.movement = v;
        self
    }

    /// Sets the failed pickup reward.
    pub fn miss_pickup(mut self, v: f64) -> Self {
        self.miss_pickup = v;
        self
    }

    /// Sets the wrong-cell dropoff reward.
    pub fn miss_dropoff(mut self, v: f64) -> Self {
        self.miss_dropoff = v;
        self
    }

    /// Sets the empty dropoff reward.
    pub fn empty_dropoff(mut self, v: f64) -> Self {
        self.empty_dropoff = v;
        self
    }

    /// Sets the delivery reward.
    pub fn success_dropoff(mut self, v: f64) -> Self {
        self.success_dropoff = v;
        self
    }

    /// Largest reward any step can pay, including the `0` of terminal states.
    pub fn max_reward(&self) -> f64 {
        [
            self.movement,
            self.miss_pickup,
            self.miss_dropoff,
            self.empty_dropoff,
            self.success_dropoff,
            0.0,
        ]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Constructs [`CostModel`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CostModel`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_reward() {
        assert_eq!(CostModel::default().max_reward(), 0.0);
        assert_eq!(CostModel::default().success_dropoff(20.0).max_reward(), 20.0);
    }

    #[test]
    fn test_success_dropoff_is_required() {
        let yaml = "movement: -1\nmiss_pickup: -10\nmiss_dropoff: -10\nempty_dropoff: -10\n";
        assert!(serde_yaml::from_str::<CostModel>(yaml).is_err());
    }
}
