//! Configuration of [`Session`](super::Session).
use crate::error::TaxiError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Session`](super::Session).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SessionConfig {
    /// The number of trials in a session.
    pub max_trials: usize,

    /// The step budget of a trial.
    pub max_trial_steps: usize,

    /// Interval of probe evaluation in trials, `0` to evaluate only at the end.
    #[serde(default)]
    pub probe_interval: usize,

    /// Ends the session at the first probe evaluation where every probe passes.
    #[serde(default)]
    pub stop_on_probe_success: bool,

    /// Interval of flushing records in trials.
    #[serde(default = "default_flush_record_interval")]
    pub flush_record_interval: usize,
}

fn default_flush_record_interval() -> usize {
    usize::MAX
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_trials: 100,
            max_trial_steps: 1000,
            probe_interval: 0,
            stop_on_probe_success: false,
            flush_record_interval: default_flush_record_interval(),
        }
    }
}

impl SessionConfig {
    /// Sets the number of trials.
    pub fn max_trials(mut self, v: usize) -> Self {
        self.max_trials = v;
        self
    }

    /// Sets the step budget of a trial.
    pub fn max_trial_steps(mut self, v: usize) -> Self {
        self.max_trial_steps = v;
        self
    }

    /// Sets the interval of probe evaluation in trials.
    pub fn probe_interval(mut self, v: usize) -> Self {
        self.probe_interval = v;
        self
    }

    /// Ends sessions early once all probes pass.
    pub fn stop_on_probe_success(mut self, v: bool) -> Self {
        self.stop_on_probe_success = v;
        self
    }

    /// Sets the interval of flushing records in trials.
    pub fn flush_record_interval(mut self, v: usize) -> Self {
        self.flush_record_interval = v;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), TaxiError> {
        if self.max_trial_steps == 0 {
            return Err(TaxiError::InvalidConfig(
                "max_trial_steps must be positive".to_string(),
            ));
        }
        if self.flush_record_interval == 0 {
            return Err(TaxiError::InvalidConfig(
                "flush_record_interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Constructs [`SessionConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`SessionConfig`].
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
    fn test_serde_session_config() -> Result<()> {
        let config = SessionConfig::default()
            .max_trials(40)
            .max_trial_steps(200)
            .probe_interval(5)
            .stop_on_probe_success(true);

        let dir = TempDir::new("session_config")?;
        let path = dir.path().join("session_config.yaml");
        config.save(&path)?;
        let config_ = SessionConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_optional_fields_default() {
        let config: SessionConfig =
            serde_yaml::from_str("max_trials: 3\nmax_trial_steps: 50\n").unwrap();
        assert_eq!(config.probe_interval, 0);
        assert!(!config.stop_on_probe_success);
        assert_eq!(config.flush_record_interval, usize::MAX);
    }

    #[test]
    fn test_zero_step_budget_rejected() {
        let config = SessionConfig::default().max_trial_steps(0);
        assert!(matches!(
            config.validate(),
            Err(TaxiError::InvalidConfig(_))
        ));
    }
}
