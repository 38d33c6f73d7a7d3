//! Configuration of a whole run.
use crate::SolverChoice;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use taxi_core::{Probe, RunnerConfig, SessionConfig, TaxiError};
use taxi_env::{CostModel, GridWorld, State, TaxiConfig, WorldConfig};
use taxi_solver::{DoorMaxConfig, FactoredRMaxConfig, MaxQConfig, QLearnerConfig, RMaxConfig};

/// A start state given by location names, with a step budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Taxi cell as `[x, y]`.
    pub taxi: (usize, usize),

    /// Location the passenger waits at, or nothing when riding in the taxi.
    #[serde(default)]
    pub passenger: Option<String>,

    /// Destination location.
    pub destination: String,

    /// Steps allowed to deliver the passenger.
    pub max_steps: usize,
}

impl ScenarioConfig {
    /// Creates a scenario with a waiting passenger.
    pub fn new(taxi: (usize, usize), passenger: &str, destination: &str, max_steps: usize) -> Self {
        Self {
            taxi,
            passenger: Some(passenger.to_string()),
            destination: destination.to_string(),
            max_steps,
        }
    }

    /// Resolves the location names against `world`.
    pub fn state(&self, world: &GridWorld) -> Result<State, TaxiError> {
        State::build(
            world,
            self.taxi,
            self.passenger.as_deref(),
            &self.destination,
        )
    }

    /// Builds the probe of this scenario.
    pub fn probe(&self, world: &GridWorld) -> Result<Probe<State>, TaxiError> {
        Ok(Probe::new(self.state(world)?, self.max_steps))
    }
}

/// Replay of one scenario by a solver trained for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Solver to train and replay.
    pub solver: SolverChoice,

    /// Start state and step budget of the replay.
    pub scenario: ScenarioConfig,
}

/// Solvers of a run; a solver runs when its entry is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverConfigs {
    /// Runs [`RandomSolver`](taxi_solver::RandomSolver).
    #[serde(default)]
    pub random: bool,

    /// Configuration of [`QLearner`](taxi_solver::QLearner).
    #[serde(default)]
    pub qlearner: Option<QLearnerConfig>,

    /// Configuration of [`RMax`](taxi_solver::RMax).
    #[serde(default)]
    pub rmax: Option<RMaxConfig>,

    /// Configuration of [`FactoredRMax`](taxi_solver::FactoredRMax).
    #[serde(default)]
    pub factored_rmax: Option<FactoredRMaxConfig>,

    /// Configuration of [`DoorMax`](taxi_solver::DoorMax).
    #[serde(default)]
    pub doormax: Option<DoorMaxConfig>,

    /// Configuration of [`MaxQ`](taxi_solver::MaxQ).
    #[serde(default)]
    pub maxq: Option<MaxQConfig>,
}

impl SolverConfigs {
    /// The solvers to run, in a fixed order.
    pub fn enabled(&self) -> Vec<SolverChoice> {
        let mut choices = vec![];
        if self.random {
            choices.push(SolverChoice::Random);
        }
        if self.qlearner.is_some() {
            choices.push(SolverChoice::QLearner);
        }
        if self.rmax.is_some() {
            choices.push(SolverChoice::RMax);
        }
        if self.factored_rmax.is_some() {
            choices.push(SolverChoice::FactoredRMax);
        }
        if self.doormax.is_some() {
            choices.push(SolverChoice::DoorMax);
        }
        if self.maxq.is_some() {
            choices.push(SolverChoice::MaxQ);
        }
        choices
    }
}

/// Configuration of a run: the world, how sessions look, which solvers run,
/// which probes they are checked with and what is replayed at the end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// World; the classic map if not given.
    #[serde(default)]
    pub world: WorldConfig,

    /// Rewards.
    #[serde(default)]
    pub costs: CostModel,

    /// Shape of every session.
    #[serde(default)]
    pub session: SessionConfig,

    /// Number of sessions, seeds and workers.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Solvers to run.
    #[serde(default)]
    pub solvers: SolverConfigs,

    /// Probes evaluated during and after every session.
    #[serde(default)]
    pub probes: Vec<ScenarioConfig>,

    /// Scenario replayed after the run.
    #[serde(default)]
    pub replay: Option<ReplayConfig>,
}

impl RunConfig {
    /// Sets the world.
    pub fn world(mut self, v: WorldConfig) -> Self {
        self.world = v;
        self
    }

    /// Sets the rewards.
    pub fn costs(mut self, v: CostModel) -> Self {
        self.costs = v;
        self
    }

    /// Sets the session configuration.
    pub fn session(mut self, v: SessionConfig) -> Self {
        self.session = v;
        self
    }

    /// Sets the runner configuration.
    pub fn runner(mut self, v: RunnerConfig) -> Self {
        self.runner = v;
        self
    }

    /// Sets the solvers.
    pub fn solvers(mut self, v: SolverConfigs) -> Self {
        self.solvers = v;
        self
    }

    /// Adds a probe.
    pub fn probe(mut self, v: ScenarioConfig) -> Self {
        self.probes.push(v);
        self
    }

    /// Sets the replay.
    pub fn replay(mut self, v: ReplayConfig) -> Self {
        self.replay = Some(v);
        self
    }

    /// Configuration of the environment.
    pub fn taxi_config(&self) -> TaxiConfig {
        TaxiConfig::default()
            .world(self.world.clone())
            .costs(self.costs)
    }

    /// Resolves every probe against `world`.
    pub fn build_probes(&self, world: &GridWorld) -> Result<Vec<Probe<State>>, TaxiError> {
        self.probes.iter().map(|p| p.probe(world)).collect()
    }

    /// Constructs [`RunConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RunConfig`].
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
    fn test_serde_run_config() -> Result<()> {
        let config = RunConfig::default()
            .world(WorldConfig::small())
            .solvers(SolverConfigs {
                rmax: Some(RMaxConfig::default().gamma(0.9).rmax(1.0)),
                doormax: Some(DoorMaxConfig::default()),
                ..Default::default()
            })
            .probe(ScenarioConfig::new((1, 1), "Y", "R", 6))
            .replay(ReplayConfig {
                solver: SolverChoice::RMax,
                scenario: ScenarioConfig::new((2, 2), "B", "Y", 4),
            });

        let dir = TempDir::new("run_config")?;
        let path = dir.path().join("run_config.yaml");
        println!("{:?}", path);

        config.save(&path)?;
        let config_ = RunConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_minimal_yaml() -> Result<()> {
        let yaml = r#"
solvers:
  random: true
  maxq:
    alpha: 0.2
    gamma: 0.5
    epsilon: 0.1
probes:
  - taxi: [2, 2]
    passenger: Y
    destination: R
    max_steps: 10
"#;
        let config: RunConfig = serde_yaml::from_str(yaml)?;
        assert_eq!(config.world, WorldConfig::classic());
        assert_eq!(config.costs, CostModel::default());
        assert_eq!(
            config.solvers.enabled(),
            vec![SolverChoice::Random, SolverChoice::MaxQ]
        );
        assert!(config.replay.is_none());

        let world = GridWorld::build(&config.world)?;
        let probes = config.build_probes(&world)?;
        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].max_steps, 10);
        Ok(())
    }

    #[test]
    fn test_probe_with_unknown_location() -> Result<()> {
        let world = GridWorld::classic()?;
        let config = RunConfig::default().probe(ScenarioConfig::new((0, 0), "Q", "R", 5));
        match config.build_probes(&world) {
            Err(TaxiError::InvalidScenario(_)) => {}
            r => panic!("unexpected {:?}", r),
        }
        Ok(())
    }

    #[test]
    fn test_passenger_in_taxi() -> Result<()> {
        let world = GridWorld::classic()?;
        let scenario = ScenarioConfig {
            taxi: (0, 1),
            passenger: None,
            destination: "R".to_string(),
            max_steps: 2,
        };
        assert!(scenario.state(&world)?.in_taxi());
        Ok(())
    }
}
