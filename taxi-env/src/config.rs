//! Configuration of the taxi world and environment.
use crate::CostModel;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Side of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Towards `y - 1`.
    North,
    /// Towards `y + 1`.
    South,
    /// Towards `x + 1`.
    East,
    /// Towards `x - 1`.
    West,
}

/// A wall on one side of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallConfig {
    /// Column of the cell.
    pub x: usize,
    /// Row of the cell.
    pub y: usize,
    /// Side of the cell the wall is on.
    pub side: Side,
}

/// A named location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Name, such as `R`.
    pub name: String,
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

/// Structured description of a grid world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Number of columns.
    pub width: usize,

    /// Number of rows.
    pub height: usize,

    /// Named locations, in index order.
    pub locations: Vec<LocationConfig>,

    /// Interior walls.
    #[serde(default)]
    pub walls: Vec<WallConfig>,
}

fn loc(name: &str, x: usize, y: usize) -> LocationConfig {
    LocationConfig {
        name: name.to_string(),
        x,
        y,
    }
}

fn east_wall(x: usize, y: usize) -> WallConfig {
    WallConfig {
        x,
        y,
        side: Side::East,
    }
}

impl WorldConfig {
    /// The standard 5x5 taxi map.
    ///
    /// ```text
    /// +---------+
    /// |R: | : :G|
    /// | : | : : |
    /// | : : : : |
    /// | | : | : |
    /// |Y| : |B: |
    /// +---------+
    /// ```
    pub fn classic() -> Self {
        Self {
            width: 5,
            height: 5,
            locations: vec![loc("R", 0, 0), loc("G", 4, 0), loc("Y", 0, 4), loc("B", 3, 4)],
            walls: vec![
                east_wall(1, 0),
                east_wall(1, 1),
                east_wall(0, 3),
                east_wall(0, 4),
                east_wall(2, 3),
                east_wall(2, 4),
            ],
        }
    }

    /// A 3x3 map with four locations, small enough for exhaustive checks.
    ///
    /// ```text
    /// +-----+
    /// |R| :G|
    /// | : : |
    /// |Y:B: |
    /// +-----+
    /// ```
    pub fn small() -> Self {
        Self {
            width: 3,
            height: 3,
            locations: vec![loc("R", 0, 0), loc("G", 2, 0), loc("Y", 0, 2), loc("B", 1, 2)],
            walls: vec![east_wall(0, 0)],
        }
    }

    /// Constructs [`WorldConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`WorldConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Configuration of [`TaxiEnv`](crate::TaxiEnv).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TaxiConfig {
    /// World.
    pub world: WorldConfig,

    /// Rewards.
    #[serde(default)]
    pub costs: CostModel,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::classic()
    }
}

impl TaxiConfig {
    /// Sets the world.
    pub fn world(mut self, world: WorldConfig) -> Self {
        self.world = world;
        self
    }

    /// Sets the rewards.
    pub fn costs(mut self, costs: CostModel) -> Self {
        self.costs = costs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_world_config() -> Result<()> {
        let config = WorldConfig::classic();
        let dir = TempDir::new("world_config")?;
        let path = dir.path().join("world.yaml");
        config.save(&path)?;
        assert_eq!(WorldConfig::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_walls_default_to_empty() {
        let yaml = "width: 2\nheight: 1\nlocations:\n  - {name: A, x: 0, y: 0}\n  - {name: B, x: 1, y: 0}\n";
        let config: WorldConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.walls.is_empty());
        assert_eq!(config.locations[1].name, "B");
    }
}
