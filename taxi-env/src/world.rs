//! Grid world: dimensions, walls and named locations.
use crate::{
    config::{Side, WorldConfig},
    Action,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};
use taxi_core::TaxiError;

/// A cell of the grid, `y` growing southwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

impl Position {
    /// Creates a position.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl From<(usize, usize)> for Position {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A named location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Name.
    pub name: String,
    /// Cell.
    pub position: Position,
}

/// An immutable rectangular grid with walls and named locations.
///
/// Every cell is reachable from every other cell; [`GridWorld::build`]
/// rejects worlds where walls cut the grid apart.
#[derive(Debug, Clone, PartialEq)]
pub struct GridWorld {
    width: usize,
    height: usize,
    // Wall between (x, y) and (x + 1, y).
    east_walls: Vec<bool>,
    // Wall between (x, y) and (x, y + 1).
    south_walls: Vec<bool>,
    locations: Vec<Location>,
}

impl GridWorld {
    /// Builds a world from its description.
    pub fn build(config: &WorldConfig) -> Result<Self, TaxiError> {
        let (width, height) = (config.width, config.height);
        if width == 0 || height == 0 {
            return Err(TaxiError::InvalidWorld(format!(
                "empty grid {}x{}",
                width, height
            )));
        }
        if config.locations.len() < 2 {
            return Err(TaxiError::InvalidWorld(
                "at least two locations are needed".to_string(),
            ));
        }

        let mut locations: Vec<Location> = Vec::with_capacity(config.locations.len());
        for l in config.locations.iter() {
            let position = Position::new(l.x, l.y);
            if l.x >= width || l.y >= height {
                return Err(TaxiError::InvalidWorld(format!(
                    "location {} at {} is outside the grid",
                    l.name, position
                )));
            }
            if let Some(other) = locations
                .iter()
                .find(|o| o.name == l.name || o.position == position)
            {
                return Err(TaxiError::InvalidWorld(format!(
                    "location {} clashes with location {}",
                    l.name, other.name
                )));
            }
            locations.push(Location {
                name: l.name.clone(),
                position,
            });
        }

        let mut world = Self {
            width,
            height,
            east_walls: vec![false; width * height],
            south_walls: vec![false; width * height],
            locations,
        };

        for wall in config.walls.iter() {
            if wall.x >= width || wall.y >= height {
                return Err(TaxiError::InvalidWorld(format!(
                    "wall at ({}, {}) is outside the grid",
                    wall.x, wall.y
                )));
            }
            // Walls on the outer boundary are implied and need no entry.
            match wall.side {
                Side::East if wall.x + 1 < width => {
                    world.east_walls[wall.y * width + wall.x] = true
                }
                Side::West if wall.x > 0 => {
                    world.east_walls[wall.y * width + wall.x - 1] = true
                }
                Side::South if wall.y + 1 < height => {
                    world.south_walls[wall.y * width + wall.x] = true
                }
                Side::North if wall.y > 0 => {
                    world.south_walls[(wall.y - 1) * width + wall.x] = true
                }
                _ => {}
            }
        }

        let reached = world.count_reachable(Position::new(0, 0));
        if reached != width * height {
            return Err(TaxiError::InvalidWorld(format!(
                "only {} of {} cells are connected",
                reached,
                width * height
            )));
        }
        debug!(
            "Built {}x{} world with {} locations",
            width,
            height,
            world.locations.len()
        );

        Ok(world)
    }

    /// The standard 5x5 taxi world.
    pub fn classic() -> Result<Self, TaxiError> {
        Self::build(&WorldConfig::classic())
    }

    fn count_reachable(&self, from: Position) -> usize {
        let mut seen = vec![false; self.width * self.height];
        let mut queue = VecDeque::new();
        seen[from.y * self.width + from.x] = true;
        queue.push_back(from);
        let mut count = 0;
        while let Some(p) = queue.pop_front() {
            count += 1;
            for a in Action::MOVES.iter() {
                let q = self.move_taxi(p, *a);
                if !seen[q.y * self.width + q.x] {
                    seen[q.y * self.width + q.x] = true;
                    queue.push_back(q);
                }
            }
        }
        count
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    pub fn num_cells(&self) -> usize {
        self.width * self.height
    }

    /// Named locations in index order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Number of named locations.
    pub fn num_locations(&self) -> usize {
        self.locations.len()
    }

    /// Cell of location `i`.
    pub fn location_position(&self, i: usize) -> Option<Position> {
        self.locations.get(i).map(|l| l.position)
    }

    /// Index of the location called `name`.
    pub fn location_index(&self, name: &str) -> Option<usize> {
        self.locations.iter().position(|l| l.name == name)
    }

    /// Name of location `i`, `?` if there is none.
    pub fn location_name(&self, i: usize) -> &str {
        self.locations.get(i).map_or("?", |l| l.name.as_str())
    }

    /// Returns `true` if the position lies inside the grid.
    pub fn contains(&self, p: Position) -> bool {
        p.x < self.width && p.y < self.height
    }

    /// Returns `true` if a movement from `p` runs into a wall or the grid edge.
    ///
    /// Pickup and dropoff are never blocked.
    pub fn is_blocked(&self, p: Position, action: Action) -> bool {
        let i = p.y * self.width + p.x;
        match action {
            Action::North => p.y == 0 || self.south_walls[i - self.width],
            Action::South => p.y + 1 >= self.height || self.south_walls[i],
            Action::East => p.x + 1 >= self.width || self.east_walls[i],
            Action::West => p.x == 0 || self.east_walls[i - 1],
            Action::Pickup | Action::Dropoff => false,
        }
    }

    /// Cell reached by applying `action` at `p`; blocked moves stay put.
    pub fn move_taxi(&self, p: Position, action: Action) -> Position {
        if !action.is_move() || self.is_blocked(p, action) {
            return p;
        }
        let (dx, dy) = action.delta();
        Position::new((p.x as i64 + dx) as usize, (p.y as i64 + dy) as usize)
    }
}
