//! State of the taxi domain.
use crate::{GridWorld, Position};
use serde::{Deserialize, Serialize};
use std::fmt;
use taxi_core::{Obs, TaxiError};

/// Where the passenger is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Passenger {
    /// At the named location with this index.
    At(usize),
    /// Riding in the taxi.
    InTaxi,
}

/// A full state: taxi cell, passenger and destination.
///
/// The state is terminal once the passenger is at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    /// Taxi cell.
    pub taxi: Position,
    /// Passenger.
    pub passenger: Passenger,
    /// Index of the destination location.
    pub destination: usize,
}

impl Obs for State {}

impl State {
    /// Builds a start state from location names.
    ///
    /// `passenger` is `None` when the passenger starts in the taxi. Fails with
    /// [`TaxiError::InvalidScenario`] for cells outside the grid, unknown
    /// names, and a passenger waiting at the destination.
    pub fn build(
        world: &GridWorld,
        taxi: (usize, usize),
        passenger: Option<&str>,
        destination: &str,
    ) -> Result<Self, TaxiError> {
        let lookup = |name: &str| {
            world
                .location_index(name)
                .ok_or_else(|| TaxiError::InvalidScenario(format!("unknown location {}", name)))
        };
        let passenger = match passenger {
            Some(name) => Passenger::At(lookup(name)?),
            None => Passenger::InTaxi,
        };
        let state = Self {
            taxi: taxi.into(),
            passenger,
            destination: lookup(destination)?,
        };
        state.validate(world)?;
        Ok(state)
    }

    /// Checks that the state is a legal, non-terminal start state.
    pub fn validate(&self, world: &GridWorld) -> Result<(), TaxiError> {
        if !world.contains(self.taxi) {
            return Err(TaxiError::InvalidScenario(format!(
                "taxi at {} is outside the {}x{} grid",
                self.taxi,
                world.width(),
                world.height()
            )));
        }
        if self.destination >= world.num_locations() {
            return Err(TaxiError::InvalidScenario(format!(
                "unknown destination {}",
                self.destination
            )));
        }
        match self.passenger {
            Passenger::At(i) if i >= world.num_locations() => Err(TaxiError::InvalidScenario(
                format!("unknown passenger location {}", i),
            )),
            Passenger::At(i) if i == self.destination => Err(TaxiError::InvalidScenario(format!(
                "passenger already at destination {}",
                world.location_name(i)
            ))),
            _ => Ok(()),
        }
    }

    /// Returns `true` once the passenger has been delivered.
    pub fn is_delivered(&self) -> bool {
        self.passenger == Passenger::At(self.destination)
    }

    /// Returns `true` while the passenger rides in the taxi.
    pub fn in_taxi(&self) -> bool {
        self.passenger == Passenger::InTaxi
    }

    /// Returns `true` if the taxi is on the cell of a waiting passenger.
    pub fn at_passenger(&self, world: &GridWorld) -> bool {
        match self.passenger {
            Passenger::At(i) => world.location_position(i) == Some(self.taxi),
            Passenger::InTaxi => false,
        }
    }

    /// Returns `true` if the taxi is on the destination cell.
    pub fn at_destination(&self, world: &GridWorld) -> bool {
        world.location_position(self.destination) == Some(self.taxi)
    }

    /// Renders the state with location names.
    pub fn describe(&self, world: &GridWorld) -> String {
        let passenger = match self.passenger {
            Passenger::At(i) => world.location_name(i).to_string(),
            Passenger::InTaxi => "taxi".to_string(),
        };
        format!(
            "taxi {}, passenger {}, destination {}",
            self.taxi,
            passenger,
            world.location_name(self.destination)
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.passenger {
            Passenger::At(i) => write!(
                f,
                "taxi {}, passenger #{}, destination #{}",
                self.taxi, i, self.destination
            ),
            Passenger::InTaxi => write!(
                f,
                "taxi {}, passenger in taxi, destination #{}",
                self.taxi, self.destination
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        let world = GridWorld::classic().unwrap();
        let state = State::build(&world, (2, 2), Some("Y"), "R").unwrap();
        assert_eq!(state.taxi, Position::new(2, 2));
        assert_eq!(state.passenger, Passenger::At(2));
        assert_eq!(state.destination, 0);
        assert_eq!(
            state.describe(&world),
            "taxi (2, 2), passenger Y, destination R"
        );

        let riding = State::build(&world, (0, 0), None, "B").unwrap();
        assert!(riding.in_taxi());
        assert!(!riding.at_passenger(&world));
    }

    #[test]
    fn test_invalid_scenarios() {
        let world = GridWorld::classic().unwrap();
        for result in vec![
            State::build(&world, (5, 0), Some("Y"), "R"),
            State::build(&world, (0, 0), Some("X"), "R"),
            State::build(&world, (0, 0), Some("Y"), "Q"),
            State::build(&world, (0, 0), Some("Y"), "Y"),
        ] {
            assert!(matches!(result, Err(TaxiError::InvalidScenario(_))));
        }
    }

    #[test]
    fn test_predicates() {
        let world = GridWorld::classic().unwrap();
        let state = State::build(&world, (0, 4), Some("Y"), "R").unwrap();
        assert!(state.at_passenger(&world));
        assert!(!state.at_destination(&world));
        assert!(!state.is_delivered());

        let delivered = State {
            taxi: Position::new(0, 0),
            passenger: Passenger::At(0),
            destination: 0,
        };
        assert!(delivered.is_delivered());
        assert!(delivered.validate(&world).is_err());
    }
}
