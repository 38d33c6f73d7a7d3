//! Dense numbering of states.
use crate::{GridWorld, Passenger, Position, State};

/// Bijection between states of a world and `0..num_states`.
///
/// The passenger takes `num_locations + 1` values, the last one standing for
/// the taxi.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateIndexer {
    width: usize,
    height: usize,
    num_locations: usize,
}

impl StateIndexer {
    /// Creates the indexer of a world.
    pub fn new(world: &GridWorld) -> Self {
        Self {
            width: world.width(),
            height: world.height(),
            num_locations: world.num_locations(),
        }
    }

    /// Number of states.
    pub fn num_states(&self) -> usize {
        self.width * self.height * (self.num_locations + 1) * self.num_locations
    }

    /// Index of a state.
    pub fn index(&self, state: &State) -> usize {
        let passenger = match state.passenger {
            Passenger::At(i) => i,
            Passenger::InTaxi => self.num_locations,
        };
        let cell = state.taxi.y * self.width + state.taxi.x;
        (cell * (self.num_locations + 1) + passenger) * self.num_locations + state.destination
    }

    /// State of an index, `None` past [`StateIndexer::num_states`].
    pub fn state(&self, index: usize) -> Option<State> {
        if index >= self.num_states() {
            return None;
        }
        let destination = index % self.num_locations;
        let rest = index / self.num_locations;
        let passenger = rest % (self.num_locations + 1);
        let cell = rest / (self.num_locations + 1);
        Some(State {
            taxi: Position::new(cell % self.width, cell / self.width),
            passenger: if passenger == self.num_locations {
                Passenger::InTaxi
            } else {
                Passenger::At(passenger)
            },
            destination,
        })
    }

    /// Every state in index order.
    pub fn states(&self) -> impl Iterator<Item = State> + '_ {
        (0..self.num_states()).filter_map(move |i| self.state(i))
    }
}
