//! Actions of the taxi.
use serde::{Deserialize, Serialize};
use taxi_core::Act;

/// An action of the taxi.
///
/// The declaration order is the priority used to break every tie between
/// equally valued actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    /// Moves up, towards `y = 0`.
    North,
    /// Moves down.
    South,
    /// Moves right.
    East,
    /// Moves left, towards `x = 0`.
    West,
    /// Picks the passenger up.
    Pickup,
    /// Drops the passenger off.
    Dropoff,
}

impl Act for Action {}

impl Action {
    /// Number of actions.
    pub const COUNT: usize = 6;

    /// Every action in priority order.
    pub const ALL: [Action; 6] = [
        Action::North,
        Action::South,
        Action::East,
        Action::West,
        Action::Pickup,
        Action::Dropoff,
    ];

    /// The four movements in priority order.
    pub const MOVES: [Action; 4] = [Action::North, Action::South, Action::East, Action::West];

    /// Position of the action in [`Action::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Inverse of [`Action::index`].
    pub fn from_index(i: usize) -> Option<Action> {
        Action::ALL.get(i).copied()
    }

    /// Returns `true` for the four movements.
    pub fn is_move(&self) -> bool {
        matches!(
            self,
            Action::North | Action::South | Action::East | Action::West
        )
    }

    /// Coordinate change of a movement, `(0, 0)` for the other actions.
    pub fn delta(&self) -> (i64, i64) {
        match self {
            Action::North => (0, -1),
            Action::South => (0, 1),
            Action::East => (1, 0),
            Action::West => (-1, 0),
            Action::Pickup | Action::Dropoff => (0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for (i, a) in Action::ALL.iter().enumerate() {
            assert_eq!(a.index(), i);
            assert_eq!(Action::from_index(i), Some(*a));
        }
        assert_eq!(Action::from_index(Action::COUNT), None);
    }

    #[test]
    fn test_priority_order() {
        assert!(Action::North < Action::South);
        assert!(Action::West < Action::Pickup);
        assert!(Action::Pickup < Action::Dropoff);
    }
}
