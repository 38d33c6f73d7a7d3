use std::fmt;
use taxi_env::{Action, GridWorld, State};

const FULL: u8 = (1 << Condition::NUM_BITS) - 1;
const SYMBOLS: [char; Condition::NUM_BITS] = ['N', 'S', 'E', 'W', 'T', 'P', 'D'];

/// Boolean features of a state.
///
/// Bit `0` to `3` tell whether a wall blocks the taxi towards north, south,
/// east and west. Bit `4` is set when the passenger is in the taxi, bit `5`
/// when the taxi is on the waiting passenger and bit `6` when it is on the
/// destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Condition(u8);

impl Condition {
    /// Number of features.
    pub const NUM_BITS: usize = 7;
    /// Wall towards north.
    pub const WALL_NORTH: u8 = 1;
    /// Wall towards south.
    pub const WALL_SOUTH: u8 = 1 << 1;
    /// Wall towards east.
    pub const WALL_EAST: u8 = 1 << 2;
    /// Wall towards west.
    pub const WALL_WEST: u8 = 1 << 3;
    /// Passenger in the taxi.
    pub const IN_TAXI: u8 = 1 << 4;
    /// Taxi on the waiting passenger.
    pub const AT_PASSENGER: u8 = 1 << 5;
    /// Taxi on the destination.
    pub const AT_DESTINATION: u8 = 1 << 6;

    /// Condition from raw bits; bits past [`Condition::NUM_BITS`] are dropped.
    pub fn new(bits: u8) -> Self {
        Self(bits & FULL)
    }

    /// Features of a state.
    pub fn of(world: &GridWorld, state: &State) -> Self {
        let flags = [
            world.is_blocked(state.taxi, Action::North),
            world.is_blocked(state.taxi, Action::South),
            world.is_blocked(state.taxi, Action::East),
            world.is_blocked(state.taxi, Action::West),
            state.in_taxi(),
            state.at_passenger(world),
            state.at_destination(world),
        ];
        let bits = flags
            .iter()
            .enumerate()
            .fold(0, |acc, (i, f)| if *f { acc | 1 << i } else { acc });
        Self(bits)
    }

    /// Raw bits.
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit of `flag` is set.
    pub fn has(&self, flag: u8) -> bool {
        self.0 & flag == flag
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Term::exact(*self), f)
    }
}

/// A conjunction over condition bits, each bit required set, required unset,
/// or free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Term {
    mask: u8,
    value: u8,
}

impl Term {
    /// The term matching `c` only.
    pub fn exact(c: Condition) -> Self {
        Self {
            mask: FULL,
            value: c.0,
        }
    }

    /// Term from fixed bits and their values.
    pub fn new(mask: u8, value: u8) -> Self {
        let mask = mask & FULL;
        Self {
            mask,
            value: value & mask,
        }
    }

    /// Bits fixed by the term.
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Returns `true` if `c` agrees with every fixed bit.
    pub fn matches(&self, c: Condition) -> bool {
        c.0 & self.mask == self.value
    }

    /// The most specific term matching both `self` and `c`: bits on which
    /// they disagree become free.
    pub fn generalize(&self, c: Condition) -> Self {
        let diff = (c.0 & self.mask) ^ self.value;
        Self::new(self.mask & !diff, self.value)
    }

    /// Number of fixed bits.
    pub fn specificity(&self) -> u32 {
        self.mask.count_ones()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, symbol) in SYMBOLS.iter().enumerate() {
            let bit = 1 << i;
            if self.mask & bit == 0 {
                write!(f, "*")?;
            } else if self.value & bit == 0 {
                write!(f, "{}", symbol.to_ascii_lowercase())?;
            } else {
                write!(f, "{}", symbol)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxi_env::{Position, WorldConfig};

    #[test]
    fn test_generalize() {
        let t = Term::exact(Condition::new(0b001));
        assert_eq!(t.specificity(), 7);
        let t = t.generalize(Condition::new(0b011));
        assert_eq!(t.specificity(), 6);
        assert!(t.matches(Condition::new(0b001)));
        assert!(t.matches(Condition::new(0b011)));
        assert!(!t.matches(Condition::new(0b000)));
        assert_eq!(t.generalize(Condition::new(0b011)), t);
    }

    #[test]
    fn test_condition_of_state() {
        let world = GridWorld::build(&WorldConfig::small()).unwrap();
        // R at (0, 0) with a wall to the east, waiting passenger there.
        let state = State::build(&world, (0, 0), Some("R"), "G").unwrap();
        let c = Condition::of(&world, &state);
        assert_eq!(
            c.bits(),
            Condition::WALL_NORTH
                | Condition::WALL_EAST
                | Condition::WALL_WEST
                | Condition::AT_PASSENGER
        );
        assert_eq!(format!("{}", c), "NsEWtPd");

        let mut carried = state;
        carried.passenger = taxi_env::Passenger::InTaxi;
        carried.taxi = Position::new(2, 0);
        let c = Condition::of(&world, &carried);
        assert!(c.has(Condition::IN_TAXI | Condition::AT_DESTINATION));
        assert!(!c.has(Condition::AT_PASSENGER));
    }
}
