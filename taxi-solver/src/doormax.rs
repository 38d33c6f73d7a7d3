//! DoorMax: deterministic object-oriented R-max.
//!
//! For every action, the change of each state variable is learned as a list of
//! condition-effect rules over a few boolean features of the state (see
//! [`Condition`]). A rule learned from one cell applies to every cell with the
//! same features, which makes exploration much cheaper than with a tabular
//! model.
mod base;
mod condition;
mod config;
mod learner;
pub use base::{DoorMax, PassengerChange};
pub use condition::{Condition, Term};
pub use config::DoorMaxConfig;
pub use learner::{EffectLearner, Rule};
