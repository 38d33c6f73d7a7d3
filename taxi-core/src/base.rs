//! Core abstractions shared by environments and solvers.
mod env;
mod policy;
mod solver;
mod step;
pub use env::Env;
pub use policy::{Configurable, Policy};
pub use solver::Solver;
pub use step::{Step, Transition};
use std::fmt::Debug;

/// A state of an environment.
///
/// States are plain values: environments never hold the current state, so a
/// state can be cloned, compared and replayed freely.
pub trait Obs: Clone + Debug + PartialEq {}

/// An action of an environment.
pub trait Act: Copy + Debug + PartialEq {}
