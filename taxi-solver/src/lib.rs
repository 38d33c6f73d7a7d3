#![warn(missing_docs)]
//! Solvers for the taxi domain.
//!
//! Every solver implements [`taxi_core::Solver`] over [`taxi_env::TaxiEnv`]
//! and is built from its configuration with [`taxi_core::Configurable`].
//!
//! * [`RandomSolver`] acts uniformly.
//! * [`QLearner`] is tabular Q-learning.
//! * [`RMax`] learns a tabular model and explores optimistically.
//! * [`FactoredRMax`] learns one model per state variable.
//! * [`DoorMax`] learns condition-effect rules per action and variable.
//! * [`MaxQ`] learns over the Root/Get/Put/Navigate task hierarchy.
//!
//! The model-based solvers plan with value iteration in [`planner`].
pub mod doormax;
pub mod factored_rmax;
pub mod maxq;
pub mod planner;
pub mod qlearner;
pub mod random;
pub mod rmax;
pub use doormax::{DoorMax, DoorMaxConfig};
pub use factored_rmax::{FactoredRMax, FactoredRMaxConfig};
pub use maxq::{MaxQ, MaxQConfig};
pub use qlearner::{QLearner, QLearnerConfig};
pub use random::RandomSolver;
pub use rmax::{RMax, RMaxConfig};
