#![warn(missing_docs)]
//! Trial, session and evaluation harness for tabular reinforcement learning.
//!
//! Environments implement [`Env`] as pure functions of a state and an action.
//! Solvers implement [`Solver`], learning from [`Transition`]s produced by a
//! [`Trial`]. A [`Session`] runs trials against one solver under one seed,
//! and a [`SessionRunner`] runs many sessions, optionally in parallel.
//! Greedy behaviour is evaluated through the [`Policy`] view with
//! [`ProbeEvaluator`] and [`attempt`].
pub mod error;
pub mod evaluator;
pub mod record;
pub mod util;

mod base;
pub use base::{Act, Configurable, Env, Obs, Policy, Solver, Step, Transition};

mod trial;
pub use trial::{Trial, TrialOutcome, TrialStatus};

mod session;
pub use session::{Session, SessionConfig, SessionReport};

mod runner;
pub use runner::{RunnerConfig, SessionRunner};

mod shared_solver;
pub use shared_solver::SharedSolver;

pub use error::TaxiError;
pub use evaluator::{attempt, Attempt, Evaluator, Probe, ProbeEvaluator, ProbeResult};
pub use util::{MeasureDistribution, StopFlag};
