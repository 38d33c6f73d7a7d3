#![warn(missing_docs)]
//! Model-based exploration solvers for the taxi domain.
//!
//! The workspace consists of the following crates:
//!
//! * [taxi-core](taxi_core) provides the environment and solver traits, the
//!   trial and session harness, records and probe evaluation.
//! * [taxi-env](taxi_env) is the taxi domain on a configurable grid world.
//! * [taxi-solver](taxi_solver) has the solvers: random, Q-learning, RMax,
//!   factored RMax, DoorMax and MaxQ.
//! * `taxi` ties them together: a [`RunConfig`] describes a whole run, and
//!   [`run_all`] and [`replay`] execute it. The `run_taxi` example is the
//!   command-line entry point.
//!
//! ```rust
//! use taxi::{run_solver, RunConfig, SolverChoice};
//! use taxi_core::{Env, SessionConfig};
//! use taxi_env::{TaxiEnv, WorldConfig};
//!
//! let config = RunConfig::default()
//!     .world(WorldConfig::small())
//!     .session(SessionConfig::default().max_trials(5).max_trial_steps(20));
//! let env = TaxiEnv::build(&config.taxi_config()).unwrap();
//! let summary = run_solver(SolverChoice::Random, &config, &env).unwrap();
//! assert_eq!(summary.reports[0].n_trials(), 5);
//! ```
pub mod config;
mod run;
pub use config::{ReplayConfig, RunConfig, ScenarioConfig, SolverConfigs};
pub use run::{
    build_solver, replay, run_all, run_solver, BoxedSolver, SessionRow, SolverChoice,
    SolverSummary,
};
pub use taxi_core;
pub use taxi_env;
pub use taxi_solver;
