#![warn(missing_docs)]
//! The taxi domain.
//!
//! A taxi moves on a grid with walls, picks up a passenger waiting at one of
//! the named locations and drops them off at another one. [`TaxiEnv`]
//! implements [`taxi_core::Env`] on top of an immutable [`GridWorld`].
//!
//! ```rust
//! use taxi_core::Env;
//! use taxi_env::{Action, State, TaxiConfig, TaxiEnv};
//!
//! let env = TaxiEnv::build(&TaxiConfig::default()).unwrap();
//! let state = State::build(env.world(), (0, 4), Some("Y"), "R").unwrap();
//! let step = env.step(&state, &Action::Pickup);
//! assert!(step.obs.in_taxi());
//! ```
mod actions;
pub mod config;
mod costs;
mod env;
mod state;
mod state_indexer;
mod world;
pub use actions::Action;
pub use config::{TaxiConfig, WorldConfig};
pub use costs::CostModel;
pub use env::TaxiEnv;
pub use state::{Passenger, State};
pub use state_indexer::StateIndexer;
pub use world::{GridWorld, Location, Position};
