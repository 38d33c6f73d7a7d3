//! R-max over a factored model of the taxi dynamics.
mod base;
mod config;
pub use base::{FactoredRMax, PassengerStatus};
pub use config::FactoredRMaxConfig;
