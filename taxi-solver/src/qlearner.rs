//! Tabular Q-learning.
mod base;
mod config;
pub use base::QLearner;
pub use config::QLearnerConfig;
