//! R-max: optimistic model-based exploration over the full state.
mod base;
mod config;
pub use base::RMax;
pub use config::RMaxConfig;
