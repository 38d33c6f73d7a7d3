//! MAXQ-Q over the taxi task hierarchy.
mod base;
mod config;
pub use base::{MaxQ, Task};
pub use config::MaxQConfig;
