//! Policy.
use super::Env;
use anyhow::Result;
use rand::RngCore;
use serde::de::DeserializeOwned;
use std::path::Path;

/// A policy on an environment.
///
/// Acting through a policy never changes what a solver has learned; it is the
/// view used by evaluators.
pub trait Policy<E: Env> {
    /// Returns the action the policy prefers in the given state.
    fn act(&self, env: &E, obs: &E::Obs, rng: &mut dyn RngCore) -> E::Act;
}

/// A solver or policy that can be constructed from a configuration.
pub trait Configurable<E: Env> {
    /// Configuration.
    type Config: Clone + DeserializeOwned;

    /// Builds the object for the given environment.
    fn build(config: Self::Config, env: &E) -> Result<Self>
    where
        Self: Sized;

    /// Builds the object from a YAML configuration file.
    fn build_from_path(path: impl AsRef<Path>, env: &E) -> Result<Self>
    where
        Self: Sized,
    {
        let file = std::fs::File::open(path)?;
        let rdr = std::io::BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Self::build(config, env)
    }
}

impl<E: Env, P: Policy<E> + ?Sized> Policy<E> for Box<P> {
    fn act(&self, env: &E, obs: &E::Obs, rng: &mut dyn RngCore) -> E::Act {
        (**self).act(env, obs, rng)
    }
}
