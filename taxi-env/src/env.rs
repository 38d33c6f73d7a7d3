//! The taxi environment.
use crate::{Action, CostModel, GridWorld, Passenger, State, StateIndexer, TaxiConfig};
use anyhow::Result;
use rand::{Rng, RngCore};
use taxi_core::{Env, Step};

/// The taxi domain as an [`Env`].
///
/// The environment is immutable. It holds the world and the rewards, and maps
/// a state and an action to the next state.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxiEnv {
    world: GridWorld,
    costs: CostModel,
}

impl TaxiEnv {
    /// Creates the environment from a built world.
    pub fn new(world: GridWorld, costs: CostModel) -> Self {
        Self { world, costs }
    }

    /// The world.
    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    /// The rewards.
    pub fn costs(&self) -> &CostModel {
        &self.costs
    }

    /// Indexer over the states of the world.
    pub fn indexer(&self) -> StateIndexer {
        StateIndexer::new(&self.world)
    }

    /// Reward of applying `action` in `state`.
    pub fn reward(&self, state: &State, action: Action) -> f64 {
        self.transition(state, action).1
    }

    /// Largest reward of any step.
    pub fn max_reward(&self) -> f64 {
        self.costs.max_reward()
    }

    /// Next state and reward.
    fn transition(&self, state: &State, action: Action) -> (State, f64) {
        if state.is_delivered() {
            return (*state, 0.0);
        }
        let costs = &self.costs;
        match action {
            Action::North | Action::South | Action::East | Action::West => {
                let mut next = *state;
                next.taxi = self.world.move_taxi(state.taxi, action);
                (next, costs.movement)
            }
            Action::Pickup => {
                if state.at_passenger(&self.world) {
                    let mut next = *state;
                    next.passenger = Passenger::InTaxi;
                    (next, costs.movement)
                } else {
                    (*state, costs.miss_pickup)
                }
            }
            Action::Dropoff => {
                if !state.in_taxi() {
                    (*state, costs.empty_dropoff)
                } else if state.at_destination(&self.world) {
                    let mut next = *state;
                    next.passenger = Passenger::At(state.destination);
                    (next, costs.success_dropoff)
                } else {
                    (*state, costs.miss_dropoff)
                }
            }
        }
    }
}

impl Env for TaxiEnv {
    type Config = TaxiConfig;
    type Obs = State;
    type Act = Action;

    fn build(config: &Self::Config) -> Result<Self> {
        let world = GridWorld::build(&config.world)?;
        Ok(Self::new(world, config.costs))
    }

    fn reset(&self, obs: &State) -> Result<State> {
        obs.validate(&self.world)?;
        Ok(*obs)
    }

    /// Draws a taxi cell, a passenger location and a different destination,
    /// each uniformly.
    fn reset_random(&self, rng: &mut dyn RngCore) -> State {
        let n = self.world.num_locations();
        let x = rng.gen_range(0..self.world.width());
        let y = rng.gen_range(0..self.world.height());
        let passenger = rng.gen_range(0..n);
        let mut destination = rng.gen_range(0..n - 1);
        if destination >= passenger {
            destination += 1;
        }
        State {
            taxi: (x, y).into(),
            passenger: Passenger::At(passenger),
            destination,
        }
    }

    fn step(&self, obs: &State, act: &Action) -> Step<Self> {
        let (next, reward) = self.transition(obs, *act);
        Step::new(next, *act, reward, next.is_delivered())
    }

    fn is_terminal(&self, obs: &State) -> bool {
        obs.is_delivered()
    }
}
