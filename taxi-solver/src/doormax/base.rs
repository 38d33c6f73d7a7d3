use super::{Condition, DoorMaxConfig, EffectLearner};
use crate::planner::{PlanStats, Planner, Prediction};
use anyhow::Result;
use log::debug;
use ordered_float::OrderedFloat;
use rand::RngCore;
use taxi_core::{
    record::{Record, RecordValue},
    Configurable, Policy, Solver, Transition,
};
use taxi_env::{Action, Passenger, Position, State, StateIndexer, TaxiEnv};

/// Change of the passenger variable over one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassengerChange {
    /// Nothing happened.
    Unchanged,
    /// The passenger got into the taxi.
    PickedUp,
    /// The passenger was dropped at the destination.
    Delivered,
}

impl PassengerChange {
    /// Change between two states.
    pub fn between(before: &State, after: &State) -> Self {
        if after.is_delivered() && !before.is_delivered() {
            PassengerChange::Delivered
        } else if after.in_taxi() && !before.in_taxi() {
            PassengerChange::PickedUp
        } else {
            PassengerChange::Unchanged
        }
    }

    /// Passenger after applying the change to `state`.
    pub fn apply(self, state: &State) -> Passenger {
        match self {
            PassengerChange::Unchanged => state.passenger,
            PassengerChange::PickedUp => Passenger::InTaxi,
            PassengerChange::Delivered => Passenger::At(state.destination),
        }
    }
}

/// Learners of one action.
#[derive(Debug, Clone)]
struct ActionModel {
    dx: EffectLearner<i64>,
    dy: EffectLearner<i64>,
    passenger: EffectLearner<PassengerChange>,
    reward: Option<EffectLearner<OrderedFloat<f64>>>,
}

impl ActionModel {
    fn new(config: &DoorMaxConfig) -> Self {
        let k = config.known_count;
        let (dx, dy, passenger) = if config.generalize_unchanged {
            (
                EffectLearner::new(k),
                EffectLearner::new(k),
                EffectLearner::new(k),
            )
        } else {
            (
                EffectLearner::new(k).with_exact_effect(0),
                EffectLearner::new(k).with_exact_effect(0),
                EffectLearner::new(k).with_exact_effect(PassengerChange::Unchanged),
            )
        };
        Self {
            dx,
            dy,
            passenger,
            // Rewards are disjunctive over conditions, e.g. -10 for both
            // kinds of failed dropoff; generalized, they take several rules.
            reward: match (config.use_reward_learner, config.generalize_rewards) {
                (false, _) => None,
                (true, false) => Some(EffectLearner::exact(k)),
                (true, true) => Some(EffectLearner::new(k)),
            },
        }
    }

    fn num_rules(&self) -> usize {
        self.dx.rules().len()
            + self.dy.rules().len()
            + self.passenger.rules().len()
            + self.reward.as_ref().map_or(0, |r| r.rules().len())
    }
}

/// DoorMax on the taxi domain.
///
/// Each action has one [`EffectLearner`] per variable: the taxi coordinate
/// changes, the passenger change and, with
/// [`DoorMaxConfig::use_reward_learner`], the reward. A state-action pair is
/// modelled when every learner of the action has a trusted rule for the
/// [`Condition`] of the state; unmodelled pairs are optimistic as in R-max.
/// The whole model is rebuilt and replanned whenever a rule changes.
#[derive(Debug, Clone)]
pub struct DoorMax {
    config: DoorMaxConfig,
    indexer: StateIndexer,
    models: Vec<ActionModel>,
    planner: Planner,
    planned: bool,
    stats: PlanStats,
}

impl DoorMax {
    /// The planner.
    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// Replanning counters.
    pub fn plan_stats(&self) -> PlanStats {
        self.stats
    }

    /// The configuration.
    pub fn config(&self) -> &DoorMaxConfig {
        &self.config
    }

    /// Total number of rules over all learners.
    pub fn num_rules(&self) -> usize {
        self.models.iter().map(|m| m.num_rules()).sum()
    }

    /// Next state and reward predicted by the rules, `None` if unmodelled.
    pub fn predict(&self, env: &TaxiEnv, state: &State, action: Action) -> Option<(State, f64)> {
        let world = env.world();
        let c = Condition::of(world, state);
        let model = &self.models[action.index()];
        let dx = model.dx.predict(c)?;
        let dy = model.dy.predict(c)?;
        let change = model.passenger.predict(c)?;
        let reward = match &model.reward {
            Some(learner) => learner.predict(c)?.into_inner(),
            None => env.reward(state, action),
        };

        let x = state.taxi.x as i64 + dx;
        let y = state.taxi.y as i64 + dy;
        if x < 0 || y < 0 {
            return None;
        }
        let taxi = Position::new(x as usize, y as usize);
        if !world.contains(taxi) {
            return None;
        }
        let next = State {
            taxi,
            passenger: change.apply(state),
            destination: state.destination,
        };
        Some((next, reward))
    }

    fn rebuild(&mut self, env: &TaxiEnv) {
        for (s, state) in self.indexer.states().enumerate() {
            if state.is_delivered() {
                continue;
            }
            for a in Action::ALL.iter() {
                let prediction = match self.predict(env, &state, *a) {
                    Some((next, reward)) => Prediction::Known {
                        reward,
                        next: vec![(self.indexer.index(&next), 1.0)],
                    },
                    None => Prediction::Unknown,
                };
                self.planner.set(s, *a, prediction);
            }
        }
    }

    fn replan(&mut self, env: &TaxiEnv) -> Record {
        self.planned = true;
        self.rebuild(env);
        let mut record = self.planner.replan(&mut self.stats);
        record.insert("rules", RecordValue::Scalar(self.num_rules() as f32));
        record
    }
}

impl Configurable<TaxiEnv> for DoorMax {
    type Config = DoorMaxConfig;

    fn build(config: DoorMaxConfig, env: &TaxiEnv) -> Result<Self> {
        config.validate()?;
        let planner = Planner::new(env, config.planner_params(env))?;
        let models = Action::ALL
            .iter()
            .map(|_| ActionModel::new(&config))
            .collect();
        Ok(Self {
            indexer: env.indexer(),
            models,
            planner,
            config,
            planned: false,
            stats: PlanStats::default(),
        })
    }
}

impl Policy<TaxiEnv> for DoorMax {
    fn act(&self, _env: &TaxiEnv, obs: &State, _rng: &mut dyn RngCore) -> Action {
        self.planner.greedy(obs)
    }
}

impl Solver<TaxiEnv> for DoorMax {
    fn name(&self) -> &str {
        "doormax"
    }

    fn begin_trial(&mut self, env: &TaxiEnv, _obs: &State) {
        if !self.planned {
            self.replan(env);
        }
    }

    fn select_action(&mut self, env: &TaxiEnv, obs: &State, rng: &mut dyn RngCore) -> Action {
        self.act(env, obs, rng)
    }

    fn observe(&mut self, env: &TaxiEnv, transition: &Transition<TaxiEnv>) -> Result<Record> {
        let (obs, next_obs) = (&transition.obs, &transition.next_obs);
        if obs.is_delivered() {
            return Ok(Record::empty());
        }
        let c = Condition::of(env.world(), obs);
        let model = &mut self.models[transition.act.index()];
        let dx = next_obs.taxi.x as i64 - obs.taxi.x as i64;
        let dy = next_obs.taxi.y as i64 - obs.taxi.y as i64;

        let mut changed = model.dx.observe(c, dx)?;
        changed |= model.dy.observe(c, dy)?;
        changed |= model
            .passenger
            .observe(c, PassengerChange::between(obs, next_obs))?;
        if let Some(learner) = model.reward.as_mut() {
            changed |= learner.observe(c, OrderedFloat(transition.reward))?;
        }

        if changed {
            debug!(
                "{:?} at {} changed the rules, now {}",
                transition.act,
                c,
                self.num_rules()
            );
            Ok(self.replan(env))
        } else {
            Ok(Record::empty())
        }
    }
}
