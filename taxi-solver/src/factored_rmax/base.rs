use super::FactoredRMaxConfig;
use crate::planner::{PlanStats, Planner, Prediction};
use anyhow::Result;
use itertools::iproduct;
use rand::RngCore;
use taxi_core::{
    record::{Record, RecordValue},
    Configurable, Policy, Solver, Transition,
};
use taxi_env::{Action, GridWorld, Passenger, Position, State, StateIndexer, TaxiEnv};

/// Status of the passenger as modelled by the passenger factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassengerStatus {
    /// Waiting at a location other than the destination.
    Waiting,
    /// Riding in the taxi.
    InTaxi,
    /// Dropped at the destination.
    Delivered,
}

impl PassengerStatus {
    const COUNT: usize = 3;
    const ALL: [PassengerStatus; 3] = [
        PassengerStatus::Waiting,
        PassengerStatus::InTaxi,
        PassengerStatus::Delivered,
    ];

    /// Status of the passenger in a state.
    pub fn of(state: &State) -> Self {
        match state.passenger {
            Passenger::InTaxi => PassengerStatus::InTaxi,
            Passenger::At(_) if state.is_delivered() => PassengerStatus::Delivered,
            Passenger::At(_) => PassengerStatus::Waiting,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Default)]
struct Counts {
    visits: usize,
    sum: f64,
    outcomes: Vec<(usize, usize)>,
}

/// Counts of one factor, per context.
#[derive(Debug, Clone)]
struct Factor {
    threshold: usize,
    counts: Vec<Counts>,
}

impl Factor {
    fn new(threshold: usize, num_contexts: usize) -> Self {
        Self {
            threshold,
            counts: vec![Counts::default(); num_contexts],
        }
    }

    fn is_known(&self, ctx: usize) -> bool {
        self.counts[ctx].visits >= self.threshold
    }

    fn num_known(&self) -> usize {
        (0..self.counts.len()).filter(|c| self.is_known(*c)).count()
    }

    /// Adds an observation, returns `true` when the context just became known.
    fn add(&mut self, ctx: usize, outcome: usize, value: f64) -> bool {
        if self.is_known(ctx) {
            return false;
        }
        let c = &mut self.counts[ctx];
        c.visits += 1;
        c.sum += value;
        match c.outcomes.iter_mut().find(|(o, _)| *o == outcome) {
            Some((_, n)) => *n += 1,
            None => c.outcomes.push((outcome, 1)),
        }
        c.visits == self.threshold
    }

    fn distribution(&self, ctx: usize) -> Option<Vec<(usize, f64)>> {
        if !self.is_known(ctx) {
            return None;
        }
        let c = &self.counts[ctx];
        let n = c.visits as f64;
        Some(c.outcomes.iter().map(|(o, k)| (*o, *k as f64 / n)).collect())
    }

    fn mean(&self, ctx: usize) -> Option<f64> {
        if !self.is_known(ctx) {
            return None;
        }
        let c = &self.counts[ctx];
        Some(c.sum / c.visits as f64)
    }
}

/// R-max where the model is learned per state variable.
///
/// The taxi position depends on the taxi cell and the action. The passenger
/// status and the reward depend on the status, whether the taxi is on the
/// passenger, whether it is on the destination, and the action. The
/// destination never changes. A pair of the full state is known once every
/// factor context it falls in is known, so one observation informs every
/// state sharing the same contexts.
#[derive(Debug, Clone)]
pub struct FactoredRMax {
    indexer: StateIndexer,
    width: usize,
    taxi: Factor,
    passenger: Factor,
    reward: Factor,
    planner: Planner,
    planned: bool,
    stats: PlanStats,
}

impl FactoredRMax {
    /// The planner.
    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// Replanning counters.
    pub fn plan_stats(&self) -> PlanStats {
        self.stats
    }

    /// Known contexts of the taxi, passenger and reward factors.
    pub fn num_known_contexts(&self) -> [usize; 3] {
        [
            self.taxi.num_known(),
            self.passenger.num_known(),
            self.reward.num_known(),
        ]
    }

    fn cell(&self, p: Position) -> usize {
        p.y * self.width + p.x
    }

    fn taxi_context(&self, state: &State, action: Action) -> usize {
        self.cell(state.taxi) * Action::COUNT + action.index()
    }

    fn passenger_context(&self, world: &GridWorld, state: &State, action: Action) -> usize {
        let status = PassengerStatus::of(state).index();
        let at_passenger = state.at_passenger(world) as usize;
        let at_destination = state.at_destination(world) as usize;
        ((status * 2 + at_passenger) * 2 + at_destination) * Action::COUNT + action.index()
    }

    /// Full state from a taxi cell and a passenger status.
    fn compose(&self, state: &State, cell: usize, status: PassengerStatus) -> Option<State> {
        let passenger = match (status, state.passenger) {
            (PassengerStatus::Waiting, Passenger::At(i)) => Passenger::At(i),
            (PassengerStatus::Waiting, Passenger::InTaxi) => return None,
            (PassengerStatus::InTaxi, _) => Passenger::InTaxi,
            (PassengerStatus::Delivered, _) => Passenger::At(state.destination),
        };
        Some(State {
            taxi: Position::new(cell % self.width, cell / self.width),
            passenger,
            destination: state.destination,
        })
    }

    fn joint(&self, world: &GridWorld, state: &State, action: Action) -> Prediction {
        let ctx = self.passenger_context(world, state, action);
        let (taxi, passenger, reward) = match (
            self.taxi.distribution(self.taxi_context(state, action)),
            self.passenger.distribution(ctx),
            self.reward.mean(ctx),
        ) {
            (Some(t), Some(p), Some(r)) => (t, p, r),
            _ => return Prediction::Unknown,
        };

        let mut next = Vec::with_capacity(taxi.len() * passenger.len());
        for ((cell, p_cell), (status, p_status)) in iproduct!(taxi.iter(), passenger.iter()) {
            let status = PassengerStatus::ALL[*status];
            match self.compose(state, *cell, status) {
                Some(s) => next.push((self.indexer.index(&s), p_cell * p_status)),
                None => return Prediction::Unknown,
            }
        }
        Prediction::Known { reward, next }
    }

    fn rebuild(&mut self, world: &GridWorld) {
        for (s, state) in self.indexer.states().enumerate() {
            if state.is_delivered() {
                continue;
            }
            for a in Action::ALL.iter() {
                let prediction = self.joint(world, &state, *a);
                self.planner.set(s, *a, prediction);
            }
        }
    }

    fn replan(&mut self, world: &GridWorld) -> Record {
        self.planned = true;
        self.rebuild(world);
        let mut record = self.planner.replan(&mut self.stats);
        record.insert(
            "known_contexts",
            RecordValue::Array1(
                self.num_known_contexts()
                    .iter()
                    .map(|n| *n as f32)
                    .collect(),
            ),
        );
        record
    }
}

impl Configurable<TaxiEnv> for FactoredRMax {
    type Config = FactoredRMaxConfig;

    fn build(config: FactoredRMaxConfig, env: &TaxiEnv) -> Result<Self> {
        let [taxi, passenger, reward] = config.thresholds()?;
        let planner = Planner::new(env, config.planner_params(env))?;
        let world = env.world();
        let contexts = PassengerStatus::COUNT * 2 * 2 * Action::COUNT;
        Ok(Self {
            indexer: env.indexer(),
            width: world.width(),
            taxi: Factor::new(taxi, world.num_cells() * Action::COUNT),
            passenger: Factor::new(passenger, contexts),
            reward: Factor::new(reward, contexts),
            planner,
            planned: false,
            stats: PlanStats::default(),
        })
    }
}

impl Policy<TaxiEnv> for FactoredRMax {
    fn act(&self, _env: &TaxiEnv, obs: &State, _rng: &mut dyn RngCore) -> Action {
        self.planner.greedy(obs)
    }
}

impl Solver<TaxiEnv> for FactoredRMax {
    fn name(&self) -> &str {
        "factored_rmax"
    }

    fn begin_trial(&mut self, env: &TaxiEnv, _obs: &State) {
        if !self.planned {
            self.replan(env.world());
        }
    }

    fn select_action(&mut self, env: &TaxiEnv, obs: &State, rng: &mut dyn RngCore) -> Action {
        self.act(env, obs, rng)
    }

    fn observe(&mut self, env: &TaxiEnv, transition: &Transition<TaxiEnv>) -> Result<Record> {
        let (obs, next_obs, act) = (&transition.obs, &transition.next_obs, transition.act);
        if obs.is_delivered() {
            return Ok(Record::empty());
        }
        let world = env.world();
        let taxi_ctx = self.taxi_context(obs, act);
        let ctx = self.passenger_context(world, obs, act);
        let next_cell = self.cell(next_obs.taxi);
        let next_status = PassengerStatus::of(next_obs).index();

        let mut changed = self.taxi.add(taxi_ctx, next_cell, 0.0);
        changed |= self.passenger.add(ctx, next_status, 0.0);
        changed |= self.reward.add(ctx, 0, transition.reward);

        if changed {
            Ok(self.replan(world))
        } else {
            Ok(Record::empty())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxi_core::Env;
    use taxi_env::{TaxiConfig, WorldConfig};

    fn small_env() -> TaxiEnv {
        TaxiEnv::build(&TaxiConfig::default().world(WorldConfig::small())).unwrap()
    }

    fn observe(solver: &mut FactoredRMax, env: &TaxiEnv, state: State, act: Action) -> Record {
        let t = Transition::from_step(state, env.step(&state, &act));
        solver.observe(env, &t).unwrap()
    }

    #[test]
    fn test_one_observation_informs_every_matching_state() -> Result<()> {
        let env = small_env();
        let mut solver = FactoredRMax::build(FactoredRMaxConfig::default().gamma(0.9), &env)?;
        let s = State::build(env.world(), (1, 1), Some("Y"), "R")?;
        observe(&mut solver, &env, s, Action::North);

        // (1, 1) is no location: every waiting passenger and destination
        // falls in the same contexts.
        assert_eq!(solver.planner().num_known(), 12);

        let other = State::build(env.world(), (1, 1), Some("G"), "B")?;
        let indexer = env.indexer();
        let expected = State::build(env.world(), (1, 0), Some("G"), "B")?;
        assert_eq!(
            solver
                .planner()
                .prediction(indexer.index(&other), Action::North),
            &Prediction::Known {
                reward: -1.0,
                next: vec![(indexer.index(&expected), 1.0)]
            }
        );
        Ok(())
    }

    #[test]
    fn test_pair_known_only_when_every_factor_is_known() -> Result<()> {
        let env = small_env();
        let config = FactoredRMaxConfig::default().gamma(0.9).taxi_known_count(2);
        let mut solver = FactoredRMax::build(config, &env)?;
        let s = State::build(env.world(), (1, 1), Some("Y"), "R")?;

        observe(&mut solver, &env, s, Action::North);
        assert_eq!(solver.num_known_contexts(), [0, 1, 1]);
        assert_eq!(solver.planner().num_known(), 0);

        let record = observe(&mut solver, &env, s, Action::North);
        assert_eq!(solver.num_known_contexts(), [1, 1, 1]);
        assert_eq!(solver.planner().num_known(), 12);
        assert_eq!(record.get_array1("known_contexts")?, vec![1.0, 1.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_dropoff_maps_to_delivered() -> Result<()> {
        let env = small_env();
        let mut solver = FactoredRMax::build(FactoredRMaxConfig::default().gamma(0.9), &env)?;
        // Successful dropoff at R, then a missed one at G to learn the cell.
        let at_r = State::build(env.world(), (0, 0), None, "R")?;
        observe(&mut solver, &env, at_r, Action::Dropoff);
        let miss = State::build(env.world(), (2, 0), None, "R")?;
        observe(&mut solver, &env, miss, Action::Dropoff);

        let at_g = State::build(env.world(), (2, 0), None, "G")?;
        let delivered = State {
            taxi: Position::new(2, 0),
            passenger: Passenger::At(1),
            destination: 1,
        };
        let indexer = env.indexer();
        assert_eq!(
            solver
                .planner()
                .prediction(indexer.index(&at_g), Action::Dropoff),
            &Prediction::Known {
                reward: 0.0,
                next: vec![(indexer.index(&delivered), 1.0)]
            }
        );
        Ok(())
    }
}
