use super::RMaxConfig;
use crate::planner::{PlanStats, Planner, Prediction};
use anyhow::Result;
use rand::RngCore;
use taxi_core::{record::Record, Configurable, Policy, Solver, TaxiError, Transition};
use taxi_env::{Action, State, StateIndexer, TaxiEnv};

/// Experience of one state-action pair.
#[derive(Debug, Clone, Default)]
struct PairCounts {
    visits: usize,
    reward_sum: f64,
    // Next state index and count, in order of first occurrence.
    next: Vec<(usize, usize)>,
}

impl PairCounts {
    fn add(&mut self, reward: f64, next: usize) {
        self.visits += 1;
        self.reward_sum += reward;
        match self.next.iter_mut().find(|(s, _)| *s == next) {
            Some((_, c)) => *c += 1,
            None => self.next.push((next, 1)),
        }
    }

    fn prediction(&self) -> Prediction {
        let n = self.visits as f64;
        Prediction::Known {
            reward: self.reward_sum / n,
            next: self.next.iter().map(|(s, c)| (*s, *c as f64 / n)).collect(),
        }
    }
}

/// R-max over the full state.
///
/// Every pair is modelled from its own visits. A pair becomes known after
/// `known_count` visits and its model is then frozen. Until then the planner
/// treats it as a self-loop paying `rmax`, which draws the greedy policy
/// towards it.
#[derive(Debug, Clone)]
pub struct RMax {
    config: RMaxConfig,
    indexer: StateIndexer,
    counts: Vec<PairCounts>,
    planner: Planner,
    planned: bool,
    stats: PlanStats,
}

impl RMax {
    /// Number of known pairs.
    pub fn num_known(&self) -> usize {
        self.planner.num_known()
    }

    /// Visits of a pair, frozen once it is known.
    pub fn visits(&self, state: &State, action: Action) -> usize {
        self.counts[self.indexer.index(state) * Action::COUNT + action.index()].visits
    }

    /// The planner.
    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// Replanning counters.
    pub fn plan_stats(&self) -> PlanStats {
        self.stats
    }

    fn replan(&mut self) -> Record {
        self.planned = true;
        self.planner.replan(&mut self.stats)
    }
}

impl Configurable<TaxiEnv> for RMax {
    type Config = RMaxConfig;

    fn build(config: RMaxConfig, env: &TaxiEnv) -> Result<Self> {
        if config.known_count == 0 {
            return Err(
                TaxiError::InvalidConfig("known_count must be positive".to_string()).into(),
            );
        }
        let planner = Planner::new(env, config.planner_params(env))?;
        let indexer = env.indexer();
        Ok(Self {
            counts: vec![PairCounts::default(); indexer.num_states() * Action::COUNT],
            indexer,
            planner,
            config,
            planned: false,
            stats: PlanStats::default(),
        })
    }
}

impl Policy<TaxiEnv> for RMax {
    fn act(&self, _env: &TaxiEnv, obs: &State, _rng: &mut dyn RngCore) -> Action {
        self.planner.greedy(obs)
    }
}

impl Solver<TaxiEnv> for RMax {
    fn name(&self) -> &str {
        "rmax"
    }

    fn begin_trial(&mut self, _env: &TaxiEnv, _obs: &State) {
        if !self.planned {
            self.replan();
        }
    }

    fn select_action(&mut self, env: &TaxiEnv, obs: &State, rng: &mut dyn RngCore) -> Action {
        self.act(env, obs, rng)
    }

    fn observe(&mut self, _env: &TaxiEnv, transition: &Transition<TaxiEnv>) -> Result<Record> {
        let s = self.indexer.index(&transition.obs);
        let a = transition.act;
        let counts = &mut self.counts[s * Action::COUNT + a.index()];
        if counts.visits >= self.config.known_count {
            return Ok(Record::empty());
        }

        counts.add(transition.reward, self.indexer.index(&transition.next_obs));
        if counts.visits == self.config.known_count {
            let prediction = counts.prediction();
            self.planner.set(s, a, prediction);
            return Ok(self.replan());
        }
        Ok(Record::empty())
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

    #[test]
    fn test_known_after_known_count_visits() -> Result<()> {
        let env = small_env();
        let mut rmax = RMax::build(RMaxConfig::default().gamma(0.9).known_count(3), &env)?;
        let s = State::build(env.world(), (1, 1), Some("Y"), "R")?;
        let t = Transition::from_step(s, env.step(&s, &Action::East));

        let mut known = vec![];
        for _ in 0..5 {
            rmax.observe(&env, &t)?;
            known.push(rmax.num_known());
        }
        assert_eq!(known, vec![0, 0, 1, 1, 1]);
        assert_eq!(rmax.visits(&s, Action::East), 3);
        Ok(())
    }

    #[test]
    fn test_replans_only_when_pair_becomes_known() -> Result<()> {
        let env = small_env();
        let mut rmax = RMax::build(RMaxConfig::default().gamma(0.9).known_count(2), &env)?;
        let s = State::build(env.world(), (1, 1), Some("Y"), "R")?;
        rmax.begin_trial(&env, &s);
        assert_eq!(rmax.plan_stats().replans, 1);
        rmax.begin_trial(&env, &s);
        assert_eq!(rmax.plan_stats().replans, 1);

        let t = Transition::from_step(s, env.step(&s, &Action::North));
        assert!(rmax.observe(&env, &t)?.is_empty());
        let record = rmax.observe(&env, &t)?;
        assert_eq!(record.get_scalar("replans")?, 2.0);
        assert!(rmax.observe(&env, &t)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_known_pair_loses_optimism() -> Result<()> {
        let env = small_env();
        let mut rmax = RMax::build(RMaxConfig::default().gamma(0.9), &env)?;
        let s = State::build(env.world(), (1, 1), Some("Y"), "R")?;
        rmax.begin_trial(&env, &s);
        let mut rng = rand::thread_rng();
        assert_eq!(rmax.select_action(&env, &s, &mut rng), Action::North);

        // North from (1, 1) now known to cost -1; South is still optimistic.
        let t = Transition::from_step(s, env.step(&s, &Action::North));
        rmax.observe(&env, &t)?;
        assert_eq!(rmax.select_action(&env, &s, &mut rng), Action::South);
        Ok(())
    }
}
