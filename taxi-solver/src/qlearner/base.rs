use super::QLearnerConfig;
use anyhow::Result;
use rand::{Rng, RngCore};
use taxi_core::{record::Record, Configurable, Policy, Solver, Transition};
use taxi_env::{Action, State, StateIndexer, TaxiEnv};

/// Tabular Q-learning with epsilon-greedy exploration.
///
/// The table starts at zero. After each transition,
/// `Q[s, a] += alpha * (r + gamma * max_a' Q[s', a'] - Q[s, a])`, where the
/// max term is dropped when `s'` is terminal.
#[derive(Debug, Clone)]
pub struct QLearner {
    config: QLearnerConfig,
    indexer: StateIndexer,
    q: Vec<f64>,
}

impl QLearner {
    /// Q-value of a pair.
    pub fn q_value(&self, state: &State, action: Action) -> f64 {
        self.q[self.indexer.index(state) * Action::COUNT + action.index()]
    }

    fn max_q(&self, s: usize) -> f64 {
        self.q[s * Action::COUNT..(s + 1) * Action::COUNT]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Greedy action, ties broken by action priority.
    pub fn best_action(&self, state: &State) -> Action {
        let s = self.indexer.index(state);
        let row = &self.q[s * Action::COUNT..(s + 1) * Action::COUNT];
        let mut best = 0;
        for (i, q) in row.iter().enumerate().skip(1) {
            if *q > row[best] {
                best = i;
            }
        }
        Action::ALL[best]
    }
}

impl Configurable<TaxiEnv> for QLearner {
    type Config = QLearnerConfig;

    fn build(config: QLearnerConfig, env: &TaxiEnv) -> Result<Self> {
        config.validate()?;
        let indexer = env.indexer();
        Ok(Self {
            q: vec![0.0; indexer.num_states() * Action::COUNT],
            indexer,
            config,
        })
    }
}

impl Policy<TaxiEnv> for QLearner {
    fn act(&self, _env: &TaxiEnv, obs: &State, _rng: &mut dyn RngCore) -> Action {
        self.best_action(obs)
    }
}

impl Solver<TaxiEnv> for QLearner {
    fn name(&self) -> &str {
        "qlearner"
    }

    fn select_action(&mut self, _env: &TaxiEnv, obs: &State, rng: &mut dyn RngCore) -> Action {
        if rng.gen::<f64>() < self.config.epsilon {
            Action::ALL[rng.gen_range(0..Action::COUNT)]
        } else {
            self.best_action(obs)
        }
    }

    fn observe(&mut self, _env: &TaxiEnv, transition: &Transition<TaxiEnv>) -> Result<Record> {
        let s = self.indexer.index(&transition.obs);
        let future = if transition.is_terminated {
            0.0
        } else {
            self.max_q(self.indexer.index(&transition.next_obs))
        };
        let i = s * Action::COUNT + transition.act.index();
        let target = transition.reward + self.config.gamma * future;
        self.q[i] += self.config.alpha * (target - self.q[i]);
        Ok(Record::empty())
    }
}
