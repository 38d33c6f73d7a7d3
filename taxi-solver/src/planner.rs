//! Value iteration over a learned tabular model.
use log::{debug, trace, warn};
use taxi_core::{
    record::{Record, RecordValue},
    TaxiError,
};
use taxi_env::{Action, State, StateIndexer, TaxiEnv};

/// What a model predicts for one state-action pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// Not enough experience: planned as a self-loop paying `rmax`.
    Unknown,

    /// Expected reward and distribution over next state indices.
    Known {
        /// Expected reward.
        reward: f64,
        /// Next state indices with probabilities summing to one.
        next: Vec<(usize, f64)>,
    },
}

pub(crate) fn default_error_delta() -> f64 {
    1.0e-6
}

pub(crate) fn default_max_iterations() -> usize {
    10_000
}

/// Parameters shared by the model-based solvers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerParams {
    /// Discount factor, in `[0, 1)`.
    pub gamma: f64,
    /// Sweeps stop once no value changes by this much.
    pub error_delta: f64,
    /// Sweep cap.
    pub max_iterations: usize,
    /// Optimistic reward of unknown pairs.
    pub rmax: f64,
}

impl PlannerParams {
    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), TaxiError> {
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(TaxiError::InvalidConfig(format!(
                "gamma must be in [0, 1) for planning, got {}",
                self.gamma
            )));
        }
        if !(self.error_delta > 0.0) {
            return Err(TaxiError::InvalidConfig(format!(
                "error_delta must be positive, got {}",
                self.error_delta
            )));
        }
        if self.max_iterations == 0 {
            return Err(TaxiError::InvalidConfig(
                "max_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Replanning counters of a model-based solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanStats {
    /// Number of value iteration runs.
    pub replans: usize,
    /// Runs that hit the sweep cap.
    pub convergence_failures: usize,
}

/// A tabular model with its value function.
///
/// Terminal states keep value `0`. Non-terminal states start at the optimistic
/// `rmax / (1 - gamma)` and every [`Planner::plan`] starts from the values of
/// the previous one.
#[derive(Debug, Clone)]
pub struct Planner {
    params: PlannerParams,
    indexer: StateIndexer,
    terminal: Vec<bool>,
    model: Vec<Prediction>,
    values: Vec<f64>,
}

impl Planner {
    /// Creates a planner where every pair is unknown.
    pub fn new(env: &TaxiEnv, params: PlannerParams) -> Result<Self, TaxiError> {
        params.validate()?;
        let indexer = env.indexer();
        let n = indexer.num_states();
        let v_max = params.rmax / (1.0 - params.gamma);
        let terminal: Vec<bool> = indexer.states().map(|s| s.is_delivered()).collect();
        let values = terminal
            .iter()
            .map(|t| if *t { 0.0 } else { v_max })
            .collect();

        Ok(Self {
            params,
            indexer,
            terminal,
            model: vec![Prediction::Unknown; n * Action::COUNT],
            values,
        })
    }

    /// The state indexer.
    pub fn indexer(&self) -> &StateIndexer {
        &self.indexer
    }

    /// The parameters.
    pub fn params(&self) -> &PlannerParams {
        &self.params
    }

    /// Sets the prediction of a pair.
    pub fn set(&mut self, s: usize, a: Action, prediction: Prediction) {
        self.model[s * Action::COUNT + a.index()] = prediction;
    }

    /// Prediction of a pair.
    pub fn prediction(&self, s: usize, a: Action) -> &Prediction {
        &self.model[s * Action::COUNT + a.index()]
    }

    /// Number of known pairs.
    pub fn num_known(&self) -> usize {
        self.model
            .iter()
            .filter(|p| matches!(p, Prediction::Known { .. }))
            .count()
    }

    /// Value of state index `s`.
    pub fn value(&self, s: usize) -> f64 {
        self.values[s]
    }

    /// One-step lookahead value of a pair.
    pub fn q_value(&self, s: usize, a: Action) -> f64 {
        if self.terminal[s] {
            return 0.0;
        }
        match self.prediction(s, a) {
            Prediction::Unknown => self.params.rmax + self.params.gamma * self.values[s],
            Prediction::Known { reward, next } => {
                reward
                    + self.params.gamma
                        * next.iter().map(|(s_, p)| p * self.values[*s_]).sum::<f64>()
            }
        }
    }

    fn backup(&self, s: usize) -> f64 {
        Action::ALL
            .iter()
            .map(|a| self.q_value(s, *a))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Greedy action of a state, ties broken by action priority.
    pub fn greedy(&self, state: &State) -> Action {
        let s = self.indexer.index(state);
        let mut best = Action::ALL[0];
        let mut best_q = self.q_value(s, best);
        for a in Action::ALL.iter().skip(1) {
            let q = self.q_value(s, *a);
            if q > best_q {
                best = *a;
                best_q = q;
            }
        }
        best
    }

    /// Largest Bellman residual over all states.
    pub fn residual(&self) -> f64 {
        (0..self.values.len())
            .filter(|s| !self.terminal[*s])
            .map(|s| (self.backup(s) - self.values[s]).abs())
            .fold(0.0, f64::max)
    }

    /// Runs in-place value iteration until no value moves by `error_delta`.
    ///
    /// Returns the number of sweeps. Hitting `max_iterations` restores the
    /// previous values and returns [`TaxiError::ConvergenceFailure`].
    pub fn plan(&mut self) -> Result<usize, TaxiError> {
        let snapshot = self.values.clone();
        let mut delta = f64::INFINITY;

        for iteration in 1..=self.params.max_iterations {
            delta = 0.0;
            for s in 0..self.values.len() {
                if self.terminal[s] {
                    continue;
                }
                let v = self.backup(s);
                delta = delta.max((v - self.values[s]).abs());
                self.values[s] = v;
            }
            if delta < self.params.error_delta {
                trace!("Value iteration converged after {} sweeps", iteration);
                return Ok(iteration);
            }
        }

        self.values = snapshot;
        Err(TaxiError::ConvergenceFailure {
            iterations: self.params.max_iterations,
            residual: delta,
        })
    }

    /// Runs [`Planner::plan`] and updates `stats`.
    ///
    /// A convergence failure is logged and counted, the previous values stay
    /// in place. The returned record holds the counters and the sweeps.
    pub fn replan(&mut self, stats: &mut PlanStats) -> Record {
        stats.replans += 1;
        let mut record = Record::from_scalar("replans", stats.replans as f32);
        match self.plan() {
            Ok(sweeps) => {
                debug!(
                    "Replanned with {} known pairs in {} sweeps",
                    self.num_known(),
                    sweeps
                );
                record.insert("plan_sweeps", RecordValue::Scalar(sweeps as f32));
            }
            Err(e) => {
                warn!("{}, keeping the previous plan", e);
                stats.convergence_failures += 1;
            }
        }
        record.insert(
            "convergence_failures",
            RecordValue::Scalar(stats.convergence_failures as f32),
        );
        record
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

    fn params() -> PlannerParams {
        PlannerParams {
            gamma: 0.9,
            error_delta: 1e-6,
            max_iterations: 10_000,
            rmax: 0.0,
        }
    }

    /// Fills the planner with the true dynamics of the environment.
    fn exact_model(env: &TaxiEnv, planner: &mut Planner) {
        let indexer = env.indexer();
        for (s, state) in indexer.states().enumerate() {
            for a in Action::ALL.iter() {
                let step = env.step(&state, a);
                planner.set(
                    s,
                    *a,
                    Prediction::Known {
                        reward: step.reward,
                        next: vec![(indexer.index(&step.obs), 1.0)],
                    },
                );
            }
        }
    }

    #[test]
    fn test_residual_below_error_delta() {
        let env = small_env();
        let mut planner = Planner::new(&env, params()).unwrap();
        exact_model(&env, &mut planner);
        planner.plan().unwrap();
        assert!(planner.residual() < params().error_delta);
    }

    #[test]
    fn test_values_of_exact_model() {
        let env = small_env();
        let mut planner = Planner::new(&env, params()).unwrap();
        exact_model(&env, &mut planner);
        planner.plan().unwrap();

        // One dropoff from delivery: the dropoff pays 0.
        let ready = State::build(env.world(), (0, 0), None, "R").unwrap();
        assert!(planner.value(planner.indexer().index(&ready)).abs() < 1e-5);
        assert_eq!(planner.greedy(&ready), Action::Dropoff);

        // Two steps away: -1 for the move, then 0.
        let near = State::build(env.world(), (0, 1), None, "R").unwrap();
        assert!((planner.value(planner.indexer().index(&near)) + 1.0).abs() < 1e-5);
        assert_eq!(planner.greedy(&near), Action::North);
    }

    #[test]
    fn test_unknown_pairs_are_optimistic() {
        let env = small_env();
        let mut p = params();
        p.rmax = 1.0;
        let mut planner = Planner::new(&env, p).unwrap();
        planner.plan().unwrap();
        let state = State::build(env.world(), (1, 1), Some("Y"), "R").unwrap();
        let s = planner.indexer().index(&state);
        assert!((planner.value(s) - 10.0).abs() < 1e-4);
        // All actions tie, so the first one wins.
        assert_eq!(planner.greedy(&state), Action::North);
    }

    #[test]
    fn test_convergence_failure_keeps_values() {
        let env = small_env();
        let mut p = params();
        p.max_iterations = 1;
        let mut planner = Planner::new(&env, p).unwrap();
        exact_model(&env, &mut planner);
        let before: Vec<f64> = (0..planner.indexer().num_states())
            .map(|s| planner.value(s))
            .collect();

        assert!(matches!(
            planner.plan(),
            Err(TaxiError::ConvergenceFailure { iterations: 1, .. })
        ));
        for (s, v) in before.iter().enumerate() {
            assert_eq!(planner.value(s), *v);
        }
    }

    #[test]
    fn test_replan_counts_failures() {
        let env = small_env();
        let mut p = params();
        p.max_iterations = 1;
        let mut planner = Planner::new(&env, p).unwrap();
        exact_model(&env, &mut planner);
        let mut stats = PlanStats::default();
        let record = planner.replan(&mut stats);
        assert_eq!(
            stats,
            PlanStats {
                replans: 1,
                convergence_failures: 1
            }
        );
        assert_eq!(record.get_scalar("convergence_failures").unwrap(), 1.0);
        assert!(record.get("plan_sweeps").is_none());
    }

    #[test]
    fn test_gamma_one_rejected() {
        let env = small_env();
        let mut p = params();
        p.gamma = 1.0;
        assert!(matches!(
            Planner::new(&env, p),
            Err(TaxiError::InvalidConfig(_))
        ));
    }
}
