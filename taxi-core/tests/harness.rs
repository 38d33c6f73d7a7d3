use anyhow::Result;
use rand::{Rng, RngCore};
use std::fmt;
use taxi_core::{
    attempt,
    record::{BufferedRecorder, NullRecorder, Record},
    Act, Env, Obs, Policy, Probe, RunnerConfig, Session, SessionConfig, SessionRunner,
    SharedSolver, Solver, Step, StopFlag, TaxiError, Trial, TrialStatus, Transition,
};
use test_log::test;

/// Positions `0..len` on a line; the last one is terminal.
struct Line {
    len: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Pos(usize);

impl Obs for Pos {}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Move {
    Left,
    Right,
}

impl Act for Move {}

impl Env for Line {
    type Config = usize;
    type Obs = Pos;
    type Act = Move;

    fn build(config: &usize) -> Result<Self> {
        Ok(Self { len: *config })
    }

    fn reset(&self, obs: &Pos) -> Result<Pos> {
        if obs.0 + 1 >= self.len {
            return Err(TaxiError::InvalidScenario(format!("{:?}", obs)).into());
        }
        Ok(*obs)
    }

    fn reset_random(&self, rng: &mut dyn RngCore) -> Pos {
        Pos(rng.gen_range(0..self.len - 1))
    }

    fn step(&self, obs: &Pos, act: &Move) -> Step<Self> {
        if self.is_terminal(obs) {
            return Step::new(*obs, *act, 0.0, true);
        }
        let next = match act {
            Move::Left => Pos(obs.0.saturating_sub(1)),
            Move::Right => Pos(obs.0 + 1),
        };
        Step::new(next, *act, -1.0, self.is_terminal(&next))
    }

    fn is_terminal(&self, obs: &Pos) -> bool {
        obs.0 + 1 == self.len
    }
}

struct AlwaysRight;

impl Policy<Line> for AlwaysRight {
    fn act(&self, _env: &Line, _obs: &Pos, _rng: &mut dyn RngCore) -> Move {
        Move::Right
    }
}

impl Solver<Line> for AlwaysRight {
    fn name(&self) -> &str {
        "always_right"
    }

    fn select_action(&mut self, env: &Line, obs: &Pos, rng: &mut dyn RngCore) -> Move {
        self.act(env, obs, rng)
    }

    fn observe(&mut self, _env: &Line, _transition: &Transition<Line>) -> Result<Record> {
        Ok(Record::empty())
    }
}

/// Walks randomly and counts what it saw.
#[derive(Default)]
struct RandomWalk {
    observed: usize,
    trials: usize,
}

impl Policy<Line> for RandomWalk {
    fn act(&self, _env: &Line, _obs: &Pos, rng: &mut dyn RngCore) -> Move {
        if rng.gen_bool(0.5) {
            Move::Left
        } else {
            Move::Right
        }
    }
}

impl Solver<Line> for RandomWalk {
    fn name(&self) -> &str {
        "random_walk"
    }

    fn begin_trial(&mut self, _env: &Line, _obs: &Pos) {
        self.trials += 1;
    }

    fn select_action(&mut self, env: &Line, obs: &Pos, rng: &mut dyn RngCore) -> Move {
        self.act(env, obs, rng)
    }

    fn observe(&mut self, _env: &Line, _transition: &Transition<Line>) -> Result<Record> {
        self.observed += 1;
        Ok(Record::from_scalar("observed", self.observed as f32))
    }
}

#[test]
fn test_trial_terminates() -> Result<()> {
    let env = Line::build(&5)?;
    let mut rng = rand::thread_rng();
    let outcome = Trial::new(&env, &Pos(0), 10)?.run(&mut AlwaysRight, &mut rng, |_| {})?;

    assert_eq!(outcome.status, TrialStatus::Terminated);
    assert_eq!(outcome.steps, 4);
    assert_eq!(outcome.reward, -4.0);
    Ok(())
}

#[test]
fn test_trial_step_capped() -> Result<()> {
    let env = Line::build(&5)?;
    let mut rng = rand::thread_rng();
    let mut trial = Trial::new(&env, &Pos(0), 2)?;
    assert_eq!(trial.status(), TrialStatus::Created);
    trial.step(&mut AlwaysRight, &mut rng)?;
    assert_eq!(trial.status(), TrialStatus::Running);
    trial.step(&mut AlwaysRight, &mut rng)?;
    assert_eq!(trial.status(), TrialStatus::StepCapped);
    assert_eq!(trial.obs(), &Pos(2));

    // Finished trials ignore further steps.
    trial.step(&mut AlwaysRight, &mut rng)?;
    assert_eq!(trial.steps(), 2);
    Ok(())
}

#[test]
fn test_trial_cancelled() -> Result<()> {
    let env = Line::build(&5)?;
    let stop = StopFlag::new();
    stop.stop();
    let mut rng = rand::thread_rng();
    let outcome = Trial::new(&env, &Pos(0), 10)?
        .with_stop_flag(stop)
        .run(&mut AlwaysRight, &mut rng, |_| {})?;

    assert_eq!(outcome.status, TrialStatus::Cancelled);
    assert_eq!(outcome.steps, 0);
    Ok(())
}

#[test]
fn test_terminal_start_rejected() -> Result<()> {
    let env = Line::build(&5)?;
    let err = Trial::new(&env, &Pos(4), 10).err().unwrap();
    assert!(matches!(
        err.downcast_ref::<TaxiError>(),
        Some(TaxiError::InvalidScenario(_))
    ));
    Ok(())
}

#[test]
fn test_session_is_reproducible() -> Result<()> {
    let env = Line::build(&6)?;
    let session = Session::build(SessionConfig::default().max_trials(20).max_trial_steps(30));

    let mut a = RandomWalk::default();
    let mut b = RandomWalk::default();
    let ra = session.run(&env, &mut a, 7, &mut NullRecorder::new())?;
    let rb = session.run(&env, &mut b, 7, &mut NullRecorder::new())?;

    assert_eq!(ra.outcomes, rb.outcomes);
    assert_eq!(ra.total_reward(), rb.total_reward());
    assert_eq!(a.observed, ra.total_steps());
    assert_eq!(a.trials, 20);

    let mut c = RandomWalk::default();
    let rc = session.run(&env, &mut c, 8, &mut NullRecorder::new())?;
    assert_ne!(ra.outcomes, rc.outcomes);
    Ok(())
}

#[test]
fn test_session_records_every_trial() -> Result<()> {
    let env = Line::build(&4)?;
    let session = Session::build(
        SessionConfig::default()
            .max_trials(5)
            .max_trial_steps(10)
            .flush_record_interval(1),
    );
    let mut recorder = BufferedRecorder::new();
    let report = session.run(&env, &mut AlwaysRight, 0, &mut recorder)?;

    assert_eq!(recorder.len(), 5);
    for (record, outcome) in recorder.iter().zip(report.outcomes.iter()) {
        assert_eq!(record.get_scalar("trial_steps")?, outcome.steps as f32);
        assert_eq!(record.get_string("trial_status")?, "terminated");
    }
    Ok(())
}

#[test]
fn test_session_stops_when_probes_pass() -> Result<()> {
    let env = Line::build(&5)?;
    let session = Session::build(
        SessionConfig::default()
            .max_trials(50)
            .max_trial_steps(10)
            .probe_interval(1)
            .stop_on_probe_success(true),
    )
    .probes(vec![Probe::new(Pos(0), 4), Probe::new(Pos(2), 2)]);

    let report = session.run(&env, &mut AlwaysRight, 3, &mut NullRecorder::new())?;
    assert_eq!(report.trials_to_solve, Some(1));
    assert_eq!(report.n_trials(), 1);
    assert!(report.probes_passed());
    assert_eq!(report.probe_results[0].steps, 4);
    Ok(())
}

#[test]
fn test_failed_probe_is_reported() -> Result<()> {
    let env = Line::build(&5)?;
    let session = Session::build(SessionConfig::default().max_trials(2).max_trial_steps(10))
        .probes(vec![Probe::new(Pos(0), 3)]);

    let report = session.run(&env, &mut AlwaysRight, 3, &mut NullRecorder::new())?;
    assert_eq!(report.trials_to_solve, None);
    assert!(!report.probe_results[0].success);
    assert_eq!(report.probe_results[0].steps, 3);
    Ok(())
}

#[test]
fn test_session_stores_evaluation_records() -> Result<()> {
    let env = Line::build(&5)?;
    let session = Session::build(
        SessionConfig::default()
            .max_trials(3)
            .max_trial_steps(10)
            .probe_interval(1),
    )
    .probes(vec![Probe::new(Pos(0), 4), Probe::new(Pos(1), 2)]);
    let mut recorder = BufferedRecorder::new();
    session.run(&env, &mut AlwaysRight, 3, &mut recorder)?;

    // One flush at the end: three trials, three evaluations and the last one.
    assert_eq!(recorder.len(), 1);
    let record = recorder.iter().next().unwrap();
    assert_eq!(record.get_scalar("probes_passed_min")?, 1.0);
    assert_eq!(record.get_scalar("probes_total_max")?, 2.0);
    assert_eq!(record.get_array1("probe_steps")?, vec![4.0, 2.0]);
    Ok(())
}

#[test]
fn test_parallel_runner_matches_sequential() -> Result<()> {
    let env = Line::build(&6)?;
    let session_config = SessionConfig::default().max_trials(10).max_trial_steps(40);

    let sequential = SessionRunner::new(
        RunnerConfig::default().sessions(6).seed(11),
        Session::build(session_config.clone()),
    )
    .run(&env, || Ok(RandomWalk::default()))?;
    let parallel = SessionRunner::new(
        RunnerConfig::default().sessions(6).seed(11).n_workers(4),
        Session::build(session_config),
    )
    .run(&env, || Ok(RandomWalk::default()))?;

    assert_eq!(sequential.len(), 6);
    for (s, p) in sequential.iter().zip(parallel.iter()) {
        assert_eq!(s.seed, p.seed);
        assert_eq!(s.outcomes, p.outcomes);
    }
    Ok(())
}

#[test]
fn test_runner_explicit_seeds() -> Result<()> {
    let env = Line::build(&6)?;
    let runner = SessionRunner::new(
        RunnerConfig::default().sessions(10).seeds(vec![5, 1, 5]),
        Session::build(SessionConfig::default().max_trials(4).max_trial_steps(20)),
    );
    let reports = runner.run(&env, || Ok(RandomWalk::default()))?;

    assert_eq!(reports.iter().map(|r| r.seed).collect::<Vec<_>>(), vec![5, 1, 5]);
    assert_eq!(reports[0].outcomes, reports[2].outcomes);
    Ok(())
}

#[test]
fn test_runner_reports_first_error() {
    let env = Line { len: 6 };
    let runner = SessionRunner::new(
        RunnerConfig::default().sessions(3).n_workers(2),
        Session::build(SessionConfig::default().max_trials(4).max_trial_steps(20)),
    );
    let result = runner.run(&env, || -> Result<RandomWalk> {
        Err(TaxiError::InvalidConfig("no solver".to_string()).into())
    });
    assert!(result.is_err());
}

#[test]
fn test_attempt_display() -> Result<()> {
    let env = Line::build(&3)?;
    let mut rng = rand::thread_rng();
    let attempt = attempt(&env, &AlwaysRight, &Pos(0), 5, &mut rng)?;

    assert!(attempt.succeeded);
    assert_eq!(attempt.len(), 2);
    let text = attempt.to_string();
    assert!(text.starts_with("start: at 0"));
    assert!(text.ends_with("solved after 2 steps, reward -2"));
    Ok(())
}

#[test]
fn test_shared_solver_across_threads() -> Result<()> {
    let env = Line::build(&6)?;
    let shared = SharedSolver::new(RandomWalk::default());

    std::thread::scope(|scope| {
        for seed in 0..3u64 {
            let shared = shared.clone();
            let env = &env;
            scope.spawn(move || {
                let session =
                    Session::build(SessionConfig::default().max_trials(2).max_trial_steps(10));
                shared.train(|solver| session.run(env, solver, seed, &mut NullRecorder::new()))
            });
        }
    });

    let trials = shared.assess(|solver| solver.trials)?;
    assert_eq!(trials, 6);
    Ok(())
}
