use anyhow::Result;
use std::path::PathBuf;
use taxi::{
    replay, run_solver, ReplayConfig, RunConfig, ScenarioConfig, SolverChoice, SolverConfigs,
};
use taxi_core::{Env, RunnerConfig, SessionConfig};
use taxi_env::{TaxiEnv, WorldConfig};
use taxi_solver::{FactoredRMaxConfig, RMaxConfig};
use test_log::test;

fn classic_yaml() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/classic.yaml")
}

/// Solving sessions on the 3x3 world, probed with their shortest solutions.
fn small_config() -> RunConfig {
    RunConfig::default()
        .world(WorldConfig::small())
        .session(
            SessionConfig::default()
                .max_trials(300)
                .max_trial_steps(100)
                .probe_interval(1)
                .stop_on_probe_success(true),
        )
        .runner(RunnerConfig::default().sessions(3).seed(11))
        .solvers(SolverConfigs {
            rmax: Some(RMaxConfig::default().gamma(0.9).error_delta(1e-3).rmax(1.0)),
            factored_rmax: Some(
                FactoredRMaxConfig::default()
                    .gamma(0.9)
                    .error_delta(1e-3)
                    .rmax(1.0),
            ),
            ..Default::default()
        })
        .probe(ScenarioConfig::new((1, 1), "Y", "R", 6))
        .probe(ScenarioConfig::new((1, 1), "R", "G", 8))
        .probe(ScenarioConfig::new((2, 2), "B", "Y", 4))
}

#[test]
fn test_classic_yaml() -> Result<()> {
    let config = RunConfig::load(classic_yaml())?;
    assert_eq!(config.world, WorldConfig::classic());
    assert_eq!(
        config.solvers.enabled(),
        vec![
            SolverChoice::QLearner,
            SolverChoice::RMax,
            SolverChoice::FactoredRMax,
            SolverChoice::DoorMax,
            SolverChoice::MaxQ,
        ]
    );
    assert_eq!(config.runner.session_seeds().len(), 10);

    let env = TaxiEnv::build(&config.taxi_config())?;
    let probes = config.build_probes(env.world())?;
    let budgets: Vec<usize> = probes.iter().map(|p| p.max_steps).collect();
    assert_eq!(budgets, vec![10, 6]);
    Ok(())
}

#[test]
fn test_config_driven_sessions_solve_small_world() -> Result<()> {
    let config = small_config();
    let env = TaxiEnv::build(&config.taxi_config())?;

    for choice in config.solvers.enabled() {
        let summary = run_solver(choice, &config, &env)?;
        assert_eq!(summary.reports.len(), 3);
        assert_eq!(summary.n_probes_passed(), 3, "{} failed a probe", choice);
        assert_eq!(summary.trials_to_solve().count(), 3);
        for row in summary.rows() {
            assert_eq!(row.solver, choice.name());
            assert!(row.trials <= 300);
        }
    }
    Ok(())
}

#[test]
fn test_workers_do_not_change_results() -> Result<()> {
    let config = small_config();
    let env = TaxiEnv::build(&config.taxi_config())?;
    let sequential = run_solver(SolverChoice::RMax, &config, &env)?;

    let parallel_config =
        small_config().runner(RunnerConfig::default().sessions(3).seed(11).n_workers(3));
    let parallel = run_solver(SolverChoice::RMax, &parallel_config, &env)?;
    assert_eq!(sequential.rows(), parallel.rows());
    Ok(())
}

#[test]
fn test_replay_after_training() -> Result<()> {
    let config = small_config().replay(ReplayConfig {
        solver: SolverChoice::RMax,
        scenario: ScenarioConfig::new((2, 2), "B", "Y", 4),
    });
    let env = TaxiEnv::build(&config.taxi_config())?;

    let attempt = match replay(&config, &env)? {
        Some(attempt) => attempt,
        None => panic!("replay is configured"),
    };
    assert!(attempt.succeeded);
    assert_eq!(attempt.len(), 4);
    assert!(attempt.to_string().contains("solved"));
    Ok(())
}

#[test]
fn test_no_replay() -> Result<()> {
    let config = small_config();
    let env = TaxiEnv::build(&config.taxi_config())?;
    assert!(replay(&config, &env)?.is_none());
    Ok(())
}

#[test]
fn test_invalid_replay_scenario() -> Result<()> {
    let config = small_config().replay(ReplayConfig {
        solver: SolverChoice::Random,
        scenario: ScenarioConfig::new((1, 1), "R", "R", 4),
    });
    let env = TaxiEnv::build(&config.taxi_config())?;
    let err = match replay(&config, &env) {
        Ok(_) => panic!("passenger at the destination must be rejected"),
        Err(e) => e,
    };
    assert!(matches!(
        err.downcast_ref::<taxi_core::TaxiError>(),
        Some(taxi_core::TaxiError::InvalidScenario(_))
    ));
    Ok(())
}
