use anyhow::Result;
use clap::Parser;
use log::info;
use taxi::{
    replay, run_all, ReplayConfig, RunConfig, ScenarioConfig, SolverChoice, SolverConfigs,
    SolverSummary,
};
use taxi_core::{Env as _, RunnerConfig, SessionConfig};
use taxi_env::TaxiEnv;
use taxi_solver::{DoorMaxConfig, FactoredRMaxConfig, MaxQConfig, QLearnerConfig, RMaxConfig};

/// Runs the taxi solvers
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Run configuration in YAML, the classic setup if not given
    #[arg(short, long)]
    config: Option<String>,

    /// Print the trajectory of the configured replay
    #[arg(short, long, default_value_t = false)]
    replay: bool,

    /// Write one CSV row per session to this file
    #[arg(long)]
    csv: Option<String>,

    /// Number of worker threads, overrides the configuration
    #[arg(short, long)]
    workers: Option<usize>,
}

/// Both test scenarios of the classic map, every solver, 10 sessions.
fn classic_config() -> RunConfig {
    RunConfig::default()
        .session(
            SessionConfig::default()
                .max_trials(300)
                .max_trial_steps(200)
                .probe_interval(1)
                .stop_on_probe_success(true),
        )
        .runner(RunnerConfig::default().sessions(10).n_workers(4).seed(42))
        .solvers(SolverConfigs {
            random: false,
            qlearner: Some(QLearnerConfig::default()),
            rmax: Some(RMaxConfig::default().gamma(0.9).error_delta(1e-3).rmax(1.0)),
            factored_rmax: Some(
                FactoredRMaxConfig::default()
                    .gamma(0.9)
                    .error_delta(1e-3)
                    .rmax(1.0),
            ),
            doormax: Some(
                DoorMaxConfig::default()
                    .gamma(0.9)
                    .error_delta(1e-3)
                    .rmax(1.0),
            ),
            maxq: Some(MaxQConfig::default()),
        })
        .probe(ScenarioConfig::new((2, 2), "Y", "R", 10))
        .probe(ScenarioConfig::new((0, 4), "Y", "R", 6))
        .replay(ReplayConfig {
            solver: SolverChoice::DoorMax,
            scenario: ScenarioConfig::new((2, 2), "Y", "R", 10),
        })
}

fn log_summary(summary: &SolverSummary) {
    let (steps, steps_std) = summary.steps().get_distribution();
    let (reward, reward_std) = summary.rewards().get_distribution();
    let solved = summary.trials_to_solve();
    info!(
        "{}: steps {:.1} +- {:.1}, reward {:.1} +- {:.1}, probes passed in {}/{} sessions",
        summary.choice,
        steps,
        steps_std,
        reward,
        reward_std,
        summary.n_probes_passed(),
        summary.reports.len()
    );
    if solved.count() > 0 {
        info!(
            "{}: solved after {:.1} +- {:.1} trials",
            summary.choice,
            solved.mean(),
            solved.stddev()
        );
    }
}

fn write_csv(path: &str, summaries: &[SolverSummary]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for summary in summaries.iter() {
        for row in summary.rows() {
            wtr.serialize(row)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn run(args: &Args, mut config: RunConfig) -> Result<Vec<SolverSummary>> {
    if let Some(n) = args.workers {
        config.runner.n_workers = n;
    }
    let env = TaxiEnv::build(&config.taxi_config())?;

    let summaries = run_all(&config, &env)?;
    for summary in summaries.iter() {
        log_summary(summary);
    }
    if let Some(path) = &args.csv {
        write_csv(path, &summaries)?;
    }

    if args.replay {
        match replay(&config, &env)? {
            Some(attempt) => println!("{}", attempt),
            None => info!("No replay configured"),
        }
    }
    Ok(summaries)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => classic_config(),
    };
    run(&args, config)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{classic_config, run, Args};
    use anyhow::Result;
    use taxi_core::{RunnerConfig, SessionConfig};
    use tempdir::TempDir;

    #[test]
    fn test_run_taxi() -> Result<()> {
        let tmp_dir = TempDir::new("run_taxi")?;
        let csv_path = tmp_dir.path().join("sessions.csv");
        let csv_file = match csv_path.to_str() {
            Some(s) => s.to_string(),
            None => panic!("Failed to get string of temporary directory"),
        };
        let args = Args {
            config: None,
            replay: true,
            csv: Some(csv_file.clone()),
            workers: Some(2),
        };
        let mut config = classic_config()
            .runner(RunnerConfig::default().sessions(2))
            .session(SessionConfig::default().max_trials(3).max_trial_steps(50));
        config.solvers.random = true;

        let summaries = run(&args, config)?;
        assert_eq!(summaries.len(), 6);

        let mut rdr = csv::Reader::from_path(&csv_file)?;
        assert_eq!(rdr.records().count(), 12);
        Ok(())
    }
}
