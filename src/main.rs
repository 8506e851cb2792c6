use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use cutstock_lab::config::ExperimentConfig;
use cutstock_lab::export;
use cutstock_lab::harness::Harness;
use cutstock_lab::render;
use cutstock_lab::solver::MicroLpSolver;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "cutstock_lab",
    about = "Compares MILP formulations of 1D cutting stock on random instances"
)]
struct Cli {
    /// Experiment configuration (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Successful runs to collect
    #[arg(long)]
    runs: Option<usize>,

    /// Seed for the instance generator (default: random)
    #[arg(long)]
    seed: Option<u64>,

    /// CSV output path
    #[arg(long, default_value = "cutting_stock_results.csv")]
    output: PathBuf,

    /// Also write the full report, cutting plans included, as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Solve the variants of each instance in parallel
    #[arg(long)]
    parallel: bool,

    /// Keep infeasible and unbounded outcomes as rows
    #[arg(long)]
    keep_failures: bool,

    /// Stop after this many generated instances
    #[arg(long)]
    max_attempts: Option<usize>,

    /// Print the cutting plan of every solved result
    #[arg(long)]
    plan: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, default_value = "info")]
    log_level: Level,
}

impl Cli {
    fn experiment_config(&self) -> anyhow::Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ExperimentConfig::default(),
        };
        if let Some(runs) = self.runs {
            config.runs = runs;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.max_attempts.is_some() {
            config.max_attempts = self.max_attempts;
        }
        config.parallel |= self.parallel;
        config.keep_failures |= self.keep_failures;
        Ok(config)
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    match &cli.log_file {
        Some(path) => {
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_writer(log_file)
                .with_target(false)
                .with_ansi(false)
                .with_max_level(cli.log_level)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_max_level(cli.log_level)
                .init();
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    // reads SENTRY_DSN itself; only installed when it is set
    let _sentry = std::env::var_os("SENTRY_DSN").map(|_| {
        sentry::init(sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        })
    });

    let config = cli.experiment_config()?;
    tracing::info!(
        runs = config.runs,
        seed = ?config.seed,
        parallel = config.parallel,
        "starting experiment"
    );

    let mut rng = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    let harness = Harness::new(config, MicroLpSolver::new())?;
    let report = harness.run(&mut rng);

    if cli.plan {
        for result in report.outcomes().filter_map(|o| o.solved()) {
            if let Some(instance) = report.instance(result.run_id) {
                println!("{}", render::render_plan(result, instance));
            }
        }
    }

    export::save_csv(&report, &cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    if let Some(path) = &cli.json {
        export::save_json(&report, path).with_context(|| format!("writing {}", path.display()))?;
    }

    println!("Total successful runs: {}", report.successful_runs);
    println!(
        "Total failed attempts (including infeasible): {}",
        report.failed_attempts
    );
    if report.invalid_instances > 0 {
        println!("Invalid instances skipped: {}", report.invalid_instances);
    }
    println!("Results saved to '{}'", cli.output.display());
    if let Some(path) = &cli.json {
        println!("Report saved to '{}'", path.display());
    }

    Ok(())
}
