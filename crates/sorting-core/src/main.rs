//! Partisan sorting simulation driver
//!
//! Steps one model from a seed, samples the sorting statistic along the way
//! and writes a JSON run report.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sorting_core::{Config, LoadError, SortingModel, StagnationTracker, DEFAULT_CONFIG_PATH};
use sorting_events::{generate_run_id, RunReport, SortingSample};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "sorting_sim")]
#[command(about = "Agent-based model of partisan sorting on a social network")]
struct Args {
    /// TOML configuration file (defaults to sorting.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of interaction steps
    #[arg(long)]
    steps: Option<u64>,

    /// Stop after this many consecutive no-op steps per agent
    #[arg(long)]
    break_after_stagnant: Option<u64>,

    /// Run the full step budget regardless of stagnation
    #[arg(long)]
    no_early_stop: bool,

    /// Steps between sorting samples
    #[arg(long)]
    sample_interval: Option<u64>,

    /// Number of groups
    #[arg(long)]
    k: Option<u32>,

    /// Values per opinion coordinate
    #[arg(long)]
    m: Option<u32>,

    /// Opinion coordinates per agent
    #[arg(long)]
    n: Option<usize>,

    /// Population size (perfect square)
    #[arg(long)]
    agents: Option<usize>,

    /// Fraction of interlocutors drawn at random
    #[arg(long)]
    gamma: Option<f64>,

    /// Homophily exponent
    #[arg(long)]
    h: Option<f64>,

    /// Weight of a group-identity match
    #[arg(long)]
    c: Option<f64>,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn load_config(&self) -> Result<Config, LoadError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Config::load(DEFAULT_CONFIG_PATH)?
            }
            None => Config::default(),
        };

        let model = &mut config.model;
        if let Some(k) = self.k {
            model.k = k;
        }
        if let Some(m) = self.m {
            model.m = m;
        }
        if let Some(n) = self.n {
            model.n = n;
        }
        if let Some(agents) = self.agents {
            model.n_agents = agents;
        }
        if let Some(gamma) = self.gamma {
            model.gamma = gamma;
        }
        if let Some(h) = self.h {
            model.h = h;
        }
        if let Some(c) = self.c {
            model.c = c;
        }

        let run = &mut config.run;
        if let Some(seed) = self.seed {
            run.seed = seed;
        }
        if let Some(steps) = self.steps {
            run.steps = steps;
        }
        if let Some(limit) = self.break_after_stagnant {
            run.break_after_stagnant = Some(limit);
        }
        if self.no_early_stop {
            run.break_after_stagnant = None;
        }
        if let Some(interval) = self.sample_interval {
            run.sample_interval = interval;
        }

        config.model.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.load_config()?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let params = &config.model;
    let settings = &config.run;
    info!(
        seed = settings.seed,
        steps = settings.steps,
        k = params.k,
        m = params.m,
        n = params.n,
        n_agents = params.n_agents,
        gamma = params.gamma,
        h = params.h,
        c = params.c,
        "starting run"
    );

    let mut model = SortingModel::seeded(params.clone(), settings.seed)?;
    let mut tracker = StagnationTracker::new(settings.break_after_stagnant, model.n_agents());
    let interval = settings.sample_interval.max(1);

    let mut samples = vec![SortingSample {
        step: 0,
        sorting: model.sorting_breakdown().sorting_value(),
        stagnant_steps: 0,
    }];
    let mut changes = 0u64;
    let mut stopped_early = false;

    for step in 1..=settings.steps {
        let changed = model.step();
        if changed {
            changes += 1;
        }
        let stagnant = tracker.record(changed);

        if step % interval == 0 || stagnant || step == settings.steps {
            let sorting = model.sorting_breakdown().sorting_value();
            samples.push(SortingSample {
                step,
                sorting,
                stagnant_steps: tracker.since_change(),
            });
            if step % (interval * 10) == 0 {
                info!(step, changes, sorting = ?sorting, "progress");
            }
        }

        if stagnant {
            stopped_early = true;
            info!(step, "no change for too long, stopping early");
            break;
        }
    }

    let report = RunReport {
        run_id: generate_run_id(),
        seed: settings.seed,
        params: params.to_record(),
        steps_requested: settings.steps,
        steps_taken: model.steps(),
        changes,
        stopped_early,
        samples,
        final_state: model.snapshot(),
    };

    let groups = report.final_state.group_sizes();
    match report.final_sorting() {
        Some(sorting) => info!(
            steps = report.steps_taken,
            changes,
            sorting,
            ?groups,
            "run complete"
        ),
        None => warn!(
            steps = report.steps_taken,
            ?groups,
            "run complete; sorting undefined because a pair list is empty"
        ),
    }

    let json = report.to_json()?;
    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)?;
            info!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
