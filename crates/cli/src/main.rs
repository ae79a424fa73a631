mod commands;
mod printing;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use traitdyn_sim::simulation::Regime;

use commands::{run, template};

/// traitdyn: trait-based eco-evolutionary simulations
///
/// Simulates communities whose members are described by continuous trait
/// vectors, either as asexual clones with rare mutants (adaptive dynamics) or
/// as species with evolving trait means (quantitative genetics).
#[derive(Parser, Debug)]
#[command(name = "traitdyn")]
#[command(author, version, about = "Simulates trait-based eco-evolutionary dynamics", long_about = None)]
struct Cli {
    /// Number of worker threads
    ///
    /// Overrides the configuration file. 0 or 1 runs replicates sequentially.
    #[arg(short = 't', long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the simulation described by a JSON configuration.
    ///
    /// Writes one CSV table of population states and, for quantitative
    /// genetics, a second table of per-replicate diagnostics.
    Run {
        /// Configuration file (see `traitdyn template`)
        #[arg(short, long)]
        config: PathBuf,

        /// Output CSV for population states
        #[arg(short, long, default_value = "states.csv")]
        output: PathBuf,

        /// Output CSV for diagnostics (quantitative genetics only)
        #[arg(long, default_value = "diagnostics.csv")]
        diagnostics: PathBuf,

        /// Override random seed (default: use configured seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Override number of replicates
        #[arg(short = 'n', long)]
        reps: Option<usize>,

        /// Write the resolved configuration (including the seed) here
        #[arg(long)]
        save_config: Option<PathBuf>,

        /// Show progress bar
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        progress: bool,
    },

    /// Write an example configuration to start from.
    Template {
        /// Simulation regime
        #[arg(short, long, value_enum, default_value_t = RegimeArg::AdaptiveDynamics)]
        regime: RegimeArg,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RegimeArg {
    #[value(alias = "ad")]
    AdaptiveDynamics,
    #[value(alias = "qg")]
    QuantitativeGenetics,
}

impl From<RegimeArg> for Regime {
    fn from(arg: RegimeArg) -> Self {
        match arg {
            RegimeArg::AdaptiveDynamics => Regime::AdaptiveDynamics,
            RegimeArg::QuantitativeGenetics => Regime::QuantitativeGenetics,
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output,
            diagnostics,
            seed,
            reps,
            save_config,
            progress,
        } => {
            let overrides = run::Overrides {
                seed,
                reps,
                threads: cli.threads,
            };
            let paths = run::OutputPaths {
                states: output,
                diagnostics,
                config: save_config,
            };
            run::run_simulation(&config, &overrides, &paths, progress)?;
        }
        Commands::Template { regime, output } => {
            template::write_template(regime.into(), output.as_deref())?;
        }
    }

    Ok(())
}
