use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use traitdyn_sim::base::SeedStreams;
use traitdyn_sim::simulation::{run_config, OutputTable, RunConfig, RunMonitor, RunOutput};

use tracing::debug;

use crate::printing::print_run_parameters;

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub reps: Option<usize>,
    pub threads: Option<usize>,
}

#[derive(Debug)]
pub struct OutputPaths {
    pub states: PathBuf,
    pub diagnostics: PathBuf,
    pub config: Option<PathBuf>,
}

/// Counts finished replicates and advances the progress bar.
struct ProgressMonitor {
    bar: Option<ProgressBar>,
    finished: AtomicUsize,
}

impl ProgressMonitor {
    fn new(n_reps: usize, show: bool) -> Result<Self> {
        let bar = if show {
            let bar = ProgressBar::new(n_reps as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} replicates ({eta})",
                    )?
                    .progress_chars("#>-"),
            );
            Some(bar)
        } else {
            None
        };
        Ok(Self {
            bar,
            finished: AtomicUsize::new(0),
        })
    }

    fn finish(&self) -> usize {
        if let Some(bar) = &self.bar {
            bar.finish_with_message("Done");
        }
        self.finished.load(Ordering::Relaxed)
    }
}

impl RunMonitor for ProgressMonitor {
    fn replicate_finished(&self, _rep: usize) {
        self.finished.fetch_add(1, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}

fn write_table(table: &OutputTable, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    table
        .write_csv(&mut writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  • {} rows → {}", table.n_rows(), path.display());
    Ok(())
}

pub fn run_simulation(
    config_path: &Path,
    overrides: &Overrides,
    paths: &OutputPaths,
    show_progress: bool,
) -> Result<()> {
    println!("🧬 traitdyn - Running Simulation");
    println!("============================================\n");

    let mut config = RunConfig::from_path(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    if let Some(seed) = overrides.seed {
        config.seed = Some(seed);
    }
    if let Some(reps) = overrides.reps {
        config.n_reps = reps;
    }
    if let Some(threads) = overrides.threads {
        config.threads = threads;
    }
    // Fix the seed up front so the run can be reproduced from the printout.
    let seed = config
        .seed
        .unwrap_or_else(|| SeedStreams::from_entropy().seed());
    config.seed = Some(seed);
    debug!(seed, path = %config_path.display(), "configuration loaded");

    print_run_parameters(&config);

    if let Some(path) = &paths.config {
        let json = config.to_json_pretty().context("Failed to serialize configuration")?;
        std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let monitor = ProgressMonitor::new(config.n_reps, show_progress)?;
    let output = run_config(&config, &monitor).context("Simulation failed")?;
    let finished = monitor.finish();

    println!("\n✓ Simulation complete! ({finished} replicates finished)");
    match output {
        RunOutput::AdaptiveDynamics(table) => write_table(&table, &paths.states)?,
        RunOutput::QuantitativeGenetics(out) => {
            write_table(&out.states, &paths.states)?;
            write_table(&out.diagnostics, &paths.diagnostics)?;
        }
    }

    println!("\n💡 Rerun with '--seed {seed}' to reproduce these results");
    Ok(())
}
