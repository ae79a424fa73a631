//! Monte-Carlo orchestration.
//!
//! Replicates are independent: each owns its container and its random stream
//! and reads the shared parameters. They are fanned out over a rayon pool
//! (or run on the calling thread for a pool size of 0 or 1) and their
//! histories are merged into one table afterwards. Results depend only on the
//! seed, never on the number of workers.

use crate::base::{ReplicateRng, SeedStreams};
use crate::errors::{Result, SimError};
use crate::simulation::table::{final_state_columns, trajectory_columns};
use crate::simulation::{
    AdaptiveParams, AdaptiveReplicate, InitialPopulation, ModelParams, OutputTable,
    QuantGenParams, QuantGenReplicate, QuantGenSummary, RunConfig, RunMonitor, RunOptions,
};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Whether this build can run replicates on more than one thread.
pub fn using_parallel() -> bool {
    cfg!(feature = "parallel")
}

/// Either a dedicated rayon pool or the calling thread.
enum WorkerPool {
    Sequential,
    #[cfg(feature = "parallel")]
    Rayon(rayon::ThreadPool),
}

impl WorkerPool {
    #[cfg(feature = "parallel")]
    fn new(threads: usize) -> Result<Self> {
        if threads <= 1 {
            return Ok(Self::Sequential);
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map(Self::Rayon)
            .map_err(|e| SimError::ThreadPool(e.to_string()))
    }

    #[cfg(not(feature = "parallel"))]
    fn new(_threads: usize) -> Result<Self> {
        Ok(Self::Sequential)
    }

    /// Run `job`, telling it whether it may use parallel iterators.
    fn install<T: Send>(&self, job: impl FnOnce(bool) -> T + Send) -> T {
        match self {
            Self::Sequential => job(false),
            #[cfg(feature = "parallel")]
            Self::Rayon(pool) => pool.install(|| job(true)),
        }
    }
}

/// Map `items` with their index, keeping input order. Runs on the current
/// rayon pool when `parallel` is set.
fn map_indexed<T, U, F>(items: Vec<T>, parallel: bool, f: F) -> Vec<U>
where
    T: Send,
    U: Send,
    F: Fn((usize, T)) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    if parallel {
        return items.into_par_iter().enumerate().map(f).collect();
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;
    items.into_iter().enumerate().map(f).collect()
}

/// Run `simulate` once per replicate, each with its own stream.
///
/// Once any replicate fails the remaining ones are skipped. A cancellation
/// surfaces as a single [`SimError::Cancelled`] and no partial output.
fn run_replicates<T, F>(
    pool: &WorkerPool,
    n_reps: usize,
    streams: &SeedStreams,
    monitor: &dyn RunMonitor,
    simulate: F,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize, &mut ReplicateRng) -> Result<T> + Sync,
{
    let stop = AtomicBool::new(false);
    let task = |(rep, mut rng): (usize, ReplicateRng)| -> Result<T> {
        if stop.load(Ordering::Relaxed) {
            return Err(SimError::Cancelled);
        }
        match simulate(rep, &mut rng) {
            Ok(out) => {
                debug!(rep, "replicate finished");
                monitor.replicate_finished(rep);
                Ok(out)
            }
            Err(e) => {
                stop.store(true, Ordering::Relaxed);
                Err(e)
            }
        }
    };

    let rngs = streams.streams(n_reps);
    let outcomes: Vec<Result<T>> = pool.install(|parallel| map_indexed(rngs, parallel, &task));

    let mut results = Vec::with_capacity(n_reps);
    let mut was_cancelled = false;
    for outcome in outcomes {
        match outcome {
            Ok(out) => results.push(out),
            Err(SimError::Cancelled) => was_cancelled = true,
            Err(e) => return Err(e),
        }
    }
    if was_cancelled {
        warn!("run cancelled; discarding partial results");
        return Err(SimError::Cancelled);
    }
    Ok(results)
}

fn check_reps(n_reps: usize) -> Result<()> {
    if n_reps == 0 {
        return Err(SimError::NoReplicates);
    }
    Ok(())
}

fn row_counts<T: Sync>(pool: &WorkerPool, items: &[T], count: impl Fn(&T) -> usize + Sync) -> Vec<usize> {
    let refs: Vec<&T> = items.iter().collect();
    pool.install(|parallel| map_indexed(refs, parallel, |(_, item)| count(item)))
}

/// Simulate `n_reps` adaptive-dynamics replicates.
///
/// Returns one `[rep, time, clone, N, V1..Vq]` row per live clone per
/// snapshot, ordered by replicate and then time.
pub fn run_adaptive_dynamics(
    n_reps: usize,
    initial: &InitialPopulation,
    params: &AdaptiveParams,
    options: &RunOptions,
    monitor: &dyn RunMonitor,
) -> Result<OutputTable> {
    check_reps(n_reps)?;
    params.validate_with(initial)?;

    let pool = WorkerPool::new(options.threads)?;
    let streams = SeedStreams::from_option(options.seed);
    info!(
        seed = streams.seed(),
        n_reps,
        threads = options.threads,
        clones = initial.len(),
        max_t = params.max_t,
        "starting adaptive-dynamics run"
    );

    let histories = run_replicates(&pool, n_reps, &streams, monitor, |rep, rng| {
        let mut replicate = AdaptiveReplicate::new(initial, params, rng)?;
        replicate.run(rep, params, rng, monitor)?;
        Ok(replicate.into_history())
    })?;

    let q = params.eco.q();
    let counts = row_counts(&pool, &histories, |h| h.n_rows());
    let table = pool.install(|parallel| {
        OutputTable::assemble(trajectory_columns("clone", q), &counts, parallel, |i, out| {
            histories[i].fill_rows(i, q, out)
        })
    });
    info!(rows = table.n_rows(), "adaptive-dynamics run finished");
    Ok(table)
}

/// Tables produced by a quantitative-genetics run.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantGenOutput {
    /// `[rep, time, spp, N, V1..Vq]` snapshots when `save_every > 0`,
    /// otherwise the final `[rep, spp, N, V1..Vq]` state of each replicate.
    pub states: OutputTable,
    /// One `[rep, fitness, selection]` row per replicate.
    pub diagnostics: OutputTable,
}

impl QuantGenOutput {
    /// Whether `states` holds snapshots over time.
    pub fn is_time_series(&self) -> bool {
        self.states.column_index("time").is_some()
    }
}

/// Simulate `n_reps` quantitative-genetics replicates.
pub fn run_quantitative_genetics(
    n_reps: usize,
    initial: &InitialPopulation,
    params: &QuantGenParams,
    options: &RunOptions,
    monitor: &dyn RunMonitor,
) -> Result<QuantGenOutput> {
    check_reps(n_reps)?;
    params.validate_with(initial)?;

    let pool = WorkerPool::new(options.threads)?;
    let streams = SeedStreams::from_option(options.seed);
    info!(
        seed = streams.seed(),
        n_reps,
        threads = options.threads,
        species = initial.len(),
        start_t = params.start_t,
        max_t = params.max_t,
        "starting quantitative-genetics run"
    );

    let summaries: Vec<QuantGenSummary> =
        run_replicates(&pool, n_reps, &streams, monitor, |rep, rng| {
            QuantGenReplicate::new(initial, params, rng)?.run(rep, params, rng, monitor)
        })?;

    let q = params.eco.q();
    let states = if params.save_every > 0 {
        let counts = row_counts(&pool, &summaries, |s| s.history.n_rows());
        pool.install(|parallel| {
            OutputTable::assemble(trajectory_columns("spp", q), &counts, parallel, |i, out| {
                summaries[i].history.fill_rows(i, q, out)
            })
        })
    } else {
        let counts = row_counts(&pool, &summaries, |s| s.final_state.len());
        pool.install(|parallel| {
            OutputTable::assemble(final_state_columns("spp", q), &counts, parallel, |i, out| {
                summaries[i].final_state.fill_rows(i, false, out)
            })
        })
    };

    let diagnostic_columns = ["rep", "fitness", "selection"].map(String::from).to_vec();
    let diagnostics =
        OutputTable::assemble(diagnostic_columns, &vec![1; n_reps], false, |i, out| {
            out.copy_from_slice(&[i as f64, summaries[i].fitness, summaries[i].selection])
        });

    info!(rows = states.n_rows(), "quantitative-genetics run finished");
    Ok(QuantGenOutput {
        states,
        diagnostics,
    })
}

/// Output of a configuration-driven run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutput {
    AdaptiveDynamics(OutputTable),
    QuantitativeGenetics(QuantGenOutput),
}

/// Resolve `config` and run the regime it selects.
pub fn run_config(config: &RunConfig, monitor: &dyn RunMonitor) -> Result<RunOutput> {
    let (initial, params) = config.resolve()?;
    let options = config.run_options();
    match params {
        ModelParams::Adaptive(p) => {
            run_adaptive_dynamics(config.n_reps, &initial, &p, &options, monitor)
                .map(RunOutput::AdaptiveDynamics)
        }
        ModelParams::QuantGen(p) => {
            run_quantitative_genetics(config.n_reps, &initial, &p, &options, monitor)
                .map(RunOutput::QuantitativeGenetics)
        }
    }
}
