//! Simulation regimes and the Monte-Carlo orchestrator.
//!
//! - [`AdaptiveReplicate`]: asexual clones with rare mutants (adaptive
//!   dynamics).
//! - [`QuantGenReplicate`]: fixed species with evolving trait means
//!   (quantitative genetics).
//! - [`run_adaptive_dynamics`] / [`run_quantitative_genetics`]: run many
//!   replicates in parallel and merge their histories into one table.

pub mod adaptive;
pub mod configs;
pub mod engine;
mod history;
pub mod monitor;
mod noise;
pub mod parameters;
pub mod quantgen;
pub mod table;

pub use adaptive::{AdaptiveReplicate, Lineage};
pub use configs::{
    AdaptiveConfig, AddVarConfig, EcologyConfig, InitialConfig, MatrixConfig, ModelConfig,
    ModelParams, QuantGenConfig, Regime, RunConfig,
};
pub use engine::{
    run_adaptive_dynamics, run_config, run_quantitative_genetics, using_parallel,
    QuantGenOutput, RunOutput,
};
pub use history::{History, TimeSlice};
pub use monitor::{CancelFlag, NoMonitor, RunMonitor};
pub use parameters::{AdaptiveParams, InitialPopulation, QuantGenParams, RunOptions};
pub use quantgen::{QuantGenReplicate, QuantGenSummary};
pub use table::OutputTable;
