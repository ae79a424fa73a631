//! Commonly used imports for convenience.
//!
//! # Example
//!
//! ```
//! use traitdyn_sim::prelude::*;
//!
//! let eco = EcoParams::with_eta(0.1, 0.5, 1.0, 0.0, 1.0, 1).unwrap();
//! let initial = InitialPopulation::new(vec![1.0], vec![vec![0.0]]).unwrap();
//! let mut params = AdaptiveParams::new(eco);
//! params.max_t = 20;
//! let table = run_adaptive_dynamics(2, &initial, &params, &RunOptions::new(1, Some(7)), &NoMonitor)
//!     .unwrap();
//! assert_eq!(table.columns()[..4], ["rep", "time", "clone", "N"]);
//! ```

pub use crate::base::{SeedStreams, TruncatedNormal};
pub use crate::ecology::{
    fitness, group_species, jacobian, selection_gradient, unique_species, Community, EcoParams,
    Jacobian, TraitVector,
};
pub use crate::errors::{Result, SimError};
pub use crate::simulation::{
    run_adaptive_dynamics, run_config, run_quantitative_genetics, using_parallel,
    AdaptiveParams, CancelFlag, InitialPopulation, NoMonitor, OutputTable, QuantGenOutput,
    QuantGenParams, RunConfig, RunMonitor, RunOptions, RunOutput,
};
