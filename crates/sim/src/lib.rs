//! # Trait-dynamics simulation crate
//!
//! Eco-evolutionary simulation of populations described by continuous trait
//! vectors. All regimes share one ecological kernel ([`ecology`]): abundance
//! growth depends on a population's own traits and on competition from every
//! other population, and trait change follows the selection gradient.
//!
//! Two regimes are provided:
//!
//! - **Adaptive dynamics**: clones reproduce asexually and occasionally bud
//!   off mutants with perturbed traits.
//! - **Quantitative genetics**: a fixed set of species whose mean traits move
//!   by `add_var × gradient` each step.
//!
//! Replicates run in parallel with independent random streams derived from
//! one seed ([`base::SeedStreams`]), so results never depend on the number of
//! worker threads.

pub mod base;
pub mod ecology;
pub mod errors;
pub mod prelude;
pub mod simulation;

pub use errors::{Result, SimError};
