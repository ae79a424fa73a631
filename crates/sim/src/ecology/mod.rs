//! Ecological model: parameters, the fitness/selection kernel, its analytic
//! Jacobian, and species grouping.
//!
//! Everything here is stateless and operates on borrowed snapshots of a
//! community, so the same functions serve both simulation regimes and
//! offline stability analysis.

pub mod grouping;
pub mod jacobian;
pub mod kernel;
mod params;

pub use grouping::{group_species, unique_species};
pub use jacobian::{jacobian, Jacobian};
pub use kernel::{
    competition_weight, fitness, selection_gradient, self_similarity, Community, TraitVector,
};
pub use params::EcoParams;
