//! Foundational building blocks shared by both simulation regimes.
//!
//! This module provides the per-replicate random streams, the truncated
//! normal sampler used to keep traits non-negative, and the bounded arena
//! that stores adaptive-dynamics clones.

mod arena;
pub mod rng;
pub mod truncated_normal;

pub use arena::BoundedArena;
pub use rng::{ReplicateRng, SeedStreams};
pub use truncated_normal::{
    trunc_rnorm, trunc_rnorm_mu, trunc_rnorm_mu_sigma, trunc_rnorm_sigma, TruncatedNormal,
};
