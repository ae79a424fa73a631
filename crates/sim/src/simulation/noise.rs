//! Random perturbations shared by both regimes.

use crate::base::TruncatedNormal;
use crate::ecology::TraitVector;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Offset every coordinate of `v` by `N(0, sd²)`.
///
/// With `keep_pos` each coordinate is drawn from a normal centred on the old
/// value and truncated at zero instead.
pub(crate) fn perturb_traits<R: Rng + ?Sized>(
    v: &TraitVector,
    sd: f64,
    keep_pos: bool,
    rng: &mut R,
) -> TraitVector {
    v.map(|x| {
        if keep_pos {
            TruncatedNormal::new_unchecked(x, sd).sample(rng)
        } else {
            let z: f64 = StandardNormal.sample(rng);
            x + sd * z
        }
    })
}

/// `sd·Z` with `Z ~ N(0, 1)`, or exactly zero without a draw when `sd == 0`.
#[inline]
pub(crate) fn gaussian<R: Rng + ?Sized>(sd: f64, rng: &mut R) -> f64 {
    if sd > 0.0 {
        let z: f64 = StandardNormal.sample(rng);
        sd * z
    } else {
        0.0
    }
}
