//! Fitness and selection kernel.
//!
//! With `S_j = exp(-V_j·D·V_jᵗ)`, `E_i = exp(-V_i·V_iᵗ)` and the competitive
//! load `W_i = Σ_{j≠i} N_j·S_j`, the per-step log growth of population `i` is
//!
//! ```text
//! F_i = r0 - f·V_i·C·V_iᵗ - a0·(N_i + W_i)·E_i
//! ```
//!
//! and its selection gradient (derivative with respect to `V_i`) is
//!
//! ```text
//! g_i = -f·V_i·(C + Cᵗ) + 2·a0·(N_i + W_i)·E_i·V_i
//! ```
//!
//! Both simulation regimes and the Jacobian go through these functions; no
//! other module re-derives them.

use crate::ecology::EcoParams;
use crate::errors::{Result, SimError};
use nalgebra::DVector;

/// A trait vector of dimension `q`.
pub type TraitVector = DVector<f64>;

/// `E_i = exp(-V_i·V_iᵗ)`: how strongly population `i` feels competition.
#[inline]
pub fn self_similarity(v: &TraitVector) -> f64 {
    (-v.dot(v)).exp()
}

/// `S_j = exp(-V_j·D·V_jᵗ)`: how strongly population `j` competes.
#[inline]
pub fn competition_weight(v: &TraitVector, params: &EcoParams) -> f64 {
    (-v.dot(&(params.d() * v))).exp()
}

/// Borrowed snapshot of a community: one trait vector and one abundance per
/// population, in the same order.
#[derive(Debug, Clone, Copy)]
pub struct Community<'a> {
    traits: &'a [TraitVector],
    abundances: &'a [f64],
}

impl<'a> Community<'a> {
    /// Create a validated snapshot whose traits all have dimension `params.q()`.
    pub fn new(traits: &'a [TraitVector], abundances: &'a [f64], params: &EcoParams) -> Result<Self> {
        if traits.len() != abundances.len() {
            return Err(SimError::mismatch(
                "abundances (one per trait vector)",
                traits.len(),
                abundances.len(),
            ));
        }
        let q = params.q();
        if let Some(v) = traits.iter().find(|v| v.len() != q) {
            return Err(SimError::mismatch("trait vector length", q, v.len()));
        }
        Ok(Self::new_unchecked(traits, abundances))
    }

    /// Snapshot without validation; callers guarantee consistent shapes.
    pub(crate) fn new_unchecked(traits: &'a [TraitVector], abundances: &'a [f64]) -> Self {
        debug_assert_eq!(traits.len(), abundances.len());
        Self { traits, abundances }
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    pub fn traits(&self) -> &'a [TraitVector] {
        self.traits
    }

    pub fn abundances(&self) -> &'a [f64] {
        self.abundances
    }

    /// `S_j` for every population.
    pub fn competition_weights(&self, params: &EcoParams) -> Vec<f64> {
        self.traits
            .iter()
            .map(|v| competition_weight(v, params))
            .collect()
    }

    /// Competitive load `W_i = Σ_{j≠i} N_j·S_j` for every population.
    pub fn competitive_load(&self, params: &EcoParams) -> Vec<f64> {
        let weighted: Vec<f64> = self
            .competition_weights(params)
            .iter()
            .zip(self.abundances)
            .map(|(s, n)| n * s)
            .collect();
        let total: f64 = weighted.iter().sum();
        weighted.iter().map(|own| (total - own).max(0.0)).collect()
    }

    /// Effective density `Z_i = N_i + W_i` for every population.
    pub fn effective_density(&self, params: &EcoParams) -> Vec<f64> {
        self.competitive_load(params)
            .into_iter()
            .zip(self.abundances)
            .map(|(w, n)| n + w)
            .collect()
    }

    /// Log growth `F_i` for every population.
    pub fn fitness(&self, params: &EcoParams) -> Vec<f64> {
        let z = self.effective_density(params);
        self.traits
            .iter()
            .zip(&z)
            .map(|(v, &z)| fitness_at(v, z, params))
            .collect()
    }

    /// Selection gradient `g_i` for every population.
    pub fn selection_gradient(&self, params: &EcoParams) -> Vec<TraitVector> {
        let z = self.effective_density(params);
        self.traits
            .iter()
            .zip(&z)
            .map(|(v, &z)| selection_at(v, z, params))
            .collect()
    }

    /// Fitness and selection gradient from a single pass over the load.
    pub fn fitness_and_selection(&self, params: &EcoParams) -> (Vec<f64>, Vec<TraitVector>) {
        let z = self.effective_density(params);
        self.traits
            .iter()
            .zip(&z)
            .map(|(v, &z)| (fitness_at(v, z, params), selection_at(v, z, params)))
            .unzip()
    }

    /// Deterministic one-step map `V' = V + add_var·g`, `N' = N·exp(F)`.
    ///
    /// Both updates read the same snapshot. This is the map whose derivative
    /// [`crate::ecology::Jacobian`] computes.
    pub fn advance(&self, params: &EcoParams, add_var: &[f64]) -> (Vec<TraitVector>, Vec<f64>) {
        debug_assert_eq!(add_var.len(), self.len());
        let (fit, sel) = self.fitness_and_selection(params);
        let traits = self
            .traits
            .iter()
            .zip(&sel)
            .zip(add_var)
            .map(|((v, g), &s)| v + g * s)
            .collect();
        let abundances = self
            .abundances
            .iter()
            .zip(&fit)
            .map(|(n, f)| n * f.exp())
            .collect();
        (traits, abundances)
    }
}

/// `F_i` given the trait vector and effective density `Z_i`.
#[inline]
pub(crate) fn fitness_at(v: &TraitVector, z: f64, params: &EcoParams) -> f64 {
    let cost = v.dot(&(params.c() * v));
    params.r0() - params.f() * cost - params.a0() * z * self_similarity(v)
}

/// `g_i` given the trait vector and effective density `Z_i`.
#[inline]
pub(crate) fn selection_at(v: &TraitVector, z: f64, params: &EcoParams) -> TraitVector {
    let competition = 2.0 * params.a0() * z * self_similarity(v);
    params.c_sym() * v * (-params.f()) + v * competition
}

/// Log growth of every population, validating shapes first.
pub fn fitness(traits: &[TraitVector], abundances: &[f64], params: &EcoParams) -> Result<Vec<f64>> {
    Ok(Community::new(traits, abundances, params)?.fitness(params))
}

/// Selection gradient of every population, validating shapes first.
pub fn selection_gradient(
    traits: &[TraitVector],
    abundances: &[f64],
    params: &EcoParams,
) -> Result<Vec<TraitVector>> {
    Ok(Community::new(traits, abundances, params)?.selection_gradient(params))
}
