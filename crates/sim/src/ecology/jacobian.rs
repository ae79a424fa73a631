//! Analytic Jacobian of the deterministic one-step map.
//!
//! The map is [`Community::advance`]: `V_i' = V_i + σ_i·g_i` and
//! `N_i' = N_i·exp(F_i)`, where `σ_i` is the additive variance of population
//! `i`. Writing `Z_i = N_i + W_i`, `G_i = exp(F_i)`, `CC = C + Cᵗ` and
//! `DD = D + Dᵗ`, the eight block types are
//!
//! ```text
//! ∂V_i'/∂V_i = I + σ_i·(2·a0·Z_i·E_i·(I - 2·V_iᵗV_i) - f·CC)
//! ∂V_i'/∂V_k = -2·a0·σ_i·N_k·S_k·E_i · V_iᵗ(V_k·DD)
//! ∂V_i'/∂N_i = 2·a0·σ_i·E_i · V_iᵗ
//! ∂V_i'/∂N_k = 2·a0·σ_i·E_i·S_k · V_iᵗ
//! ∂N_i'/∂V_i = N_i·G_i · g_i
//! ∂N_i'/∂V_k = a0·N_i·G_i·E_i·N_k·S_k · (V_k·DD)
//! ∂N_i'/∂N_i = G_i·(1 - a0·E_i·N_i)
//! ∂N_i'/∂N_k = -a0·N_i·G_i·E_i·S_k
//! ```
//!
//! Rows index the updated state, columns the current state. Matrices are
//! tiled species-major: the evolutionary Jacobian holds only trait blocks
//! (`n·q` square); the full Jacobian places each species' `q` traits followed
//! by its abundance (`n·(q+1)` square).

use crate::ecology::kernel::{fitness_at, selection_at, Community, TraitVector};
use crate::ecology::{self_similarity, EcoParams};
use crate::errors::{Result, SimError};
use nalgebra::{DMatrix, DVector, RowDVector};

/// Precomputed intermediate terms for the Jacobian of one community snapshot.
#[derive(Debug, Clone)]
pub struct Jacobian<'a> {
    community: Community<'a>,
    params: &'a EcoParams,
    add_var: &'a [f64],
    /// `E_i`
    self_sim: Vec<f64>,
    /// `S_i`
    weights: Vec<f64>,
    /// `Z_i`
    density: Vec<f64>,
    /// `G_i = exp(F_i)`
    growth: Vec<f64>,
    /// `g_i`
    selection: Vec<TraitVector>,
}

impl<'a> Jacobian<'a> {
    /// Validate the snapshot and precompute the shared terms.
    pub fn new(
        traits: &'a [TraitVector],
        abundances: &'a [f64],
        params: &'a EcoParams,
        add_var: &'a [f64],
    ) -> Result<Self> {
        let community = Community::new(traits, abundances, params)?;
        if community.is_empty() {
            return Err(SimError::EmptyInput("traits"));
        }
        if add_var.len() != community.len() {
            return Err(SimError::mismatch(
                "add_var (one per species)",
                community.len(),
                add_var.len(),
            ));
        }

        let density = community.effective_density(params);
        let growth = traits
            .iter()
            .zip(&density)
            .map(|(v, &z)| fitness_at(v, z, params).exp())
            .collect();
        let selection = traits
            .iter()
            .zip(&density)
            .map(|(v, &z)| selection_at(v, z, params))
            .collect();

        Ok(Self {
            community,
            params,
            add_var,
            self_sim: traits.iter().map(self_similarity).collect(),
            weights: community.competition_weights(params),
            density,
            growth,
            selection,
        })
    }

    /// Number of species.
    pub fn n_species(&self) -> usize {
        self.community.len()
    }

    /// Number of traits.
    pub fn q(&self) -> usize {
        self.params.q()
    }

    fn trait_of(&self, i: usize) -> &TraitVector {
        &self.community.traits()[i]
    }

    fn abundance_of(&self, i: usize) -> f64 {
        self.community.abundances()[i]
    }

    /// `∂V_i'/∂V_i`, a `q × q` block.
    pub fn dvi_dvi(&self, i: usize) -> DMatrix<f64> {
        let v = self.trait_of(i);
        let q = v.len();
        let p = self.params;
        let eye = DMatrix::<f64>::identity(q, q);
        let curvature = (&eye - v * v.transpose() * 2.0)
            * (2.0 * p.a0() * self.density[i] * self.self_sim[i]);
        &eye + (curvature - p.c_sym() * p.f()) * self.add_var[i]
    }

    /// `∂V_i'/∂V_k` for `k != i`, a `q × q` block.
    pub fn dvi_dvk(&self, i: usize, k: usize) -> DMatrix<f64> {
        let p = self.params;
        let scale = -2.0
            * p.a0()
            * self.add_var[i]
            * self.abundance_of(k)
            * self.weights[k]
            * self.self_sim[i];
        let dk = p.d_sym() * self.trait_of(k);
        self.trait_of(i) * dk.transpose() * scale
    }

    /// `∂V_i'/∂N_i`, a column of length `q`.
    pub fn dvi_dni(&self, i: usize) -> DVector<f64> {
        let scale = 2.0 * self.params.a0() * self.add_var[i] * self.self_sim[i];
        self.trait_of(i) * scale
    }

    /// `∂V_i'/∂N_k` for `k != i`, a column of length `q`.
    pub fn dvi_dnk(&self, i: usize, k: usize) -> DVector<f64> {
        self.dvi_dni(i) * self.weights[k]
    }

    /// `∂N_i'/∂V_i`, a row of length `q`.
    pub fn dni_dvi(&self, i: usize) -> RowDVector<f64> {
        (&self.selection[i] * (self.abundance_of(i) * self.growth[i])).transpose()
    }

    /// `∂N_i'/∂V_k` for `k != i`, a row of length `q`.
    pub fn dni_dvk(&self, i: usize, k: usize) -> RowDVector<f64> {
        let p = self.params;
        let scale = p.a0()
            * self.abundance_of(i)
            * self.growth[i]
            * self.self_sim[i]
            * self.abundance_of(k)
            * self.weights[k];
        (p.d_sym() * self.trait_of(k) * scale).transpose()
    }

    /// `∂N_i'/∂N_i`.
    pub fn dni_dni(&self, i: usize) -> f64 {
        self.growth[i] * (1.0 - self.params.a0() * self.self_sim[i] * self.abundance_of(i))
    }

    /// `∂N_i'/∂N_k` for `k != i`.
    pub fn dni_dnk(&self, i: usize, k: usize) -> f64 {
        -self.params.a0()
            * self.abundance_of(i)
            * self.growth[i]
            * self.self_sim[i]
            * self.weights[k]
    }

    /// Trait-only Jacobian, `n·q × n·q`.
    pub fn evolutionary(&self) -> DMatrix<f64> {
        let (n, q) = (self.n_species(), self.q());
        let mut jac = DMatrix::zeros(n * q, n * q);
        for i in 0..n {
            for k in 0..n {
                let block = if i == k {
                    self.dvi_dvi(i)
                } else {
                    self.dvi_dvk(i, k)
                };
                jac.view_mut((i * q, k * q), (q, q)).copy_from(&block);
            }
        }
        jac
    }

    /// Full Jacobian over traits and abundances, `n·(q+1) × n·(q+1)`.
    pub fn full(&self) -> DMatrix<f64> {
        let (n, q) = (self.n_species(), self.q());
        let stride = q + 1;
        let mut jac = DMatrix::zeros(n * stride, n * stride);
        for i in 0..n {
            let row = i * stride;
            for k in 0..n {
                let col = k * stride;
                if i == k {
                    jac.view_mut((row, col), (q, q)).copy_from(&self.dvi_dvi(i));
                    jac.view_mut((row, col + q), (q, 1)).copy_from(&self.dvi_dni(i));
                    jac.view_mut((row + q, col), (1, q)).copy_from(&self.dni_dvi(i));
                    jac[(row + q, col + q)] = self.dni_dni(i);
                } else {
                    jac.view_mut((row, col), (q, q)).copy_from(&self.dvi_dvk(i, k));
                    jac.view_mut((row, col + q), (q, 1)).copy_from(&self.dvi_dnk(i, k));
                    jac.view_mut((row + q, col), (1, q)).copy_from(&self.dni_dvk(i, k));
                    jac[(row + q, col + q)] = self.dni_dnk(i, k);
                }
            }
        }
        jac
    }
}

/// Jacobian of the one-step map at the given snapshot.
///
/// With `evo_only` the result holds trait blocks only (`n·q` square);
/// otherwise abundances are included (`n·(q+1)` square).
pub fn jacobian(
    traits: &[TraitVector],
    abundances: &[f64],
    params: &EcoParams,
    add_var: &[f64],
    evo_only: bool,
) -> Result<DMatrix<f64>> {
    let jac = Jacobian::new(traits, abundances, params, add_var)?;
    Ok(if evo_only { jac.evolutionary() } else { jac.full() })
}
