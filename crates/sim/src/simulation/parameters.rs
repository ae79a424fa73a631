//! Run parameters and initial conditions.
//!
//! Every check in this module runs before any replicate state is created, so
//! a rejected run never starts a worker.

use crate::ecology::{EcoParams, TraitVector};
use crate::errors::{Result, SimError};
use nalgebra::DVector;

/// Initial abundances and trait vectors shared by every replicate.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialPopulation {
    abundances: Vec<f64>,
    traits: Vec<TraitVector>,
}

impl InitialPopulation {
    /// Create initial conditions from plain vectors.
    ///
    /// Requires at least one population, one abundance per trait vector, a
    /// common non-zero trait dimension, positive finite abundances and finite
    /// traits.
    pub fn new(abundances: Vec<f64>, traits: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_vectors(abundances, traits.into_iter().map(DVector::from_vec).collect())
    }

    /// Create initial conditions from trait vectors.
    pub fn from_vectors(abundances: Vec<f64>, traits: Vec<TraitVector>) -> Result<Self> {
        if traits.is_empty() {
            return Err(SimError::EmptyInput("initial traits"));
        }
        if abundances.is_empty() {
            return Err(SimError::EmptyInput("initial abundances"));
        }
        if abundances.len() != traits.len() {
            return Err(SimError::mismatch(
                "initial abundances (one per trait vector)",
                traits.len(),
                abundances.len(),
            ));
        }
        let q = traits[0].len();
        if q == 0 {
            return Err(SimError::EmptyInput("initial trait vector"));
        }
        if let Some(v) = traits.iter().find(|v| v.len() != q) {
            return Err(SimError::mismatch("initial trait vector length", q, v.len()));
        }
        if let Some(n) = abundances.iter().find(|n| !n.is_finite() || **n <= 0.0) {
            return Err(SimError::invalid(
                "initial abundances",
                format!("must be positive and finite, got {n}"),
            ));
        }
        if traits.iter().any(|v| v.iter().any(|x| !x.is_finite())) {
            return Err(SimError::invalid("initial traits", "must be finite"));
        }
        Ok(Self { abundances, traits })
    }

    /// Number of initial populations.
    pub fn len(&self) -> usize {
        self.abundances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abundances.is_empty()
    }

    /// Trait dimension.
    pub fn q(&self) -> usize {
        self.traits[0].len()
    }

    pub fn abundances(&self) -> &[f64] {
        &self.abundances
    }

    pub fn traits(&self) -> &[TraitVector] {
        &self.traits
    }

    pub(crate) fn check_dimension(&self, params: &EcoParams) -> Result<()> {
        if self.q() != params.q() {
            return Err(SimError::mismatch(
                "trait dimension of C/D vs initial traits",
                params.q(),
                self.q(),
            ));
        }
        Ok(())
    }
}

/// Parameters for adaptive-dynamics runs.
#[derive(Debug, Clone)]
pub struct AdaptiveParams {
    pub eco: EcoParams,
    /// Abundance at or below which a clone is removed.
    pub min_n: f64,
    /// Standard deviation of a mutant's trait offset from its parent.
    pub mut_sd: f64,
    /// Per-clone, per-step probability of producing a mutant.
    pub mut_prob: f64,
    /// Fraction of the parent's abundance handed to a new mutant.
    pub mut_split: f64,
    /// Standard deviation of the per-replicate jitter on initial traits.
    pub sigma_v0: f64,
    /// Standard deviation of the log-scale noise on abundance growth.
    pub sigma_n: f64,
    /// Keep trait values non-negative (truncated-normal perturbations).
    pub keep_pos: bool,
    /// Hard bound on the number of live clones.
    pub max_clones: usize,
    /// Number of time steps.
    pub max_t: usize,
    /// Snapshot interval in steps; 0 records only the final step.
    pub save_every: usize,
}

impl AdaptiveParams {
    /// Parameters with default evolutionary settings.
    pub fn new(eco: EcoParams) -> Self {
        Self {
            eco,
            min_n: 1e-4,
            mut_sd: 0.1,
            mut_prob: 0.01,
            mut_split: 0.01,
            sigma_v0: 0.0,
            sigma_n: 0.0,
            keep_pos: false,
            max_clones: 1_000,
            max_t: 1_000,
            save_every: 10,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_non_negative("min_n", self.min_n)?;
        check_non_negative("mut_sd", self.mut_sd)?;
        check_probability("mut_prob", self.mut_prob)?;
        if !(self.mut_split > 0.0 && self.mut_split < 1.0) {
            return Err(SimError::invalid(
                "mut_split",
                format!("must lie strictly between 0 and 1, got {}", self.mut_split),
            ));
        }
        check_non_negative("sigma_v0", self.sigma_v0)?;
        check_non_negative("sigma_n", self.sigma_n)?;
        if self.max_clones == 0 {
            return Err(SimError::invalid("max_clones", "must be at least 1"));
        }
        if self.max_t == 0 {
            return Err(SimError::invalid("max_t", "must be at least 1"));
        }
        Ok(())
    }

    pub(crate) fn validate_with(&self, initial: &InitialPopulation) -> Result<()> {
        self.validate()?;
        initial.check_dimension(&self.eco)?;
        if initial.len() > self.max_clones {
            return Err(SimError::invalid(
                "max_clones",
                format!(
                    "{} initial clones exceed the capacity of {}",
                    initial.len(),
                    self.max_clones
                ),
            ));
        }
        Ok(())
    }
}

/// Parameters for quantitative-genetics runs.
#[derive(Debug, Clone)]
pub struct QuantGenParams {
    pub eco: EcoParams,
    /// Additive genetic variance: one value per species, or a single value
    /// shared by all species.
    pub add_var: Vec<f64>,
    /// Abundance at or below which a species is removed.
    pub min_n: f64,
    /// Standard deviation of the one-off trait perturbation after settling.
    pub mut_sd: f64,
    /// Standard deviation of the per-replicate jitter on initial traits.
    pub sigma_v0: f64,
    /// Standard deviation of the log-scale noise on abundance growth.
    pub sigma_n: f64,
    /// Per-trait standard deviation of the noise on trait means; empty
    /// disables it.
    pub sigma_v: Vec<f64>,
    /// Keep trait values non-negative.
    pub keep_pos: bool,
    /// Settling steps run before the perturbation, never recorded.
    pub start_t: usize,
    /// Main-phase steps.
    pub max_t: usize,
    /// Snapshot interval; 0 returns final states only.
    pub save_every: usize,
}

impl QuantGenParams {
    /// Parameters with default settings and a shared additive variance.
    pub fn new(eco: EcoParams, add_var: f64) -> Self {
        Self {
            eco,
            add_var: vec![add_var],
            min_n: 1e-4,
            mut_sd: 0.0,
            sigma_v0: 0.0,
            sigma_n: 0.0,
            sigma_v: Vec::new(),
            keep_pos: false,
            start_t: 0,
            max_t: 1_000,
            save_every: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.add_var.is_empty() {
            return Err(SimError::EmptyInput("add_var"));
        }
        for &s in &self.add_var {
            check_non_negative("add_var", s)?;
        }
        check_non_negative("min_n", self.min_n)?;
        check_non_negative("mut_sd", self.mut_sd)?;
        check_non_negative("sigma_v0", self.sigma_v0)?;
        check_non_negative("sigma_n", self.sigma_n)?;
        if !self.sigma_v.is_empty() && self.sigma_v.len() != self.eco.q() {
            return Err(SimError::mismatch("sigma_v (one per trait)", self.eco.q(), self.sigma_v.len()));
        }
        for &s in &self.sigma_v {
            check_non_negative("sigma_v", s)?;
        }
        if self.max_t == 0 {
            return Err(SimError::invalid("max_t", "must be at least 1"));
        }
        Ok(())
    }

    pub(crate) fn validate_with(&self, initial: &InitialPopulation) -> Result<()> {
        self.validate()?;
        initial.check_dimension(&self.eco)?;
        self.add_var_for(initial.len()).map(|_| ())
    }

    /// Additive variance for `n` species, broadcasting a single value.
    pub fn add_var_for(&self, n: usize) -> Result<Vec<f64>> {
        match self.add_var.len() {
            1 => Ok(vec![self.add_var[0]; n]),
            len if len == n => Ok(self.add_var.clone()),
            len => Err(SimError::mismatch("add_var (one per species)", n, len)),
        }
    }
}

/// How a run is executed.
///
/// Results depend on the seed but never on the worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Worker-pool size; 0 or 1 runs on the calling thread.
    pub threads: usize,
    /// Run-level seed; `None` draws one from entropy.
    pub seed: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            seed: None,
        }
    }
}

impl RunOptions {
    pub fn new(threads: usize, seed: Option<u64>) -> Self {
        Self { threads, seed }
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimError::invalid(
            name,
            format!("must be finite and >= 0, got {value}"),
        ));
    }
    Ok(())
}

fn check_probability(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SimError::invalid(
            name,
            format!("must be between 0.0 and 1.0, got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eco(q: usize) -> EcoParams {
        EcoParams::with_eta(0.1, 0.5, 1.0, 0.0, 1.0, q).unwrap()
    }

    #[test]
    fn test_initial_population_rejects_empty() {
        assert_eq!(
            InitialPopulation::new(vec![], vec![]).unwrap_err(),
            SimError::EmptyInput("initial traits")
        );
        assert_eq!(
            InitialPopulation::new(vec![1.0], vec![vec![]]).unwrap_err(),
            SimError::EmptyInput("initial trait vector")
        );
    }

    #[test]
    fn test_initial_population_rejects_mismatch() {
        let err = InitialPopulation::new(vec![1.0], vec![vec![0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, SimError::DimensionMismatch { .. }));
        let err = InitialPopulation::new(vec![1.0, 1.0], vec![vec![0.0], vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, SimError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_initial_population_rejects_non_positive_abundance() {
        let err = InitialPopulation::new(vec![0.0], vec![vec![0.0]]).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { .. }));
    }

    #[test]
    fn test_dimension_checked_against_matrices() {
        let init = InitialPopulation::new(vec![1.0], vec![vec![0.0, 1.0]]).unwrap();
        let params = AdaptiveParams::new(eco(3));
        assert!(matches!(
            params.validate_with(&init),
            Err(SimError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_adaptive_validation() {
        let mut params = AdaptiveParams::new(eco(1));
        assert!(params.validate().is_ok());
        params.mut_prob = 1.5;
        assert!(params.validate().is_err());
        params.mut_prob = 0.5;
        params.max_clones = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_capacity_must_hold_initial_clones() {
        let init = InitialPopulation::new(vec![1.0, 1.0], vec![vec![0.0], vec![1.0]]).unwrap();
        let mut params = AdaptiveParams::new(eco(1));
        params.max_clones = 1;
        assert!(params.validate_with(&init).is_err());
    }

    #[test]
    fn test_add_var_broadcast() {
        let mut params = QuantGenParams::new(eco(1), 0.05);
        assert_eq!(params.add_var_for(3).unwrap(), vec![0.05; 3]);
        params.add_var = vec![0.1, 0.2];
        assert_eq!(params.add_var_for(2).unwrap(), vec![0.1, 0.2]);
        assert!(params.add_var_for(3).is_err());
    }

    #[test]
    fn test_sigma_v_length() {
        let mut params = QuantGenParams::new(eco(2), 0.05);
        params.sigma_v = vec![0.1];
        assert!(matches!(
            params.validate(),
            Err(SimError::DimensionMismatch { .. })
        ));
        params.sigma_v = vec![0.1, 0.0];
        assert!(params.validate().is_ok());
    }
}
