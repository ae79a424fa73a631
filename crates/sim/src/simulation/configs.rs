//! Serializable run configuration.
//!
//! A [`RunConfig`] fully describes a run and can be stored as JSON next to
//! its output to reproduce it. The regime is selected by the `regime` tag of
//! the `model` object:
//!
//! ```json
//! {
//!   "seed": 42,
//!   "n_reps": 8,
//!   "initial": { "abundances": [1.0], "traits": [[0.5, 0.5]] },
//!   "ecology": { "f": 0.1, "a0": 0.01, "r0": 1.0, "eta": 0.2, "d": 0.1 },
//!   "model": { "regime": "adaptive_dynamics", "max_t": 500 }
//! }
//! ```

use crate::ecology::EcoParams;
use crate::errors::{Result, SimError};
use crate::simulation::{AdaptiveParams, InitialPopulation, QuantGenParams, RunOptions};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The master configuration struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Run-level seed; omitted means a fresh seed from entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default = "default_n_reps")]
    pub n_reps: usize,
    /// Worker count; 0 or 1 runs on the calling thread.
    #[serde(default = "default_threads")]
    pub threads: usize,
    pub initial: InitialConfig,
    pub ecology: EcologyConfig,
    pub model: ModelConfig,
}

/// Starting abundances and traits, shared by all replicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialConfig {
    pub abundances: Vec<f64>,
    pub traits: Vec<Vec<f64>>,
}

/// A matrix given in full (rows) or as a scalar multiple of the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatrixConfig {
    Scalar(f64),
    Rows(Vec<Vec<f64>>),
}

/// Ecological constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcologyConfig {
    pub f: f64,
    pub a0: f64,
    pub r0: f64,
    /// Trait-cost matrix rows. When absent, `C` has a unit diagonal and
    /// `eta` everywhere else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub eta: f64,
    /// Competition-distance matrix.
    pub d: MatrixConfig,
}

impl EcologyConfig {
    /// Build validated parameters for `q` traits.
    pub fn build(&self, q: usize) -> Result<EcoParams> {
        let c = match &self.c {
            Some(rows) => matrix_from_rows("C", rows)?,
            None => EcoParams::cost_matrix_from_eta(self.eta, q),
        };
        let d = match &self.d {
            MatrixConfig::Scalar(x) => DMatrix::identity(q, q) * *x,
            MatrixConfig::Rows(rows) => matrix_from_rows("D", rows)?,
        };
        EcoParams::new(self.f, self.a0, self.r0, c, d)
    }
}

fn matrix_from_rows(name: &str, rows: &[Vec<f64>]) -> Result<DMatrix<f64>> {
    let ncols = rows.first().map_or(0, Vec::len);
    if let Some(row) = rows.iter().find(|r| r.len() != ncols) {
        return Err(SimError::mismatch(format!("{name} row length"), ncols, row.len()));
    }
    Ok(DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]))
}

/// Regime-specific settings, tagged by `regime`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "regime", rename_all = "snake_case")]
pub enum ModelConfig {
    AdaptiveDynamics(AdaptiveConfig),
    QuantitativeGenetics(QuantGenConfig),
}

impl ModelConfig {
    pub fn regime(&self) -> Regime {
        match self {
            Self::AdaptiveDynamics(_) => Regime::AdaptiveDynamics,
            Self::QuantitativeGenetics(_) => Regime::QuantitativeGenetics,
        }
    }
}

/// Which simulation regime a configuration selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    AdaptiveDynamics,
    QuantitativeGenetics,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdaptiveDynamics => write!(f, "adaptive_dynamics"),
            Self::QuantitativeGenetics => write!(f, "quantitative_genetics"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    #[serde(default = "default_min_n")]
    pub min_n: f64,
    #[serde(default = "default_mut_sd")]
    pub mut_sd: f64,
    #[serde(default = "default_mut_prob")]
    pub mut_prob: f64,
    #[serde(default = "default_mut_split")]
    pub mut_split: f64,
    #[serde(default)]
    pub sigma_v0: f64,
    #[serde(default)]
    pub sigma_n: f64,
    #[serde(default)]
    pub keep_pos: bool,
    #[serde(default = "default_max_clones")]
    pub max_clones: usize,
    #[serde(default = "default_max_t")]
    pub max_t: usize,
    #[serde(default = "default_save_every")]
    pub save_every: usize,
}

impl AdaptiveConfig {
    pub fn into_params(self, eco: EcoParams) -> AdaptiveParams {
        AdaptiveParams {
            eco,
            min_n: self.min_n,
            mut_sd: self.mut_sd,
            mut_prob: self.mut_prob,
            mut_split: self.mut_split,
            sigma_v0: self.sigma_v0,
            sigma_n: self.sigma_n,
            keep_pos: self.keep_pos,
            max_clones: self.max_clones,
            max_t: self.max_t,
            save_every: self.save_every,
        }
    }
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            min_n: default_min_n(),
            mut_sd: default_mut_sd(),
            mut_prob: default_mut_prob(),
            mut_split: default_mut_split(),
            sigma_v0: 0.0,
            sigma_n: 0.0,
            keep_pos: false,
            max_clones: default_max_clones(),
            max_t: default_max_t(),
            save_every: default_save_every(),
        }
    }
}

/// Additive genetic variance: one shared value or one per species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddVarConfig {
    Shared(f64),
    PerSpecies(Vec<f64>),
}

impl AddVarConfig {
    fn to_vec(&self) -> Vec<f64> {
        match self {
            Self::Shared(x) => vec![*x],
            Self::PerSpecies(v) => v.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantGenConfig {
    pub add_var: AddVarConfig,
    #[serde(default = "default_min_n")]
    pub min_n: f64,
    #[serde(default)]
    pub mut_sd: f64,
    #[serde(default)]
    pub sigma_v0: f64,
    #[serde(default)]
    pub sigma_n: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sigma_v: Vec<f64>,
    #[serde(default)]
    pub keep_pos: bool,
    #[serde(default)]
    pub start_t: usize,
    #[serde(default = "default_max_t")]
    pub max_t: usize,
    #[serde(default)]
    pub save_every: usize,
}

impl QuantGenConfig {
    pub fn into_params(self, eco: EcoParams) -> QuantGenParams {
        QuantGenParams {
            eco,
            add_var: self.add_var.to_vec(),
            min_n: self.min_n,
            mut_sd: self.mut_sd,
            sigma_v0: self.sigma_v0,
            sigma_n: self.sigma_n,
            sigma_v: self.sigma_v,
            keep_pos: self.keep_pos,
            start_t: self.start_t,
            max_t: self.max_t,
            save_every: self.save_every,
        }
    }
}

/// Fully validated inputs for one regime.
#[derive(Debug, Clone)]
pub enum ModelParams {
    Adaptive(AdaptiveParams),
    QuantGen(QuantGenParams),
}

impl RunConfig {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions::new(self.threads, self.seed)
    }

    pub fn initial_population(&self) -> Result<InitialPopulation> {
        InitialPopulation::new(self.initial.abundances.clone(), self.initial.traits.clone())
    }

    /// Resolve the initial population and regime parameters, checking
    /// everything that can be checked before a run starts.
    pub fn resolve(&self) -> Result<(InitialPopulation, ModelParams)> {
        if self.n_reps == 0 {
            return Err(SimError::NoReplicates);
        }
        let initial = self.initial_population()?;
        let eco = self.ecology.build(initial.q())?;
        let params = match self.model.clone() {
            ModelConfig::AdaptiveDynamics(cfg) => {
                let params = cfg.into_params(eco);
                params.validate_with(&initial)?;
                ModelParams::Adaptive(params)
            }
            ModelConfig::QuantitativeGenetics(cfg) => {
                let params = cfg.into_params(eco);
                params.validate_with(&initial)?;
                ModelParams::QuantGen(params)
            }
        };
        Ok((initial, params))
    }

    /// A small working example for `regime`.
    pub fn template(regime: Regime) -> Self {
        let initial = InitialConfig {
            abundances: vec![1.0, 1.0],
            traits: vec![vec![0.5, 0.5], vec![1.0, 0.1]],
        };
        let ecology = EcologyConfig {
            f: 0.1,
            a0: 0.01,
            r0: 1.0,
            c: None,
            eta: 0.2,
            d: MatrixConfig::Scalar(0.1),
        };
        let model = match regime {
            Regime::AdaptiveDynamics => ModelConfig::AdaptiveDynamics(AdaptiveConfig::default()),
            Regime::QuantitativeGenetics => ModelConfig::QuantitativeGenetics(QuantGenConfig {
                add_var: AddVarConfig::Shared(0.05),
                min_n: default_min_n(),
                mut_sd: 0.1,
                sigma_v0: 0.0,
                sigma_n: 0.0,
                sigma_v: Vec::new(),
                keep_pos: true,
                start_t: 100,
                max_t: default_max_t(),
                save_every: 0,
            }),
        };
        Self {
            seed: Some(42),
            n_reps: 4,
            threads: default_threads(),
            initial,
            ecology,
            model,
        }
    }
}

fn default_n_reps() -> usize {
    1
}
fn default_threads() -> usize {
    1
}
fn default_min_n() -> f64 {
    1e-4
}
fn default_mut_sd() -> f64 {
    0.1
}
fn default_mut_prob() -> f64 {
    0.01
}
fn default_mut_split() -> f64 {
    0.01
}
fn default_max_clones() -> usize {
    1_000
}
fn default_max_t() -> usize {
    1_000
}
fn default_save_every() -> usize {
    10
}
