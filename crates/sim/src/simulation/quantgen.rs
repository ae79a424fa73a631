//! Quantitative-genetics replicate: a fixed set of species whose trait means
//! climb their selection gradients.
//!
//! A replicate settles for `start_t` unrecorded steps, optionally receives a
//! one-off trait perturbation of size `mut_sd`, then runs `max_t` recorded
//! steps. Each step updates traits and abundances from the same snapshot:
//!
//! ```text
//! V_i' = V_i + add_var_i·g_i (+ sigma_v noise per trait)
//! N_i' = N_i·exp(F_i + sigma_n·Z)
//! ```
//!
//! after which species at or below `min_n` are removed. Species keep their
//! initial index as id for the whole run.

use crate::ecology::{Community, TraitVector};
use crate::errors::{Result, SimError};
use crate::simulation::noise::{gaussian, perturb_traits};
use crate::simulation::{History, InitialPopulation, QuantGenParams, RunMonitor, TimeSlice};
use rand::Rng;
use tracing::{trace, warn};

/// Outcome of one finished replicate.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantGenSummary {
    /// Recorded snapshots; empty when `save_every == 0`.
    pub history: History,
    /// Survivors after the last step, stamped with the steps run.
    pub final_state: TimeSlice,
    /// Mean log growth of the survivors, NaN if none survive.
    pub fitness: f64,
    /// Euclidean norm of all selection gradients, NaN if none survive.
    pub selection: f64,
}

/// State of one quantitative-genetics replicate.
#[derive(Debug, Clone)]
pub struct QuantGenReplicate {
    ids: Vec<u64>,
    abundances: Vec<f64>,
    traits: Vec<TraitVector>,
    add_var: Vec<f64>,
    history: History,
}

impl QuantGenReplicate {
    pub fn new<R: Rng + ?Sized>(
        initial: &InitialPopulation,
        params: &QuantGenParams,
        rng: &mut R,
    ) -> Result<Self> {
        let add_var = params.add_var_for(initial.len())?;
        let traits = initial
            .traits()
            .iter()
            .map(|v| {
                if params.sigma_v0 > 0.0 {
                    perturb_traits(v, params.sigma_v0, params.keep_pos, rng)
                } else {
                    v.clone()
                }
            })
            .collect();
        Ok(Self {
            ids: (0..initial.len() as u64).collect(),
            abundances: initial.abundances().to_vec(),
            traits,
            add_var,
            history: History::new(),
        })
    }

    /// Number of surviving species.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_extinct(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn abundances(&self) -> &[f64] {
        &self.abundances
    }

    pub fn traits(&self) -> &[TraitVector] {
        &self.traits
    }

    /// Advance one step. Returns `true` once every species is gone.
    pub fn step<R: Rng + ?Sized>(&mut self, params: &QuantGenParams, rng: &mut R) -> bool {
        let (fitness, selection) =
            Community::new_unchecked(&self.traits, &self.abundances).fitness_and_selection(&params.eco);

        for i in 0..self.len() {
            let mut v = &self.traits[i] + &selection[i] * self.add_var[i];
            for (x, &sd) in v.iter_mut().zip(&params.sigma_v) {
                *x += gaussian(sd, rng);
            }
            if params.keep_pos {
                v.apply(|x| *x = x.max(0.0));
            }
            self.traits[i] = v;
            self.abundances[i] *= (fitness[i] + gaussian(params.sigma_n, rng)).exp();
        }

        let overflowed = self.remove_extinct(params.min_n);
        if overflowed > 0 {
            warn!(overflowed, "abundance overflowed; removing species");
        }
        self.is_extinct()
    }

    /// Offset every trait by `N(0, mut_sd²)`.
    pub fn perturb<R: Rng + ?Sized>(&mut self, params: &QuantGenParams, rng: &mut R) {
        for v in &mut self.traits {
            *v = perturb_traits(v, params.mut_sd, params.keep_pos, rng);
        }
    }

    /// Mean fitness and overall selection strength of the current survivors.
    pub fn diagnostics(&self, params: &QuantGenParams) -> (f64, f64) {
        if self.is_extinct() {
            return (f64::NAN, f64::NAN);
        }
        let (fitness, selection) =
            Community::new_unchecked(&self.traits, &self.abundances).fitness_and_selection(&params.eco);
        let mean = fitness.iter().sum::<f64>() / fitness.len() as f64;
        let norm = selection.iter().map(|g| g.norm_squared()).sum::<f64>().sqrt();
        (mean, norm)
    }

    /// Settle, perturb, and run the recorded phase.
    pub fn run<R: Rng + ?Sized>(
        mut self,
        rep: usize,
        params: &QuantGenParams,
        rng: &mut R,
        monitor: &dyn RunMonitor,
    ) -> Result<QuantGenSummary> {
        let mut all_gone = self.is_extinct();
        let mut t = 0;
        while !all_gone && t < params.start_t {
            if monitor.cancel_requested() {
                return Err(SimError::Cancelled);
            }
            all_gone = self.step(params, rng);
            t += 1;
        }
        if all_gone {
            trace!(rep, t, "extinct while settling");
        } else if params.mut_sd > 0.0 {
            self.perturb(params, rng);
        }

        let mut t = 0;
        while !all_gone && t < params.max_t {
            if monitor.cancel_requested() {
                return Err(SimError::Cancelled);
            }
            all_gone = self.step(params, rng);
            if params.save_every > 0
                && (t % params.save_every == 0 || t + 1 == params.max_t || all_gone)
            {
                let slice = self.slice(t);
                self.history.push(slice);
            }
            monitor.step_finished(rep, t);
            t += 1;
        }

        let (fitness, selection) = self.diagnostics(params);
        Ok(QuantGenSummary {
            final_state: self.slice(t),
            history: self.history,
            fitness,
            selection,
        })
    }

    /// Drop species at or below `min_n`. Returns how many were dropped because
    /// their abundance stopped being finite.
    fn remove_extinct(&mut self, min_n: f64) -> usize {
        let overflowed = self.abundances.iter().filter(|n| !n.is_finite()).count();
        let keep: Vec<bool> = self
            .abundances
            .iter()
            .map(|n| n.is_finite() && *n > min_n)
            .collect();
        if keep.iter().all(|&k| k) {
            return overflowed;
        }
        retain_by_mask(&mut self.ids, &keep);
        retain_by_mask(&mut self.abundances, &keep);
        retain_by_mask(&mut self.traits, &keep);
        retain_by_mask(&mut self.add_var, &keep);
        overflowed
    }

    fn slice(&self, t: usize) -> TimeSlice {
        let mut slice = TimeSlice::new(t);
        for ((id, n), v) in self.ids.iter().zip(&self.abundances).zip(&self.traits) {
            slice.push(*id, *n, v);
        }
        slice
    }
}

fn retain_by_mask<T>(values: &mut Vec<T>, keep: &[bool]) {
    let mut i = 0;
    values.retain(|_| {
        let k = keep[i];
        i += 1;
        k
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecology::EcoParams;
    use crate::simulation::NoMonitor;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn single_trait(r0: f64) -> QuantGenParams {
        let eco = EcoParams::with_eta(0.1, 0.5, r0, 0.0, 1.0, 1).unwrap();
        let mut p = QuantGenParams::new(eco, 0.05);
        p.max_t = 20;
        p
    }

    #[test]
    fn test_zero_variance_freezes_traits() {
        let mut p = single_trait(1.0);
        p.add_var = vec![0.0];
        let init = InitialPopulation::new(vec![1.0, 2.0], vec![vec![0.3], vec![0.9]]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let summary = QuantGenReplicate::new(&init, &p, &mut rng)
            .unwrap()
            .run(0, &p, &mut rng, &NoMonitor)
            .unwrap();
        assert_eq!(summary.final_state.traits[0][0], 0.3);
        assert_eq!(summary.final_state.traits[1][0], 0.9);
        assert_eq!(summary.final_state.time, 20);
        assert!(summary.history.slices().is_empty());
    }

    #[test]
    fn test_extinct_replicate_reports_nan() {
        let mut p = single_trait(-10.0);
        p.save_every = 1;
        let init = InitialPopulation::new(vec![1.0], vec![vec![0.0]]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let summary = QuantGenReplicate::new(&init, &p, &mut rng)
            .unwrap()
            .run(0, &p, &mut rng, &NoMonitor)
            .unwrap();
        assert!(summary.final_state.is_empty());
        assert!(summary.fitness.is_nan());
        assert!(summary.selection.is_nan());
        assert!(summary.history.slices().last().unwrap().is_empty());
    }

    #[test]
    fn test_removal_keeps_columns_aligned() {
        let p = single_trait(1.0);
        let init = InitialPopulation::new(vec![1.0, 1.0, 1.0], vec![vec![0.0], vec![1.0], vec![2.0]])
            .unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let mut rep = QuantGenReplicate::new(&init, &p, &mut rng).unwrap();
        rep.abundances[1] = 0.0;
        assert_eq!(rep.remove_extinct(p.min_n), 0);
        assert_eq!(rep.ids, vec![0, 2]);
        assert_eq!(rep.traits[1][0], 2.0);
        assert_eq!(rep.add_var.len(), 2);
    }

    #[test]
    fn test_keep_pos_clamps_traits() {
        let mut p = single_trait(1.0);
        p.keep_pos = true;
        p.sigma_v = vec![1.0];
        let init = InitialPopulation::new(vec![1.0], vec![vec![0.0]]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        let mut rep = QuantGenReplicate::new(&init, &p, &mut rng).unwrap();
        for _ in 0..50 {
            rep.step(&p, &mut rng);
            assert!(rep.traits().iter().all(|v| v[0] >= 0.0));
        }
    }

    #[test]
    fn test_overflow_is_reported() {
        let p = single_trait(1.0);
        let init = InitialPopulation::new(vec![1.0, 1.0], vec![vec![0.0], vec![1.0]]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(6);
        let mut rep = QuantGenReplicate::new(&init, &p, &mut rng).unwrap();
        rep.abundances[0] = f64::INFINITY;
        assert_eq!(rep.remove_extinct(p.min_n), 1);
        assert_eq!(rep.ids, vec![1]);
    }

    #[test]
    fn test_perturbation_lands_between_settling_and_first_snapshot() {
        let run = |mut_sd: f64| {
            let mut p = single_trait(1.0);
            p.add_var = vec![0.0];
            p.start_t = 3;
            p.mut_sd = mut_sd;
            p.max_t = 3;
            p.save_every = 1;
            let init = InitialPopulation::new(vec![1.0], vec![vec![0.5]]).unwrap();
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
            QuantGenReplicate::new(&init, &p, &mut rng)
                .unwrap()
                .run(0, &p, &mut rng, &NoMonitor)
                .unwrap()
        };

        let perturbed = run(0.5);
        let slices = perturbed.history.slices();
        assert_eq!(slices.len(), 3);
        let first = slices[0].traits[0][0];
        assert_ne!(first, 0.5);
        assert!(slices.iter().all(|s| s.traits[0][0] == first));
        assert_eq!(perturbed.final_state.traits[0][0], first);

        let unperturbed = run(0.0);
        assert!(unperturbed
            .history
            .slices()
            .iter()
            .all(|s| s.traits[0][0] == 0.5));
    }

    #[test]
    fn test_diagnostics_average_fitness_and_pool_gradients() {
        let eco = EcoParams::with_eta(0.2, 0.3, 1.0, 0.1, 0.5, 2).unwrap();
        let p = QuantGenParams::new(eco, 0.05);
        let abundances = vec![1.5, 0.4];
        let traits = vec![vec![0.3, 0.8], vec![1.2, 0.1]];
        let init = InitialPopulation::new(abundances.clone(), traits).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(8);
        let rep = QuantGenReplicate::new(&init, &p, &mut rng).unwrap();

        let (f, g) =
            Community::new(init.traits(), &abundances, &p.eco).unwrap().fitness_and_selection(&p.eco);
        let expected_mean = (f[0] + f[1]) / 2.0;
        let expected_norm =
            (g[0][0].powi(2) + g[0][1].powi(2) + g[1][0].powi(2) + g[1][1].powi(2)).sqrt();

        let (mean, norm) = rep.diagnostics(&p);
        assert!((mean - expected_mean).abs() < 1e-12);
        assert!((norm - expected_norm).abs() < 1e-12);
        // Neither value collapses to a single species' contribution.
        assert!((mean - f[0]).abs() > 1e-6 && (mean - f[1]).abs() > 1e-6);
        assert!(norm > g[0].norm() + 1e-6 && norm > g[1].norm() + 1e-6);
    }

    #[test]
    fn test_settling_is_not_recorded() {
        let mut p = single_trait(1.0);
        p.start_t = 15;
        p.max_t = 5;
        p.save_every = 2;
        let init = InitialPopulation::new(vec![1.0], vec![vec![0.1]]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let summary = QuantGenReplicate::new(&init, &p, &mut rng)
            .unwrap()
            .run(0, &p, &mut rng, &NoMonitor)
            .unwrap();
        let times: Vec<usize> = summary.history.slices().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0, 2, 4]);
    }
}
