//! Adaptive-dynamics replicate: asexual clones that grow, die out, and bud
//! off mutants.
//!
//! One step, all on the state at the start of the step:
//!
//! 1. every clone grows by `exp(F_i + sigma_n·Z)`;
//! 2. clones at or below `min_n` (or with a non-finite abundance) are removed
//!    and their slots freed;
//! 3. each survivor, in creation order, mutates with probability `mut_prob`.
//!    A mutant takes `mut_split` of the parent's abundance and a perturbed
//!    copy of its traits. It is dropped when the arena is full or when either
//!    share would fall at or below `min_n`;
//! 4. a snapshot is taken on `save_every` boundaries, on the last step, and
//!    when every clone is gone.

use crate::base::BoundedArena;
use crate::ecology::{Community, TraitVector};
use crate::errors::{Result, SimError};
use crate::simulation::noise::{gaussian, perturb_traits};
use crate::simulation::{AdaptiveParams, History, InitialPopulation, RunMonitor, TimeSlice};
use rand::Rng;
use tracing::{trace, warn};

/// A live clone.
#[derive(Debug, Clone, PartialEq)]
pub struct Lineage {
    /// Unique within the replicate; never reused.
    pub id: u64,
    pub abundance: f64,
    pub traits: TraitVector,
}

/// State of one adaptive-dynamics replicate.
#[derive(Debug, Clone)]
pub struct AdaptiveReplicate {
    clones: BoundedArena<Lineage>,
    next_id: u64,
    history: History,
    // Per-step scratch for the kernel.
    traits: Vec<TraitVector>,
    abundances: Vec<f64>,
}

impl AdaptiveReplicate {
    /// Seed the arena with the initial clones, jittering traits by
    /// `sigma_v0` when it is positive.
    pub fn new<R: Rng + ?Sized>(
        initial: &InitialPopulation,
        params: &AdaptiveParams,
        rng: &mut R,
    ) -> Result<Self> {
        let mut clones = BoundedArena::with_capacity(params.max_clones);
        for (i, (n, v)) in initial.abundances().iter().zip(initial.traits()).enumerate() {
            let traits = if params.sigma_v0 > 0.0 {
                perturb_traits(v, params.sigma_v0, params.keep_pos, rng)
            } else {
                v.clone()
            };
            let lineage = Lineage {
                id: i as u64,
                abundance: *n,
                traits,
            };
            if clones.insert(lineage).is_err() {
                return Err(SimError::invalid(
                    "max_clones",
                    format!("cannot hold {} initial clones", initial.len()),
                ));
            }
        }

        Ok(Self {
            clones,
            next_id: initial.len() as u64,
            history: History::new(),
            traits: Vec::with_capacity(params.max_clones),
            abundances: Vec::with_capacity(params.max_clones),
        })
    }

    /// Number of live clones.
    pub fn len(&self) -> usize {
        self.clones.len()
    }

    pub fn is_extinct(&self) -> bool {
        self.clones.is_empty()
    }

    /// Live clones in creation order.
    pub fn lineages(&self) -> impl Iterator<Item = &Lineage> + '_ {
        self.clones.iter()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn into_history(self) -> History {
        self.history
    }

    /// Advance one step. Returns `true` once every clone is gone.
    pub fn step<R: Rng + ?Sized>(&mut self, t: usize, params: &AdaptiveParams, rng: &mut R) -> bool {
        let overflowed = self.grow(params, rng);
        if overflowed > 0 {
            warn!(t, overflowed, "abundance overflowed; removing clones");
        }
        if params.mut_prob > 0.0 {
            self.mutate(params, rng);
        }

        let all_gone = self.clones.is_empty();
        let on_boundary = params.save_every > 0 && t % params.save_every == 0;
        if on_boundary || t + 1 == params.max_t || all_gone {
            self.snapshot(t);
        }
        all_gone
    }

    /// Run up to `max_t` steps, stopping early on extinction.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        rep: usize,
        params: &AdaptiveParams,
        rng: &mut R,
        monitor: &dyn RunMonitor,
    ) -> Result<()> {
        for t in 0..params.max_t {
            if monitor.cancel_requested() {
                return Err(SimError::Cancelled);
            }
            let all_gone = self.step(t, params, rng);
            monitor.step_finished(rep, t);
            if all_gone {
                trace!(rep, t, "all clones extinct");
                break;
            }
        }
        Ok(())
    }

    /// Apply one growth step and drop clones that fell to `min_n` or below.
    /// Returns how many clones were dropped because their abundance stopped
    /// being finite.
    fn grow<R: Rng + ?Sized>(&mut self, params: &AdaptiveParams, rng: &mut R) -> usize {
        self.traits.clear();
        self.abundances.clear();
        for clone in self.clones.iter() {
            self.traits.push(clone.traits.clone());
            self.abundances.push(clone.abundance);
        }
        let fitness = Community::new_unchecked(&self.traits, &self.abundances).fitness(&params.eco);

        let min_n = params.min_n;
        let mut fitness = fitness.into_iter();
        let mut overflowed = 0;
        self.clones.retain_mut(|clone| {
            let f = fitness.next().unwrap_or(f64::NEG_INFINITY);
            clone.abundance *= (f + gaussian(params.sigma_n, rng)).exp();
            if !clone.abundance.is_finite() {
                overflowed += 1;
                return false;
            }
            clone.abundance > min_n
        });
        overflowed
    }

    fn mutate<R: Rng + ?Sized>(&mut self, params: &AdaptiveParams, rng: &mut R) {
        let parents = self.clones.slots().to_vec();
        for slot in parents {
            if !rng.random_bool(params.mut_prob) || self.clones.is_full() {
                continue;
            }
            let Some(parent) = self.clones.get_mut(slot) else {
                continue;
            };
            let share = parent.abundance * params.mut_split;
            if share <= params.min_n || parent.abundance - share <= params.min_n {
                continue;
            }
            let traits = perturb_traits(&parent.traits, params.mut_sd, params.keep_pos, rng);
            parent.abundance -= share;

            let mutant = Lineage {
                id: self.next_id,
                abundance: share,
                traits,
            };
            if self.clones.insert(mutant).is_ok() {
                self.next_id += 1;
            }
        }
    }

    fn snapshot(&mut self, t: usize) {
        let mut slice = TimeSlice::new(t);
        for clone in self.clones.iter() {
            slice.push(clone.id, clone.abundance, &clone.traits);
        }
        self.history.push(slice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecology::EcoParams;
    use crate::simulation::NoMonitor;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn params(q: usize) -> AdaptiveParams {
        let mut p = AdaptiveParams::new(EcoParams::with_eta(0.1, 0.5, 1.0, 0.0, 1.0, q).unwrap());
        p.max_t = 50;
        p.save_every = 10;
        p
    }

    #[test]
    fn test_no_mutation_keeps_initial_ids() {
        let mut p = params(1);
        p.mut_prob = 0.0;
        let init = InitialPopulation::new(vec![1.0, 1.0], vec![vec![0.0], vec![1.0]]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let mut rep = AdaptiveReplicate::new(&init, &p, &mut rng).unwrap();
        rep.run(0, &p, &mut rng, &NoMonitor).unwrap();
        let ids: Vec<u64> = rep.lineages().map(|l| l.id).collect();
        assert_eq!(ids, vec![0, 1]);
        let times: Vec<usize> = rep.history().slices().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0, 10, 20, 30, 40, 49]);
    }

    #[test]
    fn test_capacity_is_respected() {
        let mut p = params(2);
        p.mut_prob = 1.0;
        p.mut_split = 0.5;
        p.max_clones = 5;
        p.max_t = 30;
        let init = InitialPopulation::new(vec![1.0], vec![vec![0.0, 0.0]]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let mut rep = AdaptiveReplicate::new(&init, &p, &mut rng).unwrap();
        for t in 0..p.max_t {
            rep.step(t, &p, &mut rng);
            assert!(rep.len() <= 5);
            assert!(rep.lineages().all(|l| l.abundance > p.min_n));
        }
    }

    #[test]
    fn test_mutant_ids_are_fresh() {
        let mut p = params(1);
        p.mut_prob = 1.0;
        p.mut_split = 0.1;
        p.max_clones = 4;
        let init = InitialPopulation::new(vec![1.0], vec![vec![0.2]]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let mut rep = AdaptiveReplicate::new(&init, &p, &mut rng).unwrap();
        rep.step(0, &p, &mut rng);
        let ids: Vec<u64> = rep.lineages().map(|l| l.id).collect();
        assert_eq!(ids, vec![0, 1]);
        let total: f64 = rep.lineages().map(|l| l.abundance).sum();
        let parent = rep.lineages().next().unwrap().abundance;
        assert!((parent / total - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_extinction_records_final_slice_and_stops() {
        let mut p = params(1);
        p.mut_prob = 0.0;
        // Negative intrinsic growth drives everything below min_n.
        p.eco = EcoParams::with_eta(0.0, 0.5, -5.0, 0.0, 1.0, 1).unwrap();
        let init = InitialPopulation::new(vec![1.0], vec![vec![0.0]]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        let mut rep = AdaptiveReplicate::new(&init, &p, &mut rng).unwrap();
        rep.run(0, &p, &mut rng, &NoMonitor).unwrap();
        assert!(rep.is_extinct());
        let last = rep.history().slices().last().unwrap();
        assert!(last.is_empty());
        assert!(last.time < p.max_t - 1);
    }

    #[test]
    fn test_overflow_is_counted_separately_from_extinction() {
        let mut p = params(1);
        p.mut_prob = 0.0;
        // No competition and a huge growth rate: N leaves f64 range within a few steps.
        p.eco = EcoParams::with_eta(0.0, 0.0, 100.0, 0.0, 1.0, 1).unwrap();
        let init = InitialPopulation::new(vec![1.0], vec![vec![0.0]]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(6);
        let mut rep = AdaptiveReplicate::new(&init, &p, &mut rng).unwrap();
        let mut overflowed = 0;
        for _ in 0..10 {
            overflowed += rep.grow(&p, &mut rng);
        }
        assert_eq!(overflowed, 1);
        assert!(rep.is_extinct());

        // Ordinary extinction is not reported as overflow.
        p.eco = EcoParams::with_eta(0.0, 0.5, -5.0, 0.0, 1.0, 1).unwrap();
        let mut rep = AdaptiveReplicate::new(&init, &p, &mut rng).unwrap();
        let mut overflowed = 0;
        while !rep.is_extinct() {
            overflowed += rep.grow(&p, &mut rng);
        }
        assert_eq!(overflowed, 0);
    }

    #[test]
    fn test_cancel_stops_before_first_step() {
        struct Always;
        impl RunMonitor for Always {
            fn cancel_requested(&self) -> bool {
                true
            }
        }
        let p = params(1);
        let init = InitialPopulation::new(vec![1.0], vec![vec![0.0]]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let mut rep = AdaptiveReplicate::new(&init, &p, &mut rng).unwrap();
        assert_eq!(rep.run(0, &p, &mut rng, &Always), Err(SimError::Cancelled));
        assert!(rep.history().slices().is_empty());
    }
}
