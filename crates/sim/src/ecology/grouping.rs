//! Greedy grouping of trait vectors into species.
//!
//! Vectors are processed in input order. Each one is compared against the
//! representatives found so far, in the order they were found, and joins the
//! first whose mean squared coordinate difference is below `precision²`.
//! A vector that matches no representative becomes a new one.
//!
//! This is not transitive clustering. If `a` and `c` are both within
//! tolerance of `b` but not of each other, they share a group only when `b`
//! comes first and becomes the representative. Results therefore depend on
//! input order.

use crate::ecology::TraitVector;

/// Mean of the squared coordinate differences.
fn mean_sq_diff(a: &TraitVector, b: &TraitVector) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    (a - b).norm_squared() / a.len() as f64
}

/// Run the greedy pass, returning representative indices and a group id per
/// input (the position of its representative in the first list).
fn assign(traits: &[TraitVector], precision: f64) -> (Vec<usize>, Vec<usize>) {
    let threshold = precision * precision;
    let mut reps: Vec<usize> = Vec::new();
    let mut groups = Vec::with_capacity(traits.len());

    for (i, v) in traits.iter().enumerate() {
        match reps
            .iter()
            .position(|&r| mean_sq_diff(v, &traits[r]) < threshold)
        {
            Some(g) => groups.push(g),
            None => {
                groups.push(reps.len());
                reps.push(i);
            }
        }
    }

    (reps, groups)
}

/// Indices of the vectors that represent distinct species, in input order.
pub fn unique_species(traits: &[TraitVector], precision: f64) -> Vec<usize> {
    assign(traits, precision).0
}

/// A 0-based species id for every vector; ids are numbered in order of first
/// appearance.
pub fn group_species(traits: &[TraitVector], precision: f64) -> Vec<usize> {
    assign(traits, precision).1
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    fn tv(x: &[f64]) -> TraitVector {
        DVector::from_row_slice(x)
    }

    #[test]
    fn test_identical_vectors_collapse() {
        let traits = vec![tv(&[1.0, 2.0]), tv(&[1.0, 2.0]), tv(&[3.0, 0.0])];
        assert_eq!(unique_species(&traits, 0.1), vec![0, 2]);
        assert_eq!(group_species(&traits, 0.1), vec![0, 0, 1]);
    }

    #[test]
    fn test_threshold_is_strict() {
        // Mean squared difference of exactly precision² stays separate.
        let traits = vec![tv(&[0.0]), tv(&[0.5])];
        assert_eq!(group_species(&traits, 0.5), vec![0, 1]);
        assert_eq!(group_species(&traits, 0.5001), vec![0, 0]);
    }

    #[test]
    fn test_order_sensitivity() {
        // a=0.0, b=0.6, c=1.2 with precision 0.7: a~b, b~c, but not a~c.
        let a = tv(&[0.0]);
        let b = tv(&[0.6]);
        let c = tv(&[1.2]);
        assert_eq!(group_species(&[a.clone(), b.clone(), c.clone()], 0.7), vec![0, 0, 1]);
        assert_eq!(group_species(&[b.clone(), a.clone(), c.clone()], 0.7), vec![0, 0, 0]);
        assert_eq!(unique_species(&[b, a, c], 0.7), vec![0]);
    }

    #[test]
    fn test_first_matching_representative_wins() {
        let traits = vec![tv(&[0.0]), tv(&[1.0]), tv(&[0.45])];
        // 0.45 is within 0.5 of both representatives; the earlier one wins.
        assert_eq!(group_species(&traits, 0.6), vec![0, 1, 0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(unique_species(&[], 0.1).is_empty());
        assert!(group_species(&[], 0.1).is_empty());
    }
}
