//! Analytic Jacobian blocks against central finite differences of the
//! one-step map.

use nalgebra::{DMatrix, DVector};
use traitdyn_sim::ecology::{jacobian, Community, EcoParams, TraitVector};

const H: f64 = 1e-6;

fn params() -> EcoParams {
    EcoParams::new(
        0.1,
        0.05,
        1.0,
        DMatrix::from_row_slice(2, 2, &[1.0, 0.3, -0.1, 0.8]),
        DMatrix::from_row_slice(2, 2, &[0.4, 0.1, 0.0, 0.2]),
    )
    .unwrap()
}

fn state() -> (Vec<TraitVector>, Vec<f64>, Vec<f64>) {
    let traits = vec![
        DVector::from_vec(vec![0.3, 0.9]),
        DVector::from_vec(vec![1.2, 0.4]),
        DVector::from_vec(vec![0.6, 0.6]),
    ];
    (traits, vec![2.0, 4.5, 1.3], vec![0.05, 0.1, 0.02])
}

/// Flatten species-major: each species' traits then (optionally) abundance.
fn pack(traits: &[TraitVector], abundances: &[f64], with_n: bool) -> Vec<f64> {
    let mut x = Vec::new();
    for (v, n) in traits.iter().zip(abundances) {
        x.extend(v.iter());
        if with_n {
            x.push(*n);
        }
    }
    x
}

fn unpack(x: &[f64], q: usize, abundances: &[f64], with_n: bool) -> (Vec<TraitVector>, Vec<f64>) {
    let stride = if with_n { q + 1 } else { q };
    let traits = x
        .chunks_exact(stride)
        .map(|c| DVector::from_row_slice(&c[..q]))
        .collect();
    let n = if with_n {
        x.chunks_exact(stride).map(|c| c[q]).collect()
    } else {
        abundances.to_vec()
    };
    (traits, n)
}

fn finite_difference(with_n: bool) -> DMatrix<f64> {
    let p = params();
    let (traits, abundances, add_var) = state();
    let q = p.q();
    let x0 = pack(&traits, &abundances, with_n);
    let dim = x0.len();
    let step = |x: &[f64]| {
        let (v, n) = unpack(x, q, &abundances, with_n);
        let (v2, n2) = Community::new(&v, &n, &p).unwrap().advance(&p, &add_var);
        pack(&v2, &n2, with_n)
    };

    let mut jac = DMatrix::zeros(dim, dim);
    for col in 0..dim {
        let mut up = x0.clone();
        let mut down = x0.clone();
        up[col] += H;
        down[col] -= H;
        let (fu, fd) = (step(&up), step(&down));
        for row in 0..dim {
            jac[(row, col)] = (fu[row] - fd[row]) / (2.0 * H);
        }
    }
    jac
}

fn assert_close(analytic: &DMatrix<f64>, numeric: &DMatrix<f64>) {
    assert_eq!(analytic.shape(), numeric.shape());
    for r in 0..analytic.nrows() {
        for c in 0..analytic.ncols() {
            let (a, n) = (analytic[(r, c)], numeric[(r, c)]);
            let tol = 1e-5 * a.abs().max(1.0);
            assert!((a - n).abs() < tol, "({r}, {c}): analytic {a} vs numeric {n}");
        }
    }
}

#[test]
fn test_full_jacobian_matches_finite_difference() {
    let p = params();
    let (traits, abundances, add_var) = state();
    let analytic = jacobian(&traits, &abundances, &p, &add_var, false).unwrap();
    assert_eq!(analytic.shape(), (9, 9));
    assert_close(&analytic, &finite_difference(true));
}

#[test]
fn test_evolutionary_jacobian_matches_finite_difference() {
    let p = params();
    let (traits, abundances, add_var) = state();
    let analytic = jacobian(&traits, &abundances, &p, &add_var, true).unwrap();
    assert_eq!(analytic.shape(), (6, 6));
    assert_close(&analytic, &finite_difference(false));
}

#[test]
fn test_evolutionary_is_trait_submatrix_of_full() {
    let p = params();
    let (traits, abundances, add_var) = state();
    let full = jacobian(&traits, &abundances, &p, &add_var, false).unwrap();
    let evo = jacobian(&traits, &abundances, &p, &add_var, true).unwrap();
    let q = p.q();
    for i in 0..traits.len() {
        for k in 0..traits.len() {
            let a = full.view((i * (q + 1), k * (q + 1)), (q, q));
            let b = evo.view((i * q, k * q), (q, q));
            assert_eq!(a, b);
        }
    }
}
