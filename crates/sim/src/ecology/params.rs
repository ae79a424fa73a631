//! Ecological parameters shared by both regimes.

use crate::errors::{Result, SimError};
use nalgebra::DMatrix;

/// Immutable ecological parameters for one run.
///
/// `C` is only ever used through `C + Cᵗ` in derivatives, and likewise `D`;
/// both symmetrised forms are computed once here.
#[derive(Debug, Clone, PartialEq)]
pub struct EcoParams {
    f: f64,
    a0: f64,
    r0: f64,
    c: DMatrix<f64>,
    d: DMatrix<f64>,
    cc: DMatrix<f64>,
    dd: DMatrix<f64>,
}

impl EcoParams {
    /// Create parameters from the trait-cost matrix `c` and the
    /// competition-distance matrix `d`. Both must be square with the same
    /// dimension `q >= 1`.
    pub fn new(f: f64, a0: f64, r0: f64, c: DMatrix<f64>, d: DMatrix<f64>) -> Result<Self> {
        for (name, value) in [("f", f), ("a0", a0), ("r0", r0)] {
            if !value.is_finite() {
                return Err(SimError::invalid(name, format!("must be finite, got {value}")));
            }
        }
        let q = c.nrows();
        if q == 0 {
            return Err(SimError::EmptyInput("C"));
        }
        if c.ncols() != q {
            return Err(SimError::mismatch("C columns", q, c.ncols()));
        }
        if d.nrows() != q {
            return Err(SimError::mismatch("D rows", q, d.nrows()));
        }
        if d.ncols() != q {
            return Err(SimError::mismatch("D columns", q, d.ncols()));
        }
        if c.iter().chain(d.iter()).any(|x| !x.is_finite()) {
            return Err(SimError::invalid("C/D", "matrices must be finite"));
        }

        let cc = &c + c.transpose();
        let dd = &d + d.transpose();
        Ok(Self {
            f,
            a0,
            r0,
            c,
            d,
            cc,
            dd,
        })
    }

    /// Create parameters with `C` built from `eta` (see
    /// [`EcoParams::cost_matrix_from_eta`]) and `D = d·I`.
    pub fn with_eta(f: f64, a0: f64, r0: f64, eta: f64, d: f64, q: usize) -> Result<Self> {
        Self::new(
            f,
            a0,
            r0,
            Self::cost_matrix_from_eta(eta, q),
            DMatrix::identity(q, q) * d,
        )
    }

    /// Trait-cost matrix with unit diagonal and every off-diagonal cell `eta`.
    ///
    /// Positive `eta` makes investing in several traits at once costlier than
    /// the sum of the parts; negative `eta` makes it cheaper.
    pub fn cost_matrix_from_eta(eta: f64, q: usize) -> DMatrix<f64> {
        DMatrix::from_fn(q, q, |i, j| if i == j { 1.0 } else { eta })
    }

    /// Number of traits.
    pub fn q(&self) -> usize {
        self.c.nrows()
    }

    pub fn f(&self) -> f64 {
        self.f
    }

    pub fn a0(&self) -> f64 {
        self.a0
    }

    pub fn r0(&self) -> f64 {
        self.r0
    }

    pub fn c(&self) -> &DMatrix<f64> {
        &self.c
    }

    pub fn d(&self) -> &DMatrix<f64> {
        &self.d
    }

    /// `C + Cᵗ`.
    pub fn c_sym(&self) -> &DMatrix<f64> {
        &self.cc
    }

    /// `D + Dᵗ`.
    pub fn d_sym(&self) -> &DMatrix<f64> {
        &self.dd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_non_square_cost() {
        let c = DMatrix::zeros(2, 3);
        let d = DMatrix::identity(2, 2);
        let err = EcoParams::new(0.1, 0.5, 1.0, c, d).unwrap_err();
        assert!(matches!(err, SimError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_new_rejects_mismatched_distance() {
        let err = EcoParams::new(
            0.1,
            0.5,
            1.0,
            DMatrix::identity(2, 2),
            DMatrix::identity(3, 3),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_new_rejects_empty() {
        let err = EcoParams::new(0.1, 0.5, 1.0, DMatrix::zeros(0, 0), DMatrix::zeros(0, 0))
            .unwrap_err();
        assert_eq!(err, SimError::EmptyInput("C"));
    }

    #[test]
    fn test_eta_matrix() {
        let c = EcoParams::cost_matrix_from_eta(0.3, 3);
        assert_eq!(c[(0, 0)], 1.0);
        assert_eq!(c[(1, 1)], 1.0);
        assert_eq!(c[(0, 2)], 0.3);
        assert_eq!(c[(2, 1)], 0.3);
    }

    #[test]
    fn test_symmetrised_matrices() {
        let c = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 1.0]);
        let p = EcoParams::new(0.1, 0.5, 1.0, c, DMatrix::identity(2, 2) * 0.5).unwrap();
        assert_eq!(p.c_sym(), &DMatrix::from_row_slice(2, 2, &[2.0, 2.0, 2.0, 2.0]));
        assert_eq!(p.d_sym(), &DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]));
        assert_eq!(p.q(), 2);
    }
}
