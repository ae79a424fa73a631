//! Normal distribution truncated below at zero.
//!
//! Used to keep trait values non-negative when `keep_pos` is set. Sampling
//! uses plain rejection from the normal when the mean is non-negative and
//! Robert's (1995) exponential-proposal rejection otherwise, so deep
//! truncation stays efficient.

use crate::errors::{Result, SimError};
use rand::Rng;
use rand_distr::{Distribution, Exp1, StandardNormal};

/// `N(mu, sigma²)` conditioned on being `>= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruncatedNormal {
    mu: f64,
    sigma: f64,
}

impl TruncatedNormal {
    /// Create a truncated normal. `sigma` must be finite and non-negative.
    pub fn new(mu: f64, sigma: f64) -> Result<Self> {
        if !mu.is_finite() {
            return Err(SimError::invalid("mu", format!("must be finite, got {mu}")));
        }
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(SimError::invalid(
                "sigma",
                format!("must be finite and >= 0, got {sigma}"),
            ));
        }
        Ok(Self { mu, sigma })
    }

    /// Construct without checks; callers guarantee a finite `mu` and a
    /// finite, non-negative `sigma`.
    pub(crate) fn new_unchecked(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Distribution<f64> for TruncatedNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.sigma == 0.0 {
            return self.mu.max(0.0);
        }
        // Lower bound on the standard scale.
        let a = -self.mu / self.sigma;
        let z = if a <= 0.0 {
            loop {
                let z: f64 = StandardNormal.sample(rng);
                if z >= a {
                    break z;
                }
            }
        } else {
            let lambda = 0.5 * (a + (a * a + 4.0).sqrt());
            loop {
                let e: f64 = Exp1.sample(rng);
                let z = a + e / lambda;
                let rho = (-0.5 * (z - lambda) * (z - lambda)).exp();
                if rng.random::<f64>() <= rho {
                    break z;
                }
            }
        };
        (self.mu + self.sigma * z).max(0.0)
    }
}

/// Draw `n` values with a shared mean and standard deviation.
pub fn trunc_rnorm<R: Rng + ?Sized>(n: usize, mu: f64, sigma: f64, rng: &mut R) -> Result<Vec<f64>> {
    let dist = TruncatedNormal::new(mu, sigma)?;
    Ok((0..n).map(|_| dist.sample(rng)).collect())
}

/// Draw one value per mean, all with standard deviation `sigma`.
pub fn trunc_rnorm_mu<R: Rng + ?Sized>(mu: &[f64], sigma: f64, rng: &mut R) -> Result<Vec<f64>> {
    mu.iter()
        .map(|&m| TruncatedNormal::new(m, sigma).map(|d| d.sample(rng)))
        .collect()
}

/// Draw one value per standard deviation, all with mean `mu`.
pub fn trunc_rnorm_sigma<R: Rng + ?Sized>(mu: f64, sigma: &[f64], rng: &mut R) -> Result<Vec<f64>> {
    sigma
        .iter()
        .map(|&s| TruncatedNormal::new(mu, s).map(|d| d.sample(rng)))
        .collect()
}

/// Draw one value per `(mu[i], sigma[i])` pair.
pub fn trunc_rnorm_mu_sigma<R: Rng + ?Sized>(
    mu: &[f64],
    sigma: &[f64],
    rng: &mut R,
) -> Result<Vec<f64>> {
    if mu.len() != sigma.len() {
        return Err(SimError::mismatch("sigma (one per mean)", mu.len(), sigma.len()));
    }
    mu.iter()
        .zip(sigma)
        .map(|(&m, &s)| TruncatedNormal::new(m, s).map(|d| d.sample(rng)))
        .collect()
}
