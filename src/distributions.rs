//! Population distributions and the variate generator.
//!
//! # Supported Populations
//!
//! | Population | Sampler | Density curve |
//! |---|---|---|
//! | [`Population::Uniform`] | U(0,1) | constant |
//! | [`Population::Normal`] | Box–Muller, μ = 0.5, σ = 0.1 | N(0.5, 0.05) |
//! | [`Population::LeftSkewed`] | Beta(2, 5) | Beta(2, 5) |
//! | [`Population::RightSkewed`] | Beta(5, 2) | Beta(5, 2) |
//!
//! The Normal sampler is deliberately narrower than its density curve and
//! is **not** clamped: a draw outside `[0, 1]` is rare but legal.
//!
//! The two-group demo uses [`draw_group_sample`], which recenters the
//! drawn values so the realized mean equals the requested one exactly.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::{Beta, Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::special;
use crate::stats;

/// Centre of the Normal population.
pub const NORMAL_CENTER: f64 = 0.5;
/// Standard deviation of the Normal sampler.
pub const NORMAL_SAMPLER_SD: f64 = 0.1;
/// Variance of the Normal density curve.
pub const NORMAL_CURVE_VARIANCE: f64 = 0.05;
/// Beta shape parameters of the left-skewed population; mirrored for right.
pub const SKEW_SHAPE: (f64, f64) = (2.0, 5.0);
/// Number of density evaluations in a population shape curve.
pub const SHAPE_RESOLUTION: usize = 1000;

/// Population a CLT sample is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Population {
    #[default]
    #[serde(alias = "Uniform")]
    Uniform,
    #[serde(alias = "Normal")]
    Normal,
    #[serde(alias = "LeftSkewed")]
    LeftSkewed,
    #[serde(alias = "RightSkewed")]
    RightSkewed,
}

impl Population {
    pub const ALL: [Population; 4] = [
        Population::Uniform,
        Population::Normal,
        Population::LeftSkewed,
        Population::RightSkewed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Population::Uniform => "Uniform",
            Population::Normal => "Normal",
            Population::LeftSkewed => "LeftSkewed",
            Population::RightSkewed => "RightSkewed",
        }
    }

    /// Draws one variate.
    pub fn draw_one<R: Rng>(self, rng: &mut R) -> f64 {
        match self {
            Population::Uniform => rng.random::<f64>(),
            Population::Normal => box_muller(rng) * NORMAL_SAMPLER_SD + NORMAL_CENTER,
            Population::LeftSkewed | Population::RightSkewed => {
                let (a, b) = self.beta_shape();
                skew_beta(a, b).sample(rng)
            }
        }
    }

    /// Draws a sample of exactly `n` variates.
    ///
    /// # Examples
    /// ```
    /// use u_sampling::distributions::Population;
    /// use u_sampling::random::create_rng;
    /// let mut rng = create_rng(42);
    /// let s = Population::LeftSkewed.draw_sample(25, &mut rng);
    /// assert_eq!(s.len(), 25);
    /// assert!(s.iter().all(|x| (0.0..=1.0).contains(x)));
    /// ```
    pub fn draw_sample<R: Rng>(self, n: usize, rng: &mut R) -> Vec<f64> {
        match self {
            // Build the Beta sampler once per sample rather than per draw.
            Population::LeftSkewed | Population::RightSkewed => {
                let (a, b) = self.beta_shape();
                let beta = skew_beta(a, b);
                (0..n).map(|_| beta.sample(rng)).collect()
            }
            _ => (0..n).map(|_| self.draw_one(rng)).collect(),
        }
    }

    /// Population density at `x` (the curve drawn above the canvas).
    pub fn density(self, x: f64) -> f64 {
        match self {
            Population::Uniform => {
                if (0.0..=1.0).contains(&x) {
                    1.0
                } else {
                    0.0
                }
            }
            Population::Normal => special::normal_pdf(x, NORMAL_CENTER, NORMAL_CURVE_VARIANCE),
            Population::LeftSkewed | Population::RightSkewed => {
                let (a, b) = self.beta_shape();
                special::beta_pdf(x, a, b)
            }
        }
    }

    /// Density sampled at `i / resolution` for `i in 0..resolution`,
    /// scaled so the peak is 1.
    ///
    /// # Examples
    /// ```
    /// use u_sampling::distributions::Population;
    /// let shape = Population::Normal.shape(1000);
    /// assert_eq!(shape.len(), 1000);
    /// assert!((shape[500] - 1.0).abs() < 1e-12);
    /// ```
    pub fn shape(self, resolution: usize) -> Vec<f64> {
        let raw: Vec<f64> = (0..resolution)
            .map(|i| self.density(i as f64 / resolution as f64))
            .collect();
        let peak = stats::max(&raw).unwrap_or(0.0);
        if peak <= 0.0 {
            return raw;
        }
        raw.into_iter().map(|d| d / peak).collect()
    }

    fn beta_shape(self) -> (f64, f64) {
        match self {
            Population::RightSkewed => (SKEW_SHAPE.1, SKEW_SHAPE.0),
            _ => SKEW_SHAPE,
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Population {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "uniform" => Ok(Population::Uniform),
            "normal" => Ok(Population::Normal),
            "leftskewed" => Ok(Population::LeftSkewed),
            "rightskewed" => Ok(Population::RightSkewed),
            _ => Err(SimError::InvalidSelection {
                kind: "distribution",
                value: s.to_string(),
                expected: "Uniform, Normal, LeftSkewed, RightSkewed",
            }),
        }
    }
}

/// One standard normal deviate via the Box–Muller transform.
///
/// Zero uniforms are redrawn so `ln(u)` stays finite.
fn box_muller<R: Rng>(rng: &mut R) -> f64 {
    let mut u = 0.0;
    while u == 0.0 {
        u = rng.random::<f64>();
    }
    let mut v = 0.0;
    while v == 0.0 {
        v = rng.random::<f64>();
    }
    (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos()
}

fn skew_beta(a: f64, b: f64) -> Beta<f64> {
    Beta::new(a, b).expect("skew shape parameters are positive constants")
}

// ============================================================================
// Two-group samples
// ============================================================================

/// Size, target mean and variance of one group in the two-group demo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupParams {
    pub size: usize,
    pub mean: f64,
    pub variance: f64,
}

impl GroupParams {
    /// # Errors
    /// [`SimError::InvalidParameter`] for a zero size, a non-finite mean
    /// or a negative / non-finite variance.
    pub fn new(size: usize, mean: f64, variance: f64) -> Result<Self> {
        let params = Self {
            size,
            mean,
            variance,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(SimError::InvalidParameter("group size must be > 0".into()));
        }
        if !self.mean.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "group mean must be finite, got {}",
                self.mean
            )));
        }
        if !self.variance.is_finite() || self.variance < 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "group variance must be finite and >= 0, got {}",
                self.variance
            )));
        }
        Ok(())
    }
}

/// Draws `params.size` values from N(mean, √variance), then shifts every
/// value by `mean − realized_mean` so the sample mean is exactly `mean`.
///
/// # Errors
/// Propagates [`GroupParams::validate`] failures.
///
/// # Examples
/// ```
/// use u_sampling::distributions::{draw_group_sample, GroupParams};
/// use u_sampling::random::create_rng;
/// use u_sampling::stats::mean;
/// let params = GroupParams::new(30, 2.0, 1.0).unwrap();
/// let mut rng = create_rng(9);
/// let s = draw_group_sample(&params, &mut rng).unwrap();
/// assert!((mean(&s).unwrap() - 2.0).abs() < 1e-12);
/// ```
pub fn draw_group_sample<R: Rng>(params: &GroupParams, rng: &mut R) -> Result<Vec<f64>> {
    params.validate()?;
    let normal = Normal::new(params.mean, params.variance.sqrt())
        .map_err(|e| SimError::InvalidParameter(e.to_string()))?;
    let mut values: Vec<f64> = (0..params.size).map(|_| normal.sample(rng)).collect();
    let realized = stats::mean(&values).unwrap_or(params.mean);
    let shift = params.mean - realized;
    for v in &mut values {
        *v += shift;
    }
    Ok(values)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::random::create_rng;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn draw_sample_has_requested_length(
            seed in 0_u64..10000,
            n in 0_usize..200,
            which in 0_usize..4,
        ) {
            let mut rng = create_rng(seed);
            let p = Population::ALL[which];
            prop_assert_eq!(p.draw_sample(n, &mut rng).len(), n);
        }

        #[test]
        fn group_sample_recentered_exactly(
            seed in 0_u64..10000,
            size in 1_usize..200,
            mean in -100.0_f64..100.0,
            variance in 0.0_f64..50.0,
        ) {
            let params = GroupParams::new(size, mean, variance).unwrap();
            let mut rng = create_rng(seed);
            let s = draw_group_sample(&params, &mut rng).unwrap();
            prop_assert_eq!(s.len(), size);
            let realized = stats::mean(&s).unwrap();
            prop_assert!(
                (realized - mean).abs() < 1e-9 * mean.abs().max(1.0),
                "realized {realized} vs target {mean}"
            );
        }
    }
}
