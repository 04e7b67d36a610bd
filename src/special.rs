//! Special mathematical functions.
//!
//! Only what the population density curves need: the standard normal
//! density, the log-gamma / log-beta pair, and the Beta density built on
//! top of them.

/// 1/√(2π) ≈ 0.3989422804014327
const FRAC_1_SQRT_2PI: f64 = 0.3989422804014326779399460599343818684758586311649;

/// Standard normal density φ(x) = exp(−x²/2) / √(2π).
///
/// # Examples
/// ```
/// use u_sampling::special::standard_normal_pdf;
/// assert!((standard_normal_pdf(0.0) - 0.3989422804014327).abs() < 1e-15);
/// ```
pub fn standard_normal_pdf(x: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Normal density with mean `mu` and variance `var`.
///
/// Returns 0 when `var` is not strictly positive.
pub fn normal_pdf(x: f64, mu: f64, var: f64) -> f64 {
    if var <= 0.0 || !var.is_finite() {
        return 0.0;
    }
    let sigma = var.sqrt();
    standard_normal_pdf((x - mu) / sigma) / sigma
}

/// Lanczos approximation of ln Γ(x).
///
/// Reference: Lanczos (1964), "A Precision Approximation of the Gamma
/// Function", *SIAM Journal on Numerical Analysis* 1(1).
///
/// # Accuracy
/// Relative error < 2 × 10⁻¹⁰ for x > 0.
///
/// # Examples
/// ```
/// use u_sampling::special::ln_gamma;
/// // Γ(5) = 24
/// assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
/// ```
pub fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision)]
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut sum = COEFFICIENTS[0];
    for (i, &c) in COEFFICIENTS[1..].iter().enumerate() {
        sum += c / (x + i as f64 + 1.0);
    }

    let t = x + G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Log of the Beta function: `ln B(a, b) = ln Γ(a) + ln Γ(b) − ln Γ(a+b)`.
pub fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// Beta(a, b) density on `[0, 1]`.
///
/// ```text
/// f(x) = x^(a−1) (1−x)^(b−1) / B(a, b)
/// ```
///
/// Evaluated in log space. Returns 0 outside `[0, 1]`. At the endpoints
/// the density is 0 unless the matching shape parameter is exactly 1.
///
/// # Examples
/// ```
/// use u_sampling::special::beta_pdf;
/// // Beta(1,1) is the uniform density.
/// assert!((beta_pdf(0.3, 1.0, 1.0) - 1.0).abs() < 1e-10);
/// ```
pub fn beta_pdf(x: f64, a: f64, b: f64) -> f64 {
    if !(0.0..=1.0).contains(&x) || a <= 0.0 || b <= 0.0 {
        return 0.0;
    }
    if x == 0.0 {
        return if a == 1.0 { (-ln_beta(a, b)).exp() } else { 0.0 };
    }
    if x == 1.0 {
        return if b == 1.0 { (-ln_beta(a, b)).exp() } else { 0.0 };
    }
    ((a - 1.0) * x.ln() + (b - 1.0) * (1.0 - x).ln() - ln_beta(a, b)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_normal_pdf_symmetric() {
        assert!((standard_normal_pdf(1.3) - standard_normal_pdf(-1.3)).abs() < 1e-15);
    }

    #[test]
    fn test_normal_pdf_peak() {
        // N(0.5, 0.05) peaks at 1/sqrt(2π·0.05)
        let expected = 1.0 / (2.0 * std::f64::consts::PI * 0.05).sqrt();
        assert!((normal_pdf(0.5, 0.5, 0.05) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_normal_pdf_degenerate_variance() {
        assert_eq!(normal_pdf(0.5, 0.5, 0.0), 0.0);
        assert_eq!(normal_pdf(0.5, 0.5, -1.0), 0.0);
    }

    #[test]
    fn test_ln_gamma_half() {
        // Γ(0.5) = √π
        let expected = std::f64::consts::PI.sqrt().ln();
        assert!((ln_gamma(0.5) - expected).abs() < 1e-10);
    }

    #[test]
    fn test_ln_beta_known() {
        // B(2,5) = 1/30
        assert!((ln_beta(2.0, 5.0) - (1.0_f64 / 30.0).ln()).abs() < 1e-10);
    }

    #[test]
    fn test_beta_pdf_mode() {
        // Beta(2,5) mode = (a-1)/(a+b-2) = 0.2
        let at_mode = beta_pdf(0.2, 2.0, 5.0);
        assert!(at_mode > beta_pdf(0.15, 2.0, 5.0));
        assert!(at_mode > beta_pdf(0.25, 2.0, 5.0));
    }

    #[test]
    fn test_beta_pdf_outside_support() {
        assert_eq!(beta_pdf(-0.1, 2.0, 5.0), 0.0);
        assert_eq!(beta_pdf(1.1, 2.0, 5.0), 0.0);
        assert_eq!(beta_pdf(0.0, 2.0, 5.0), 0.0);
        assert_eq!(beta_pdf(1.0, 5.0, 2.0), 0.0);
    }

    #[test]
    fn test_beta_pdf_mirror() {
        for &x in &[0.1, 0.3, 0.5, 0.8] {
            let l = beta_pdf(x, 2.0, 5.0);
            let r = beta_pdf(1.0 - x, 5.0, 2.0);
            assert!((l - r).abs() < 1e-10, "x={x}: {l} vs {r}");
        }
    }
}
