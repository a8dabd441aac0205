//! Poisson distribution utilities and one-sided Poisson upper limits.

use dl_core::{Error, Result};
use statrs::function::gamma::{checked_gamma_ur, ln_gamma};

use crate::roots::{DEFAULT_MAX_ITER, expand_bracket_upward, find_root};

/// Log-PMF of Poisson(k | lambda).
pub fn logpmf(k: u64, lambda: f64) -> Result<f64> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(Error::Validation(format!("lambda must be finite and >= 0, got {}", lambda)));
    }
    if lambda == 0.0 {
        return Ok(if k == 0 { 0.0 } else { f64::NEG_INFINITY });
    }
    let kf = k as f64;
    Ok(kf * lambda.ln() - lambda - ln_gamma(kf + 1.0))
}

/// CDF `P(n <= k | lambda)`.
///
/// Evaluated as the upper regularized incomplete gamma function `Q(k + 1, lambda)`,
/// which is accurate far into the tails where summing the PMF is not.
pub fn cdf(k: u64, lambda: f64) -> Result<f64> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(Error::Validation(format!("lambda must be finite and >= 0, got {}", lambda)));
    }
    if lambda == 0.0 {
        return Ok(1.0);
    }
    checked_gamma_ur(k as f64 + 1.0, lambda)
        .map(|q| q.clamp(0.0, 1.0))
        .map_err(|e| Error::Computation(format!("incomplete gamma failed: {}", e)))
}

/// One-sided Poisson upper limit on the mean.
///
/// Returns the `lambda` for which `P(n <= observed | lambda) = 1 - confidence_level`,
/// i.e. the classical (non-Feldman-Cousins) upper limit from the Poisson tables.
/// For `observed = 0` this is exactly `-ln(1 - confidence_level)`.
pub fn upper_limit(observed: u64, confidence_level: f64) -> Result<f64> {
    if !(0.0 < confidence_level && confidence_level < 1.0) {
        return Err(Error::Validation(format!(
            "confidence level must be in (0,1), got {}",
            confidence_level
        )));
    }
    let alpha = 1.0 - confidence_level;
    if observed == 0 {
        return Ok(-alpha.ln());
    }

    let f = |lambda: f64| cdf(observed, lambda).unwrap_or(f64::NAN) - alpha;
    let n = observed as f64;
    let hi = expand_bracket_upward(&f, 0.0, n + 3.0 * n.sqrt() + 3.0, 2.0, 64)?;
    find_root(&f, 0.0, hi, 1e-10 * hi.max(1.0), DEFAULT_MAX_ITER)
}
