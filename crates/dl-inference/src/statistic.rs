//! Test statistics.
//!
//! Every mode reduces to a probability `p` of seeing data at least as
//! signal-poor as observed, given the trial signal. A signal is excluded at
//! confidence level `cl` when `p <= 1 - cl`. Zero expected signal gives
//! `p = 1`: nothing can be excluded.

use dl_core::{Error, ParticleModel, Result, VelocityDistribution};
use dl_prob::cdf_maximum_gap;
use dl_prob::maximum_gap::maximum_gap;
use dl_prob::poisson;

use crate::detector::{Detector, StatisticalMode};
use crate::rates::{binned_signals, cumulative_signals, total_signal};

/// `P(n <= background | signal)`.
pub fn poisson_p_value(background: u64, signal: f64) -> Result<f64> {
    if signal <= 0.0 {
        return Ok(1.0);
    }
    poisson::cdf(background, signal)
}

/// Smallest per-bin Poisson p-value.
pub fn binned_p_value(background: &[u64], signals: &[f64]) -> Result<f64> {
    if background.len() != signals.len() {
        return Err(Error::Validation(format!(
            "{} background bins but {} signal bins",
            background.len(),
            signals.len()
        )));
    }
    let mut p = 1.0_f64;
    for (&b, &s) in background.iter().zip(signals) {
        p = p.min(poisson_p_value(b, s)?);
    }
    Ok(p)
}

/// `1 - C0(x, mu)` for the cumulative expected-event mapping of the events.
///
/// `cumulative` holds `mu(E)` at the window start, every event and the
/// window end; `x` is its largest gap and `mu` its last entry.
pub fn maximum_gap_p_value(cumulative: &[f64]) -> f64 {
    let mu = cumulative.last().copied().unwrap_or(0.0);
    if mu <= 0.0 {
        return 1.0;
    }
    let x = maximum_gap(cumulative);
    1.0 - cdf_maximum_gap(x, mu)
}

/// Test statistic of the detector's mode for the model at its current
/// mass and strength.
pub fn p_value(
    detector: &Detector,
    model: &dyn ParticleModel,
    halo: &dyn VelocityDistribution,
) -> Result<f64> {
    match detector.mode() {
        StatisticalMode::Poisson { background } => {
            poisson_p_value(*background, total_signal(detector, model, halo))
        }
        StatisticalMode::BinnedPoisson { background, .. } => {
            binned_p_value(background, &binned_signals(detector, model, halo))
        }
        StatisticalMode::MaximumGap { .. } => {
            Ok(maximum_gap_p_value(&cumulative_signals(detector, model, halo)))
        }
    }
}

/// `true` if the model at its current strength is excluded at `confidence_level`.
pub fn is_excluded(
    detector: &Detector,
    model: &dyn ParticleModel,
    halo: &dyn VelocityDistribution,
    confidence_level: f64,
) -> Result<bool> {
    if !(0.0 < confidence_level && confidence_level < 1.0) {
        return Err(Error::Validation(format!(
            "confidence level must be in (0,1), got {}",
            confidence_level
        )));
    }
    Ok(p_value(detector, model, halo)? <= 1.0 - confidence_level)
}
