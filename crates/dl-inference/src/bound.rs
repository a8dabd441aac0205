//! Upper bound on the interaction strength at fixed mass.
//!
//! The expected signal of every supported model is linear in the interaction
//! strength, so one evaluation at a reference strength fixes the whole
//! mapping strength → signal. Poisson and binned Poisson then rescale in
//! closed form; the maximum-gap statistic is inverted with a bracketed root
//! search along that line.

use dl_core::{BoundOutcome, Error, ParticleModel, Result, VelocityDistribution};
use dl_prob::cdf_maximum_gap;
use dl_prob::maximum_gap::maximum_gap;
use dl_prob::poisson;
use dl_prob::roots::{expand_bracket_upward, find_root};

use crate::detector::{Detector, StatisticalMode};
use crate::rates::{ExpectedSignal, expected_signal, total_signal};

/// Relative deviation from linear scaling that triggers a warning.
const LINEARITY_TOL: f64 = 1e-6;

/// Largest accepted deviation of the maximum-gap p-value at the bound from `1 - cl`.
const P_VALUE_TOL: f64 = 1e-6;

/// Knobs of the upper-bound search.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Confidence level in `(0, 1)`.
    pub confidence_level: f64,
    /// Relative tolerance of the maximum-gap root search.
    pub rtol: f64,
    /// Iteration cap of a single root search.
    pub max_iter: u64,
    /// Maximum number of bracket doublings.
    pub max_expansions: usize,
    /// Decades of trial strengths probed when the current strength gives no signal.
    pub probe_decades: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            rtol: 1e-8,
            max_iter: 200,
            max_expansions: 100,
            probe_decades: 60,
        }
    }
}

impl SolverConfig {
    /// Default knobs at a different confidence level.
    pub fn with_confidence_level(confidence_level: f64) -> Self {
        Self { confidence_level, ..Self::default() }
    }

    /// Check every knob.
    pub fn validate(&self) -> Result<()> {
        if !(0.0 < self.confidence_level && self.confidence_level < 1.0) {
            return Err(Error::Validation(format!(
                "confidence level must be in (0,1), got {}",
                self.confidence_level
            )));
        }
        if !(self.rtol > 0.0 && self.rtol < 1.0) {
            return Err(Error::Validation(format!("rtol must be in (0,1), got {}", self.rtol)));
        }
        if self.max_iter == 0 || self.max_expansions == 0 {
            return Err(Error::Validation(
                "max_iter and max_expansions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Smallest interaction strength excluded at `config.confidence_level`.
///
/// The caller's model is left untouched; trial strengths are set on clones.
///
/// Returns [`BoundOutcome::KinematicallyForbidden`] when no recoil inside the
/// window is possible at this mass, and [`BoundOutcome::Unconstrained`] when
/// no probed strength produces any signal. Fails with
/// [`Error::Computation`] if the maximum-gap search cannot bracket or
/// converge.
pub fn upper_bound<P: ParticleModel + Clone>(
    detector: &Detector,
    model: &P,
    halo: &dyn VelocityDistribution,
    config: &SolverConfig,
) -> Result<BoundOutcome> {
    config.validate()?;
    if !detector.is_kinematically_open(model, halo) {
        log::debug!(
            "{}: mass {} cannot deposit energy above threshold",
            detector.name(),
            model.mass()
        );
        return Ok(BoundOutcome::KinematicallyForbidden);
    }

    let Some((strength, signal)) = reference_signal(detector, model, halo, config) else {
        log::debug!("{}: no signal at mass {} for any probed strength", detector.name(), model.mass());
        return Ok(BoundOutcome::Unconstrained);
    };
    let cl = config.confidence_level;

    let limit = match (detector.mode(), &signal) {
        (StatisticalMode::Poisson { background }, ExpectedSignal::Total(s0)) => {
            strength * poisson::upper_limit(*background, cl)? / s0
        }
        (StatisticalMode::BinnedPoisson { background, .. }, ExpectedSignal::Binned(bins)) => {
            let mut best = f64::INFINITY;
            for (&b, &s) in background.iter().zip(bins) {
                if s > 0.0 {
                    best = best.min(strength * poisson::upper_limit(b, cl)? / s);
                }
            }
            best
        }
        (StatisticalMode::MaximumGap { .. }, ExpectedSignal::Cumulative(mu)) => {
            let mu0 = signal.total();
            let t = maximum_gap_signal(maximum_gap(mu) / mu0, config)?;
            strength * t / mu0
        }
        (mode, _) => {
            return Err(Error::Computation(format!(
                "signal shape does not match statistical mode {}",
                mode.name()
            )));
        }
    };

    if !limit.is_finite() {
        return Ok(BoundOutcome::Unconstrained);
    }
    check_linear_scaling(detector, model, halo, strength, signal.total(), limit);
    Ok(BoundOutcome::Limit(limit))
}

/// First probed strength with a positive expected signal, and that signal.
fn reference_signal<P: ParticleModel + Clone>(
    detector: &Detector,
    model: &P,
    halo: &dyn VelocityDistribution,
    config: &SolverConfig,
) -> Option<(f64, ExpectedSignal)> {
    let current = model.interaction_strength();
    let base = if current.is_finite() && current > 0.0 { current } else { 1.0 };
    let mut trial = model.clone();
    for decade in 0..=config.probe_decades {
        let strength = base * 10f64.powi(decade as i32);
        if !strength.is_finite() {
            break;
        }
        trial.set_interaction_strength(strength);
        let signal = expected_signal(detector, &trial, halo);
        if signal.total() > 0.0 {
            if decade > 0 {
                log::debug!("{}: signal found at probe strength {}", detector.name(), strength);
            }
            return Some((strength, signal));
        }
    }
    None
}

/// Total signal `t` at which the maximum-gap p-value drops to `1 - cl`,
/// given the largest gap as a fraction `ratio` of the total.
fn maximum_gap_signal(ratio: f64, config: &SolverConfig) -> Result<f64> {
    let ratio = ratio.clamp(0.0, 1.0);
    let alpha = 1.0 - config.confidence_level;
    let g = |t: f64| 1.0 - cdf_maximum_gap(ratio * t, t) - alpha;

    let lo = 1e-9;
    let hi = expand_bracket_upward(&g, lo, -alpha.ln(), 2.0, config.max_expansions)?;
    if hi == lo {
        return Ok(lo);
    }
    let t = find_root(&g, lo, hi, config.rtol * hi, config.max_iter)?;

    let residual = g(t);
    if !(residual.abs() <= P_VALUE_TOL) {
        return Err(Error::Computation(format!(
            "maximum-gap p-value at total signal {} is {}, expected {}",
            t,
            residual + alpha,
            alpha
        )));
    }
    Ok(t)
}

fn check_linear_scaling<P: ParticleModel + Clone>(
    detector: &Detector,
    model: &P,
    halo: &dyn VelocityDistribution,
    strength: f64,
    signal: f64,
    limit: f64,
) {
    let mut probe = model.clone();
    probe.set_interaction_strength(limit);
    let expected = signal * limit / strength;
    let actual = total_signal(detector, &probe, halo);
    if (actual - expected).abs() > LINEARITY_TOL * expected.abs() {
        log::warn!(
            "{}: signal not linear in strength at mass {} (expected {}, got {}); bound may be inaccurate",
            detector.name(),
            model.mass(),
            expected,
            actual
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Clone)]
    struct Flat {
        mass: f64,
        strength: f64,
    }

    impl ParticleModel for Flat {
        fn mass(&self) -> f64 {
            self.mass
        }
        fn set_mass(&mut self, mass: f64) {
            self.mass = mass;
        }
        fn interaction_strength(&self) -> f64 {
            self.strength
        }
        fn set_interaction_strength(&mut self, strength: f64) {
            self.strength = strength;
        }
        fn minimum_speed(&self, energy: f64) -> f64 {
            energy / self.mass
        }
        fn differential_rate(&self, energy: f64, halo: &dyn VelocityDistribution) -> f64 {
            self.strength * halo.eta(self.minimum_speed(energy))
        }
    }

    struct Box1;

    impl VelocityDistribution for Box1 {
        fn eta(&self, v_min: f64) -> f64 {
            if v_min < 1.0 { 1.0 } else { 0.0 }
        }
        fn maximum_speed(&self) -> f64 {
            1.0
        }
        fn local_density(&self) -> f64 {
            1.0
        }
    }

    fn detector(mode: impl FnOnce(crate::DetectorBuilder) -> crate::DetectorBuilder) -> Detector {
        mode(Detector::builder("flat", 1.0).energy_window(0.0, 10.0)).build().unwrap()
    }

    fn model() -> Flat {
        Flat { mass: 100.0, strength: 0.7 }
    }

    #[test]
    fn test_zero_background_poisson() {
        let d = detector(|b| b.poisson(0));
        let bound = upper_bound(&d, &model(), &Box1, &SolverConfig::default()).unwrap();
        assert_relative_eq!(bound.strength(), 20f64.ln() / 10.0, max_relative = 1e-10);
    }

    #[test]
    fn test_zero_strength_is_probed() {
        let d = detector(|b| b.poisson(0));
        let m = Flat { mass: 100.0, strength: 0.0 };
        let bound = upper_bound(&d, &m, &Box1, &SolverConfig::default()).unwrap();
        assert_relative_eq!(bound.strength(), 20f64.ln() / 10.0, max_relative = 1e-10);
        assert_eq!(m.strength, 0.0);
    }

    #[test]
    fn test_forbidden_and_unconstrained() {
        let d = Detector::builder("x", 1.0).energy_window(5.0, 10.0).build().unwrap();
        let light = Flat { mass: 2.0, strength: 1.0 };
        let cfg = SolverConfig::default();
        assert_eq!(upper_bound(&d, &light, &Box1, &cfg).unwrap(), BoundOutcome::KinematicallyForbidden);

        let blind = Detector::builder("x", 1.0).efficiency(0.0).energy_window(0.0, 10.0).build().unwrap();
        assert_eq!(upper_bound(&blind, &model(), &Box1, &cfg).unwrap(), BoundOutcome::Unconstrained);
    }

    #[test]
    fn test_binned_uses_tightest_bin() {
        let d = detector(|b| b.binned_poisson(vec![0.0, 5.0, 10.0], vec![0, 10]));
        let bound = upper_bound(&d, &model(), &Box1, &SolverConfig::default()).unwrap();
        assert_relative_eq!(bound.strength(), 20f64.ln() / 5.0, max_relative = 1e-10);
    }

    #[test]
    fn test_maximum_gap_without_events_matches_poisson() {
        let cfg = SolverConfig::default();
        let gap = upper_bound(&detector(|b| b.maximum_gap(vec![])), &model(), &Box1, &cfg).unwrap();
        let poisson = upper_bound(&detector(|b| b.poisson(0)), &model(), &Box1, &cfg).unwrap();
        assert_relative_eq!(gap.strength(), poisson.strength(), max_relative = 1e-6);
    }

    #[test]
    fn test_maximum_gap_events_loosen_bound() {
        let cfg = SolverConfig::default();
        let empty = upper_bound(&detector(|b| b.maximum_gap(vec![])), &model(), &Box1, &cfg).unwrap();
        let events =
            upper_bound(&detector(|b| b.maximum_gap(vec![2.0, 5.0])), &model(), &Box1, &cfg).unwrap();
        assert!(events.strength() > empty.strength());
        assert!(events.is_limit());
    }

    #[test]
    fn test_maximum_gap_bound_hits_target() {
        let d = detector(|b| b.maximum_gap(vec![3.0, 4.0, 8.5]));
        let cfg = SolverConfig::with_confidence_level(0.9);
        let bound = upper_bound(&d, &model(), &Box1, &cfg).unwrap();
        let mut at_limit = model();
        at_limit.set_interaction_strength(bound.strength());
        let p = crate::statistic::p_value(&d, &at_limit, &Box1).unwrap();
        assert_relative_eq!(p, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_maximum_gap_signal_many_events() {
        // 500 evenly spaced events: each gap is 1/501 of the total signal.
        let t = maximum_gap_signal(1.0 / 501.0, &SolverConfig::default()).unwrap();
        assert_relative_eq!(t, 5831.38, max_relative = 1e-5);
        let p = 1.0 - cdf_maximum_gap(t / 501.0, t);
        assert_relative_eq!(p, 0.05, epsilon = P_VALUE_TOL);
    }

    #[test]
    fn test_invalid_config() {
        let d = detector(|b| b.poisson(0));
        let cfg = SolverConfig { confidence_level: 1.0, ..SolverConfig::default() };
        assert!(matches!(upper_bound(&d, &model(), &Box1, &cfg), Err(Error::Validation(_))));
        let cfg = SolverConfig { max_iter: 0, ..SolverConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
