//! Mass scans.
//!
//! Every mass point is independent: it gets its own clone of the particle
//! model with the mass set, while the detector and halo are shared
//! read-only. A failure at one mass is recorded on that point and the scan
//! carries on.

use dl_core::{Error, ExclusionCurve, LimitPoint, ParticleModel, Result, VelocityDistribution};
use rayon::prelude::*;

use crate::bound::{SolverConfig, upper_bound};
use crate::detector::Detector;

/// `n` logarithmically spaced points from `min` to `max` inclusive.
pub fn log_space(min: f64, max: f64, n: usize) -> Result<Vec<f64>> {
    if !(min > 0.0 && max.is_finite() && max >= min) {
        return Err(Error::Validation(format!(
            "log-spaced grid needs 0 < min <= max, got [{}, {}]",
            min, max
        )));
    }
    match n {
        0 => Err(Error::Validation("grid needs at least one point".to_string())),
        1 => Ok(vec![min]),
        _ => {
            let (lo, hi) = (min.ln(), max.ln());
            let step = (hi - lo) / (n - 1) as f64;
            let mut grid: Vec<f64> = (0..n).map(|i| (lo + step * i as f64).exp()).collect();
            grid[0] = min;
            grid[n - 1] = max;
            Ok(grid)
        }
    }
}

/// Exclusion curve over `masses`, evaluated sequentially.
///
/// Masses are sorted ascending; the caller's model is not modified.
pub fn limit_curve<P: ParticleModel + Clone>(
    detector: &Detector,
    model: &P,
    halo: &dyn VelocityDistribution,
    masses: &[f64],
    config: &SolverConfig,
) -> Result<ExclusionCurve> {
    let masses = prepare_grid(masses, config)?;
    let points = masses.iter().map(|&m| limit_point(detector, model, halo, m, config)).collect();
    Ok(ExclusionCurve::new(config.confidence_level, points))
}

/// Same as [`limit_curve`], with mass points evaluated in parallel on the
/// current rayon pool. The result is identical to the sequential scan.
pub fn limit_curve_par<P: ParticleModel + Clone>(
    detector: &Detector,
    model: &P,
    halo: &dyn VelocityDistribution,
    masses: &[f64],
    config: &SolverConfig,
) -> Result<ExclusionCurve> {
    let masses = prepare_grid(masses, config)?;
    let points: Vec<LimitPoint> = masses
        .par_iter()
        .map(|&m| limit_point(detector, model, halo, m, config))
        .collect();
    Ok(ExclusionCurve::new(config.confidence_level, points))
}

fn prepare_grid(masses: &[f64], config: &SolverConfig) -> Result<Vec<f64>> {
    config.validate()?;
    if let Some(bad) = masses.iter().find(|m| !(m.is_finite() && **m > 0.0)) {
        return Err(Error::Validation(format!("masses must be finite and > 0, got {}", bad)));
    }
    let mut sorted = masses.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

fn limit_point<P: ParticleModel + Clone>(
    detector: &Detector,
    model: &P,
    halo: &dyn VelocityDistribution,
    mass: f64,
    config: &SolverConfig,
) -> LimitPoint {
    let mut trial = model.clone();
    trial.set_mass(mass);
    match upper_bound(detector, &trial, halo, config) {
        Ok(outcome) => {
            log::debug!("{}: mass {} -> {:?}", detector.name(), mass, outcome);
            LimitPoint::from_outcome(mass, outcome)
        }
        Err(e) => {
            log::warn!("{}: skipping mass {}: {}", detector.name(), mass, e);
            LimitPoint::failed(mass, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_space_endpoints() {
        let g = log_space(0.1, 1000.0, 5).unwrap();
        assert_eq!(g.len(), 5);
        assert_eq!(g[0], 0.1);
        assert_eq!(g[4], 1000.0);
        assert_relative_eq!(g[1], 1.0, max_relative = 1e-12);
        assert_relative_eq!(g[3], 100.0, max_relative = 1e-12);
    }

    #[test]
    fn test_log_space_degenerate() {
        assert_eq!(log_space(3.0, 3.0, 1).unwrap(), vec![3.0]);
        assert!(log_space(0.0, 1.0, 3).is_err());
        assert!(log_space(2.0, 1.0, 3).is_err());
        assert!(log_space(1.0, 2.0, 0).is_err());
    }

    #[test]
    fn test_prepare_grid_sorts_and_validates() {
        let cfg = SolverConfig::default();
        assert_eq!(prepare_grid(&[10.0, 1.0, 5.0], &cfg).unwrap(), vec![1.0, 5.0, 10.0]);
        assert!(prepare_grid(&[1.0, -2.0], &cfg).is_err());
        assert!(prepare_grid(&[f64::NAN], &cfg).is_err());
    }
}
