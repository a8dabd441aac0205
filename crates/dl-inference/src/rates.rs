//! Expected signal counts.
//!
//! All integrals run over the part of the energy window the particle can
//! actually reach (see [`Detector::kinematic_energy_cutoff`]) and are scaled
//! by `exposure * efficiency`. A kinematically closed window gives exactly
//! zero everywhere.

use dl_core::{ParticleModel, VelocityDistribution};

use crate::detector::{Detector, StatisticalMode};

/// Mode-specific expected signal.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedSignal {
    /// Total count over the window.
    Total(f64),
    /// One count per bin.
    Binned(Vec<f64>),
    /// Cumulative counts at the threshold, each event energy and the window end.
    Cumulative(Vec<f64>),
}

impl ExpectedSignal {
    /// Total expected count over the full window.
    pub fn total(&self) -> f64 {
        match self {
            ExpectedSignal::Total(s) => *s,
            ExpectedSignal::Binned(bins) => bins.iter().sum(),
            ExpectedSignal::Cumulative(mu) => mu.last().copied().unwrap_or(0.0),
        }
    }
}

/// Expected signal in the shape the detector's statistical mode needs.
pub fn expected_signal(
    detector: &Detector,
    model: &dyn ParticleModel,
    halo: &dyn VelocityDistribution,
) -> ExpectedSignal {
    match detector.mode() {
        StatisticalMode::Poisson { .. } => ExpectedSignal::Total(total_signal(detector, model, halo)),
        StatisticalMode::BinnedPoisson { .. } => {
            ExpectedSignal::Binned(binned_signals(detector, model, halo))
        }
        StatisticalMode::MaximumGap { .. } => {
            ExpectedSignal::Cumulative(cumulative_signals(detector, model, halo))
        }
    }
}

/// Expected number of events over `[threshold, max]`.
pub fn total_signal(
    detector: &Detector,
    model: &dyn ParticleModel,
    halo: &dyn VelocityDistribution,
) -> f64 {
    if !detector.is_kinematically_open(model, halo) {
        return 0.0;
    }
    let cutoff = detector.kinematic_energy_cutoff(model, halo);
    integrate(detector, model, halo, detector.energy_threshold(), cutoff)
}

/// Expected number of events per bin, same order as the background bins.
///
/// Outside binned mode the whole window is treated as a single bin.
pub fn binned_signals(
    detector: &Detector,
    model: &dyn ParticleModel,
    halo: &dyn VelocityDistribution,
) -> Vec<f64> {
    let edges = match detector.mode() {
        StatisticalMode::BinnedPoisson { bin_edges, .. } => bin_edges.clone(),
        _ => vec![detector.energy_threshold(), detector.energy_max()],
    };
    if !detector.is_kinematically_open(model, halo) {
        return vec![0.0; edges.len() - 1];
    }
    let cutoff = detector.kinematic_energy_cutoff(model, halo);
    edges
        .windows(2)
        .map(|w| integrate(detector, model, halo, w[0], w[1].min(cutoff)))
        .collect()
}

/// Cumulative expected events `mu(E)` at the threshold, at every sorted event
/// energy and at the window end.
///
/// The result has `n_events + 2` non-decreasing entries starting at 0; the
/// last entry is the total expected signal. Outside maximum-gap mode there
/// are no events and only the two window ends are returned.
pub fn cumulative_signals(
    detector: &Detector,
    model: &dyn ParticleModel,
    halo: &dyn VelocityDistribution,
) -> Vec<f64> {
    let energies: &[f64] = match detector.mode() {
        StatisticalMode::MaximumGap { energies } => energies,
        _ => &[],
    };
    let mut points = Vec::with_capacity(energies.len() + 2);
    points.push(detector.energy_threshold());
    points.extend_from_slice(energies);
    points.push(detector.energy_max());

    if !detector.is_kinematically_open(model, halo) {
        return vec![0.0; points.len()];
    }
    let cutoff = detector.kinematic_energy_cutoff(model, halo);

    let mut mu = Vec::with_capacity(points.len());
    let mut acc = 0.0;
    mu.push(acc);
    for w in points.windows(2) {
        acc += integrate(detector, model, halo, w[0], w[1].min(cutoff));
        mu.push(acc);
    }
    mu
}

fn integrate(
    detector: &Detector,
    model: &dyn ParticleModel,
    halo: &dyn VelocityDistribution,
    lo: f64,
    hi: f64,
) -> f64 {
    if hi <= lo {
        return 0.0;
    }
    let integral = detector.quadrature().integrate(|e| model.differential_rate(e, halo), lo, hi);
    detector.effective_exposure() * integral.max(0.0)
}
