//! Detector description: exposure, efficiency, energy window and the
//! statistical mode together with its background data.
//!
//! A [`Detector`] is only obtainable through [`DetectorBuilder::build`], which
//! checks every configuration invariant up front. Once built it is immutable
//! and can be shared freely between scan workers.

use std::fmt;

use dl_core::{Error, ParticleModel, Result, VelocityDistribution};
use dl_prob::roots::{DEFAULT_MAX_ITER, find_root};
use dl_prob::{Quadrature, QuadratureOrder};

/// Statistical treatment of the data, carrying only what that mode needs.
#[derive(Debug, Clone, PartialEq)]
pub enum StatisticalMode {
    /// Single counting experiment with `background` observed events.
    Poisson {
        /// Observed (background-like) event count.
        background: u64,
    },
    /// Independent counting experiments in energy bins.
    BinnedPoisson {
        /// `N + 1` strictly increasing edges spanning the energy window.
        bin_edges: Vec<f64>,
        /// `N` observed counts, one per bin.
        background: Vec<u64>,
    },
    /// Yellin's maximum-gap method on unbinned event energies.
    MaximumGap {
        /// Ascending event energies inside the energy window.
        energies: Vec<f64>,
    },
}

impl StatisticalMode {
    /// Short mode name.
    pub fn name(&self) -> &'static str {
        match self {
            StatisticalMode::Poisson { .. } => "poisson",
            StatisticalMode::BinnedPoisson { .. } => "binned_poisson",
            StatisticalMode::MaximumGap { .. } => "maximum_gap",
        }
    }
}

/// Direct-detection experiment.
#[derive(Debug, Clone)]
pub struct Detector {
    name: String,
    target: String,
    exposure: f64,
    efficiency: f64,
    energy_threshold: f64,
    energy_max: f64,
    mode: StatisticalMode,
    quadrature: Quadrature,
}

impl Detector {
    /// Start building a detector with the given name and exposure.
    pub fn builder(name: impl Into<String>, exposure: f64) -> DetectorBuilder {
        DetectorBuilder::new(name, exposure)
    }

    /// Detector name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text target description.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Exposure (mass x time).
    pub fn exposure(&self) -> f64 {
        self.exposure
    }

    /// Flat signal efficiency.
    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    /// Lower end of the energy window.
    pub fn energy_threshold(&self) -> f64 {
        self.energy_threshold
    }

    /// Upper end of the energy window.
    pub fn energy_max(&self) -> f64 {
        self.energy_max
    }

    /// Statistical mode and its background data.
    pub fn mode(&self) -> &StatisticalMode {
        &self.mode
    }

    /// Quadrature rule used for rate integrals.
    pub fn quadrature(&self) -> &Quadrature {
        &self.quadrature
    }

    /// `exposure * efficiency`.
    pub fn effective_exposure(&self) -> f64 {
        self.exposure * self.efficiency
    }

    /// `true` if a recoil inside the window is kinematically possible.
    pub fn is_kinematically_open(
        &self,
        model: &dyn ParticleModel,
        halo: &dyn VelocityDistribution,
    ) -> bool {
        self.energy_threshold < self.energy_max
            && model.minimum_speed(self.energy_threshold) < halo.maximum_speed()
    }

    /// Largest energy inside the window that the particle can deposit.
    ///
    /// Equals the window's upper end when the whole window is reachable.
    /// Only meaningful if [`Self::is_kinematically_open`] holds.
    pub fn kinematic_energy_cutoff(
        &self,
        model: &dyn ParticleModel,
        halo: &dyn VelocityDistribution,
    ) -> f64 {
        let v_max = halo.maximum_speed();
        if model.minimum_speed(self.energy_max) <= v_max {
            return self.energy_max;
        }
        let tol = 1e-12 * self.energy_max.abs().max(f64::MIN_POSITIVE);
        let g = |e: f64| model.minimum_speed(e) - v_max;
        match find_root(g, self.energy_threshold, self.energy_max, tol, DEFAULT_MAX_ITER) {
            Ok(e) => e,
            Err(e) => {
                log::warn!(
                    "{}: could not locate kinematic cutoff ({}); integrating the full window",
                    self.name,
                    e
                );
                self.energy_max
            }
        }
    }

    /// Smallest particle mass for which a recoil above threshold is possible.
    ///
    /// Searches `[mass_lo, mass_hi]` in log-mass on a clone of `model`.
    pub fn minimum_mass<P: ParticleModel + Clone>(
        &self,
        model: &P,
        halo: &dyn VelocityDistribution,
        mass_lo: f64,
        mass_hi: f64,
    ) -> Result<f64> {
        if !(mass_lo > 0.0 && mass_hi > mass_lo && mass_hi.is_finite()) {
            return Err(Error::Validation(format!(
                "invalid mass range: [{}, {}]",
                mass_lo, mass_hi
            )));
        }
        if self.energy_threshold >= self.energy_max {
            return Err(Error::Computation(format!(
                "{}: empty energy window, no mass is detectable",
                self.name
            )));
        }

        let v_max = halo.maximum_speed();
        let threshold = self.energy_threshold;
        let gap = |ln_m: f64| {
            let mut trial = model.clone();
            trial.set_mass(ln_m.exp());
            trial.minimum_speed(threshold) - v_max
        };
        if gap(mass_lo.ln()) < 0.0 {
            return Ok(mass_lo);
        }
        if gap(mass_hi.ln()) >= 0.0 {
            return Err(Error::Computation(format!(
                "{}: threshold unreachable for masses up to {}",
                self.name, mass_hi
            )));
        }

        let ln_m = find_root(gap, mass_lo.ln(), mass_hi.ln(), 1e-12, DEFAULT_MAX_ITER)?;
        Ok(ln_m.exp())
    }
}

impl fmt::Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Detector '{}'", self.name)?;
        writeln!(f, "  target:      {}", self.target)?;
        writeln!(f, "  exposure:    {}", self.exposure)?;
        writeln!(f, "  efficiency:  {}", self.efficiency)?;
        writeln!(f, "  window:      [{}, {}]", self.energy_threshold, self.energy_max)?;
        write!(f, "  statistics:  {}", self.mode.name())?;
        match &self.mode {
            StatisticalMode::Poisson { background } => write!(f, " (observed {})", background),
            StatisticalMode::BinnedPoisson { background, .. } => {
                write!(f, " ({} bins, observed {:?})", background.len(), background)
            }
            StatisticalMode::MaximumGap { energies } => write!(f, " ({} events)", energies.len()),
        }
    }
}

#[derive(Debug, Clone)]
enum ModeSpec {
    Poisson(u64),
    Binned { edges: Vec<f64>, counts: Vec<u64> },
    EqualBins { bins: usize, counts: Vec<u64> },
    MaximumGap(Vec<f64>),
}

/// Builder for [`Detector`]. All invariants are checked in [`Self::build`].
#[derive(Debug, Clone)]
pub struct DetectorBuilder {
    name: String,
    target: String,
    exposure: f64,
    efficiency: f64,
    window: Option<(f64, f64)>,
    mode: ModeSpec,
    quadrature: Quadrature,
}

impl DetectorBuilder {
    /// New builder: efficiency 1, Poisson mode with zero background.
    pub fn new(name: impl Into<String>, exposure: f64) -> Self {
        Self {
            name: name.into(),
            target: String::new(),
            exposure,
            efficiency: 1.0,
            window: None,
            mode: ModeSpec::Poisson(0),
            quadrature: Quadrature::default(),
        }
    }

    /// Free-text target description.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Flat efficiency in `[0, 1]`.
    pub fn efficiency(mut self, efficiency: f64) -> Self {
        self.efficiency = efficiency;
        self
    }

    /// Energy window `[threshold, max]`.
    pub fn energy_window(mut self, threshold: f64, max: f64) -> Self {
        self.window = Some((threshold, max));
        self
    }

    /// Poisson counting with `background` observed events.
    pub fn poisson(mut self, background: u64) -> Self {
        self.mode = ModeSpec::Poisson(background);
        self
    }

    /// Binned Poisson with explicit edges.
    pub fn binned_poisson(mut self, bin_edges: Vec<f64>, background: Vec<u64>) -> Self {
        self.mode = ModeSpec::Binned { edges: bin_edges, counts: background };
        self
    }

    /// Binned Poisson with `background.len()` equal-width bins over the window.
    pub fn equal_width_bins(mut self, background: Vec<u64>) -> Self {
        self.mode = ModeSpec::EqualBins { bins: background.len(), counts: background };
        self
    }

    /// Maximum-gap method on ascending event energies.
    pub fn maximum_gap(mut self, energies: Vec<f64>) -> Self {
        self.mode = ModeSpec::MaximumGap(energies);
        self
    }

    /// Quadrature used for rate integrals.
    pub fn quadrature(mut self, order: QuadratureOrder, panels: usize) -> Self {
        self.quadrature = Quadrature::new(order, panels);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Detector> {
        if !self.exposure.is_finite() || self.exposure < 0.0 {
            return Err(Error::Validation(format!(
                "exposure must be finite and >= 0, got {}",
                self.exposure
            )));
        }
        if !(0.0..=1.0).contains(&self.efficiency) {
            return Err(Error::Validation(format!(
                "efficiency must be in [0,1], got {}",
                self.efficiency
            )));
        }
        let (threshold, max) = self
            .window
            .ok_or_else(|| Error::Validation(format!("{}: energy window not set", self.name)))?;
        if !(threshold.is_finite() && max.is_finite()) || threshold < 0.0 {
            return Err(Error::Validation(format!(
                "energy window must be finite with threshold >= 0, got [{}, {}]",
                threshold, max
            )));
        }
        if threshold >= max {
            log::warn!(
                "{}: empty energy window [{}, {}], the detector has no sensitivity",
                self.name,
                threshold,
                max
            );
        }
        if self.exposure == 0.0 || self.efficiency == 0.0 {
            log::warn!("{}: zero effective exposure, the detector has no sensitivity", self.name);
        }

        let mode = match self.mode {
            ModeSpec::Poisson(background) => StatisticalMode::Poisson { background },
            ModeSpec::Binned { edges, counts } => {
                validate_bins(threshold, max, &edges, &counts)?;
                StatisticalMode::BinnedPoisson { bin_edges: edges, background: counts }
            }
            ModeSpec::EqualBins { bins, counts } => {
                if bins == 0 {
                    return Err(Error::Validation("at least one bin is required".to_string()));
                }
                let width = (max - threshold) / bins as f64;
                let mut edges: Vec<f64> = (0..bins).map(|i| threshold + width * i as f64).collect();
                edges.push(max);
                validate_bins(threshold, max, &edges, &counts)?;
                StatisticalMode::BinnedPoisson { bin_edges: edges, background: counts }
            }
            ModeSpec::MaximumGap(energies) => {
                validate_energies(threshold, max, &energies)?;
                StatisticalMode::MaximumGap { energies }
            }
        };

        Ok(Detector {
            name: self.name,
            target: self.target,
            exposure: self.exposure,
            efficiency: self.efficiency,
            energy_threshold: threshold,
            energy_max: max,
            mode,
            quadrature: self.quadrature,
        })
    }
}

fn validate_bins(threshold: f64, max: f64, edges: &[f64], counts: &[u64]) -> Result<()> {
    if counts.is_empty() {
        return Err(Error::Validation("at least one bin is required".to_string()));
    }
    if edges.len() != counts.len() + 1 {
        return Err(Error::Validation(format!(
            "{} bin edges given for {} bins (need {})",
            edges.len(),
            counts.len(),
            counts.len() + 1
        )));
    }
    if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[1] <= w[0]) {
        return Err(Error::Validation(format!("bin edges must be strictly increasing: {:?}", edges)));
    }
    let span_tol = 1e-12 * max.abs().max(1.0);
    if (edges[0] - threshold).abs() > span_tol || (edges[edges.len() - 1] - max).abs() > span_tol {
        return Err(Error::Validation(format!(
            "bin edges [{}, {}] must span the energy window [{}, {}]",
            edges[0],
            edges[edges.len() - 1],
            threshold,
            max
        )));
    }
    Ok(())
}

fn validate_energies(threshold: f64, max: f64, energies: &[f64]) -> Result<()> {
    if let Some(bad) = energies.iter().find(|e| !e.is_finite() || **e < threshold || **e > max) {
        return Err(Error::Validation(format!(
            "event energy {} outside the energy window [{}, {}]",
            bad, threshold, max
        )));
    }
    if let Some(i) = energies.windows(2).position(|w| w[1] < w[0]) {
        return Err(Error::Validation(format!(
            "event energies must be sorted ascending (index {}: {} > {})",
            i,
            energies[i],
            energies[i + 1]
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DetectorBuilder {
        Detector::builder("test", 1.0).target("toy").energy_window(1.0, 11.0)
    }

    #[test]
    fn test_defaults() {
        let d = base().build().unwrap();
        assert_eq!(d.efficiency(), 1.0);
        assert_eq!(d.mode(), &StatisticalMode::Poisson { background: 0 });
        assert_eq!(d.effective_exposure(), 1.0);
    }

    #[test]
    fn test_invalid_exposure_and_efficiency() {
        assert!(Detector::builder("x", -1.0).energy_window(0.0, 1.0).build().is_err());
        assert!(Detector::builder("x", f64::NAN).energy_window(0.0, 1.0).build().is_err());
        assert!(base().efficiency(1.5).build().is_err());
        assert!(base().efficiency(-0.1).build().is_err());
    }

    #[test]
    fn test_missing_or_bad_window() {
        assert!(Detector::builder("x", 1.0).build().is_err());
        assert!(Detector::builder("x", 1.0).energy_window(-1.0, 1.0).build().is_err());
        assert!(Detector::builder("x", 1.0).energy_window(0.0, f64::INFINITY).build().is_err());
    }

    #[test]
    fn test_empty_window_is_allowed_for_counting() {
        let d = Detector::builder("x", 1.0).energy_window(5.0, 5.0).build().unwrap();
        assert_eq!(d.energy_threshold(), d.energy_max());
    }

    #[test]
    fn test_equal_width_bins() {
        let d = base().equal_width_bins(vec![0, 3]).build().unwrap();
        match d.mode() {
            StatisticalMode::BinnedPoisson { bin_edges, background } => {
                assert_eq!(bin_edges, &vec![1.0, 6.0, 11.0]);
                assert_eq!(background, &vec![0, 3]);
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn test_bad_bins() {
        // Edge count mismatch.
        assert!(base().binned_poisson(vec![1.0, 11.0], vec![0, 1]).build().is_err());
        // Not increasing.
        assert!(base().binned_poisson(vec![1.0, 6.0, 6.0, 11.0], vec![0, 1, 2]).build().is_err());
        // Does not span the window.
        assert!(base().binned_poisson(vec![2.0, 6.0, 11.0], vec![0, 1]).build().is_err());
        // No bins.
        assert!(base().binned_poisson(vec![1.0], vec![]).build().is_err());
        assert!(base().equal_width_bins(vec![]).build().is_err());
    }

    #[test]
    fn test_maximum_gap_energies_validated() {
        assert!(base().maximum_gap(vec![2.0, 3.0, 10.0]).build().is_ok());
        let err = base().maximum_gap(vec![3.0, 2.0]).build().unwrap_err();
        assert!(err.to_string().contains("sorted"), "{}", err);
        assert!(base().maximum_gap(vec![0.5]).build().is_err());
        assert!(base().maximum_gap(vec![12.0]).build().is_err());
        assert!(base().maximum_gap(vec![f64::NAN]).build().is_err());
    }

    #[test]
    fn test_summary_mentions_mode() {
        let d = base().maximum_gap(vec![2.0, 3.0]).build().unwrap();
        let s = d.to_string();
        assert!(s.contains("Detector 'test'"));
        assert!(s.contains("maximum_gap (2 events)"));
    }
}
