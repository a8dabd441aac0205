//! Run configuration (JSON).
//!
//! Quantities are given in laboratory units (keV, kg·yr, GeV, cm², km/s,
//! GeV/cm³) and converted to natural units when the domain values are built.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use dl_inference::{Detector, SolverConfig, log_space};
use dl_physics::units::{CM, GEV, KEV, KM_PER_SEC, MEV};
use dl_physics::{Mediator, Nucleus, SpinIndependent, StandardHalo};
use dl_prob::QuadratureOrder;

use crate::data::{EnergyUnit, read_energy_table};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub detector: DetectorConfig,
    pub particle: ParticleConfig,
    #[serde(default)]
    pub halo: HaloConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub solver: SolverSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorConfig {
    pub name: String,
    #[serde(default)]
    pub target: String,
    pub exposure_kg_yr: f64,
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    pub threshold_kev: f64,
    pub max_kev: f64,
    pub statistics: StatisticsConfig,
    /// Gauss-Legendre nodes per panel (8, 16, 32 or 64).
    #[serde(default)]
    pub quadrature_nodes: Option<usize>,
    #[serde(default)]
    pub quadrature_panels: Option<usize>,
}

/// Statistical mode and where its background data comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum StatisticsConfig {
    Poisson {
        #[serde(default)]
        observed: u64,
    },
    BinnedPoisson {
        /// Explicit bin edges; equal-width bins over the window if omitted.
        #[serde(default)]
        edges_kev: Option<Vec<f64>>,
        observed: Vec<u64>,
    },
    MaximumGap {
        /// Inline event energies.
        #[serde(default)]
        energies_kev: Option<Vec<f64>>,
        /// Event table, one energy per line; relative to the config file.
        #[serde(default)]
        energy_data: Option<PathBuf>,
        #[serde(default)]
        energy_unit: EnergyUnit,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticleConfig {
    /// Target mass number (131 for xenon).
    pub mass_number: f64,
    #[serde(default = "default_sigma")]
    pub sigma_cm2: f64,
    #[serde(default)]
    pub mediator: MediatorConfig,
    #[serde(default = "default_fraction")]
    pub fractional_density: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum MediatorConfig {
    #[default]
    Contact,
    LongRange {
        /// Reference momentum transfer; `alpha m_e` if omitted.
        #[serde(default)]
        q_ref_mev: Option<f64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HaloConfig {
    pub density_gev_cm3: f64,
    pub v0_km_s: f64,
    pub v_escape_km_s: f64,
    pub v_earth_km_s: f64,
}

impl Default for HaloConfig {
    fn default() -> Self {
        Self { density_gev_cm3: 0.4, v0_km_s: 220.0, v_escape_km_s: 544.0, v_earth_km_s: 232.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub mass_min_gev: f64,
    pub mass_max_gev: f64,
    pub points: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { mass_min_gev: 1.0, mass_max_gev: 1000.0, points: 50 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSection {
    pub confidence_level: f64,
    pub rtol: f64,
    pub max_iter: u64,
    pub max_expansions: usize,
    pub probe_decades: u32,
}

impl Default for SolverSection {
    fn default() -> Self {
        let d = SolverConfig::default();
        Self {
            confidence_level: d.confidence_level,
            rtol: d.rtol,
            max_iter: d.max_iter,
            max_expansions: d.max_expansions,
            probe_decades: d.probe_decades,
        }
    }
}

fn default_efficiency() -> f64 {
    1.0
}

fn default_sigma() -> f64 {
    1e-40
}

fn default_fraction() -> f64 {
    1.0
}

pub fn read_run_config(path: &Path) -> Result<RunConfig> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let cfg: RunConfig =
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}

impl RunConfig {
    /// Validated detector; relative data paths are resolved against `base_dir`.
    pub fn detector(&self, base_dir: &Path) -> Result<Detector> {
        let d = &self.detector;
        let mut builder = Detector::builder(d.name.clone(), d.exposure_kg_yr)
            .target(d.target.clone())
            .efficiency(d.efficiency)
            .energy_window(d.threshold_kev * KEV, d.max_kev * KEV);

        if d.quadrature_nodes.is_some() || d.quadrature_panels.is_some() {
            let order = match d.quadrature_nodes.unwrap_or(32) {
                8 => QuadratureOrder::N8,
                16 => QuadratureOrder::N16,
                32 => QuadratureOrder::N32,
                64 => QuadratureOrder::N64,
                n => bail!("quadrature_nodes must be 8, 16, 32 or 64, got {}", n),
            };
            builder = builder.quadrature(order, d.quadrature_panels.unwrap_or(8));
        }

        builder = match &d.statistics {
            StatisticsConfig::Poisson { observed } => builder.poisson(*observed),
            StatisticsConfig::BinnedPoisson { edges_kev: Some(edges), observed } => {
                builder.binned_poisson(edges.iter().map(|e| e * KEV).collect(), observed.clone())
            }
            StatisticsConfig::BinnedPoisson { edges_kev: None, observed } => {
                builder.equal_width_bins(observed.clone())
            }
            StatisticsConfig::MaximumGap { energies_kev, energy_data, energy_unit } => {
                let energies = match (energies_kev, energy_data) {
                    (Some(_), Some(_)) => {
                        bail!("maximum_gap: give either energies_kev or energy_data, not both")
                    }
                    (Some(inline), None) => {
                        let mut e: Vec<f64> = inline.iter().map(|e| e * KEV).collect();
                        e.sort_by(f64::total_cmp);
                        e
                    }
                    (None, Some(path)) => read_energy_table(&base_dir.join(path), *energy_unit)?,
                    (None, None) => Vec::new(),
                };
                builder.maximum_gap(energies)
            }
        };

        Ok(builder.build()?)
    }

    pub fn particle(&self) -> Result<SpinIndependent> {
        let p = &self.particle;
        if !(p.mass_number > 0.0 && p.mass_number.is_finite()) {
            bail!("mass_number must be > 0, got {}", p.mass_number);
        }
        if !(p.sigma_cm2 > 0.0 && p.sigma_cm2.is_finite()) {
            bail!("sigma_cm2 must be > 0, got {}", p.sigma_cm2);
        }
        if !(p.fractional_density > 0.0 && p.fractional_density.is_finite()) {
            bail!("fractional_density must be > 0, got {}", p.fractional_density);
        }
        let mediator = match p.mediator {
            MediatorConfig::Contact => Mediator::Contact,
            MediatorConfig::LongRange { q_ref_mev: None } => Mediator::long_range(),
            MediatorConfig::LongRange { q_ref_mev: Some(q) } => Mediator::LongRange { q_ref: q * MEV },
        };
        let mass = self.scan.mass_min_gev * GEV;
        Ok(SpinIndependent::new(mass, p.sigma_cm2 * CM * CM, Nucleus::new(p.mass_number))
            .with_mediator(mediator)
            .with_fractional_density(p.fractional_density))
    }

    pub fn halo(&self) -> StandardHalo {
        let h = &self.halo;
        StandardHalo::new(
            h.density_gev_cm3 * GEV / (CM * CM * CM),
            h.v0_km_s * KM_PER_SEC,
            h.v_escape_km_s * KM_PER_SEC,
            h.v_earth_km_s * KM_PER_SEC,
        )
    }

    pub fn masses(&self) -> Result<Vec<f64>> {
        let s = &self.scan;
        Ok(log_space(s.mass_min_gev * GEV, s.mass_max_gev * GEV, s.points)?)
    }

    pub fn solver(&self) -> SolverConfig {
        let s = &self.solver;
        SolverConfig {
            confidence_level: s.confidence_level,
            rtol: s.rtol,
            max_iter: s.max_iter,
            max_expansions: s.max_expansions,
            probe_decades: s.probe_decades,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dl_inference::StatisticalMode;

    fn parse(json: &str) -> RunConfig {
        serde_json::from_str(json).unwrap()
    }

    const MINIMAL: &str = r#"{
        "detector": {
            "name": "toy",
            "exposure_kg_yr": 100.0,
            "threshold_kev": 5.0,
            "max_kev": 40.0,
            "statistics": { "type": "poisson", "observed": 2 }
        },
        "particle": { "mass_number": 131 }
    }"#;

    #[test]
    fn test_minimal_config_defaults() {
        let cfg = parse(MINIMAL);
        assert_eq!(cfg.detector.efficiency, 1.0);
        assert_eq!(cfg.scan.points, 50);
        assert_eq!(cfg.solver.confidence_level, 0.95);
        assert_eq!(cfg.halo(), StandardHalo::default());

        let d = cfg.detector(Path::new(".")).unwrap();
        assert_eq!(d.mode(), &StatisticalMode::Poisson { background: 2 });
        assert!((d.energy_threshold() - 5e-6).abs() < 1e-18);
        assert_eq!(cfg.masses().unwrap().len(), 50);
    }

    #[test]
    fn test_binned_equal_width() {
        let cfg = parse(&MINIMAL.replace(
            r#"{ "type": "poisson", "observed": 2 }"#,
            r#"{ "type": "binned_poisson", "observed": [0, 1, 4] }"#,
        ));
        let d = cfg.detector(Path::new(".")).unwrap();
        match d.mode() {
            StatisticalMode::BinnedPoisson { bin_edges, background } => {
                assert_eq!(bin_edges.len(), 4);
                assert_eq!(background, &vec![0, 1, 4]);
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn test_inline_energies_are_sorted() {
        let cfg = parse(&MINIMAL.replace(
            r#"{ "type": "poisson", "observed": 2 }"#,
            r#"{ "type": "maximum_gap", "energies_kev": [30.0, 7.5, 12.0] }"#,
        ));
        let d = cfg.detector(Path::new(".")).unwrap();
        match d.mode() {
            StatisticalMode::MaximumGap { energies } => {
                assert_eq!(energies.len(), 3);
                assert!(energies.windows(2).all(|w| w[0] <= w[1]));
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn test_invalid_detector_is_rejected() {
        let cfg = parse(&MINIMAL.replace("\"exposure_kg_yr\": 100.0", "\"exposure_kg_yr\": -1.0"));
        assert!(cfg.detector(Path::new(".")).is_err());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let bad = MINIMAL.replace("\"mass_number\": 131", "\"mass_number\": 131, \"spin\": 0.5");
        assert!(serde_json::from_str::<RunConfig>(&bad).is_err());
    }

    #[test]
    fn test_invalid_fractional_density_is_rejected() {
        for bad in ["0.0", "-0.5"] {
            let cfg = parse(&MINIMAL.replace(
                "\"mass_number\": 131",
                &format!("\"mass_number\": 131, \"fractional_density\": {}", bad),
            ));
            let err = cfg.particle().unwrap_err();
            assert!(err.to_string().contains("fractional_density"), "{}", err);
        }
        let cfg = parse(&MINIMAL.replace(
            "\"mass_number\": 131",
            "\"mass_number\": 131, \"fractional_density\": 0.25",
        ));
        assert!(cfg.particle().is_ok());
    }

    #[test]
    fn test_long_range_mediator() {
        let cfg = parse(&MINIMAL.replace(
            "\"mass_number\": 131",
            "\"mass_number\": 131, \"mediator\": { \"type\": \"long_range\" }",
        ));
        let m = cfg.particle().unwrap();
        assert_eq!(m.mediator(), Mediator::long_range());
    }
}
