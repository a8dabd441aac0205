//! Event-energy tables for the maximum-gap method.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

use dl_physics::units::{EV, GEV, KEV};

/// Unit of the energies in an event table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyUnit {
    Ev,
    #[default]
    Kev,
    Gev,
}

impl EnergyUnit {
    pub fn factor(self) -> f64 {
        match self {
            EnergyUnit::Ev => EV,
            EnergyUnit::Kev => KEV,
            EnergyUnit::Gev => GEV,
        }
    }
}

/// Read one energy per line (first whitespace-separated column), skipping
/// blank lines and `#` comments. Returned energies are in natural units and
/// sorted ascending.
pub fn read_energy_table(path: &Path, unit: EnergyUnit) -> Result<Vec<f64>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut energies = parse_energy_table(&text, unit)
        .with_context(|| format!("parsing {}", path.display()))?;
    energies.sort_by(f64::total_cmp);
    tracing::info!(path = %path.display(), events = energies.len(), "event table loaded");
    Ok(energies)
}

fn parse_energy_table(text: &str, unit: EnergyUnit) -> Result<Vec<f64>> {
    let mut energies = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(first) = line.split_whitespace().next() else {
            continue;
        };
        let value: f64 = first
            .parse()
            .with_context(|| format!("line {}: invalid energy '{}'", lineno + 1, first))?;
        if !value.is_finite() || value < 0.0 {
            bail!("line {}: energy must be finite and >= 0, got {}", lineno + 1, value);
        }
        energies.push(value * unit.factor());
    }
    Ok(energies)
}
