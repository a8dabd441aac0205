//! Standard halo model: truncated Maxwell-Boltzmann distribution boosted
//! into the detector frame.

use dl_core::VelocityDistribution;
use serde::{Deserialize, Serialize};
use statrs::function::erf::erf;
use std::f64::consts::PI;

use crate::units::{CM, GEV, KM_PER_SEC};

/// Truncated Maxwell-Boltzmann halo with closed-form halo integral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardHalo {
    /// Local dark-matter density.
    pub density: f64,
    /// Most probable speed `v0`.
    pub v0: f64,
    /// Galactic escape speed.
    pub v_escape: f64,
    /// Earth speed in the galactic rest frame.
    pub v_earth: f64,
}

impl StandardHalo {
    /// Halo with explicit parameters (natural units).
    pub fn new(density: f64, v0: f64, v_escape: f64, v_earth: f64) -> Self {
        Self { density, v0, v_escape, v_earth }
    }

    /// Normalization of the truncated distribution.
    fn n_esc(&self) -> f64 {
        let z = self.v_escape / self.v0;
        erf(z) - 2.0 * z * (-z * z).exp() / PI.sqrt()
    }
}

impl Default for StandardHalo {
    /// SHM benchmark: 0.4 GeV/cm³, v0 = 220 km/s, v_esc = 544 km/s, v_earth = 232 km/s.
    fn default() -> Self {
        Self::new(0.4 * GEV / (CM * CM * CM), 220.0 * KM_PER_SEC, 544.0 * KM_PER_SEC, 232.0 * KM_PER_SEC)
    }
}

impl VelocityDistribution for StandardHalo {
    fn eta(&self, v_min: f64) -> f64 {
        let x = v_min.max(0.0) / self.v0;
        let z = self.v_escape / self.v0;
        let e = self.v_earth / self.v0;
        let tail = (-z * z).exp() / PI.sqrt();

        let bracket = if x < z - e {
            erf(x + e) - erf(x - e) - 4.0 * e * tail
        } else if x < z + e {
            erf(z) - erf(x - e) - 2.0 * (z + e - x) * tail
        } else {
            return 0.0;
        };
        (bracket / (2.0 * self.n_esc() * e * self.v0)).max(0.0)
    }

    fn maximum_speed(&self) -> f64 {
        self.v_escape + self.v_earth
    }

    fn local_density(&self) -> f64 {
        self.density
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_eta_vanishes_above_maximum_speed() {
        let halo = StandardHalo::default();
        assert_eq!(halo.eta(halo.maximum_speed()), 0.0);
        assert_eq!(halo.eta(2.0 * halo.maximum_speed()), 0.0);
    }

    #[test]
    fn test_eta_is_decreasing() {
        let halo = StandardHalo::default();
        let vmax = halo.maximum_speed();
        let mut last = f64::INFINITY;
        for i in 0..=100 {
            let eta = halo.eta(vmax * i as f64 / 100.0);
            assert!(eta <= last * (1.0 + 1e-12), "i={}", i);
            last = eta;
        }
    }

    #[test]
    fn test_eta_continuous_at_branch() {
        let halo = StandardHalo::default();
        let v = halo.v_escape - halo.v_earth;
        let below = halo.eta(v * (1.0 - 1e-9));
        let above = halo.eta(v * (1.0 + 1e-9));
        assert_relative_eq!(below, above, max_relative = 1e-6);
    }

    #[test]
    fn test_eta_at_zero_is_mean_inverse_speed() {
        // eta(0) = <1/v>; for the SHM benchmark it is close to 1/(350 km/s) in size.
        let halo = StandardHalo::default();
        let inv = halo.eta(0.0) * KM_PER_SEC;
        assert!(inv > 1.0 / 600.0 && inv < 1.0 / 200.0, "<1/v> = {} s/km", inv);
    }
}
