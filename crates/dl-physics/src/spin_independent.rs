//! Spin-independent nuclear recoil models.
//!
//! The interaction strength is the dark matter-proton cross section `sigma_p`
//! (isoscalar couplings, coherent `A²` enhancement). The returned rate is in
//! events per kg per year per GeV of recoil energy, so an exposure in kg·yr
//! and an energy window in GeV give an expected event count.

use dl_core::{ParticleModel, VelocityDistribution};
use serde::{Deserialize, Serialize};

use crate::nucleus::Nucleus;
use crate::units::{ALPHA_EM, ELECTRON_MASS, KG, PROTON_MASS, YEAR, reduced_mass};

/// Momentum dependence of the mediator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mediator {
    /// Heavy mediator, momentum-independent cross section.
    Contact,
    /// Light mediator: `F_DM(q) = (q_ref / q)²`.
    LongRange {
        /// Reference momentum transfer at which `sigma_p` is defined.
        q_ref: f64,
    },
}

impl Mediator {
    /// Long-range mediator normalized at `q_ref = alpha m_e`.
    pub fn long_range() -> Self {
        Mediator::LongRange { q_ref: ALPHA_EM * ELECTRON_MASS }
    }

    fn form_factor_squared(&self, q: f64) -> f64 {
        match *self {
            Mediator::Contact => 1.0,
            Mediator::LongRange { q_ref } => {
                if q <= 0.0 {
                    return f64::INFINITY;
                }
                (q_ref / q).powi(4)
            }
        }
    }
}

/// Spin-independent elastic nuclear scattering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinIndependent {
    mass: f64,
    sigma_proton: f64,
    target: Nucleus,
    mediator: Mediator,
    fractional_density: f64,
}

impl SpinIndependent {
    /// Contact interaction on `target`.
    pub fn new(mass: f64, sigma_proton: f64, target: Nucleus) -> Self {
        Self { mass, sigma_proton, target, mediator: Mediator::Contact, fractional_density: 1.0 }
    }

    /// Replace the mediator.
    pub fn with_mediator(mut self, mediator: Mediator) -> Self {
        self.mediator = mediator;
        self
    }

    /// Fraction of the local density made of this particle.
    pub fn with_fractional_density(mut self, fraction: f64) -> Self {
        self.fractional_density = fraction;
        self
    }

    /// Target nucleus.
    pub fn target(&self) -> Nucleus {
        self.target
    }

    /// Mediator.
    pub fn mediator(&self) -> Mediator {
        self.mediator
    }

    /// Largest recoil energy reachable at particle speed `v`.
    pub fn maximum_recoil_energy(&self, v: f64) -> f64 {
        let mu = reduced_mass(self.mass, self.target.mass());
        2.0 * mu * mu * v * v / self.target.mass()
    }
}

impl ParticleModel for SpinIndependent {
    fn mass(&self) -> f64 {
        self.mass
    }

    fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
    }

    fn interaction_strength(&self) -> f64 {
        self.sigma_proton
    }

    fn set_interaction_strength(&mut self, strength: f64) {
        self.sigma_proton = strength;
    }

    fn minimum_speed(&self, energy: f64) -> f64 {
        let m_n = self.target.mass();
        (m_n * energy.max(0.0) / 2.0).sqrt() / reduced_mass(self.mass, m_n)
    }

    fn differential_rate(&self, energy: f64, halo: &dyn VelocityDistribution) -> f64 {
        if energy <= 0.0 {
            return 0.0;
        }
        let eta = halo.eta(self.minimum_speed(energy));
        if eta <= 0.0 {
            return 0.0;
        }
        let m_n = self.target.mass();
        let a = self.target.mass_number;
        let mu_p = reduced_mass(self.mass, PROTON_MASS);
        let q = (2.0 * m_n * energy).sqrt();
        let ff = self.target.helm_form_factor(q);

        let density = self.fractional_density * halo.local_density();
        let rate = density / self.mass * self.sigma_proton * a * a / (2.0 * mu_p * mu_p)
            * ff
            * ff
            * self.mediator.form_factor_squared(q)
            * eta;
        rate * KG * YEAR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StandardHalo;
    use crate::units::{CM, GEV, KEV};
    use approx::assert_relative_eq;

    fn xenon_100gev() -> SpinIndependent {
        SpinIndependent::new(100.0 * GEV, 1e-45 * CM * CM, Nucleus::xenon())
    }

    #[test]
    fn test_minimum_speed_inverts_maximum_recoil() {
        let m = xenon_100gev();
        let v = 300.0 * crate::units::KM_PER_SEC;
        let e = m.maximum_recoil_energy(v);
        assert_relative_eq!(m.minimum_speed(e), v, max_relative = 1e-12);
    }

    #[test]
    fn test_rate_linear_in_strength() {
        let halo = StandardHalo::default();
        let mut m = xenon_100gev();
        let r1 = m.differential_rate(10.0 * KEV, &halo);
        m.set_interaction_strength(2.0 * m.interaction_strength());
        let r2 = m.differential_rate(10.0 * KEV, &halo);
        assert!(r1 > 0.0);
        assert_relative_eq!(r2, 2.0 * r1, max_relative = 1e-14);
    }

    #[test]
    fn test_total_rate_order_of_magnitude() {
        // 100 GeV, 1e-45 cm², xenon, 5-40 keV: about 0.2 events / (kg yr).
        let halo = StandardHalo::default();
        let m = xenon_100gev();
        let q = dl_prob::Quadrature::default();
        let total = q.integrate(|e| m.differential_rate(e, &halo), 5.0 * KEV, 40.0 * KEV);
        assert!(total > 0.1 && total < 0.4, "rate = {} / (kg yr)", total);
    }

    #[test]
    fn test_set_mass_keeps_cross_section() {
        let mut m = xenon_100gev();
        let sigma = m.interaction_strength();
        m.set_mass(10.0 * GEV);
        assert_eq!(m.interaction_strength(), sigma);
        assert_eq!(m.mass(), 10.0 * GEV);
    }

    #[test]
    fn test_light_particle_cannot_reach_threshold() {
        let halo = StandardHalo::default();
        let mut m = xenon_100gev();
        m.set_mass(1.0 * GEV);
        assert!(m.minimum_speed(5.0 * KEV) > halo.maximum_speed());
        assert_eq!(m.differential_rate(5.0 * KEV, &halo), 0.0);
    }

    #[test]
    fn test_long_range_suppresses_high_recoils() {
        let halo = StandardHalo::default();
        let contact = xenon_100gev();
        let light = xenon_100gev().with_mediator(Mediator::long_range());
        let ratio_lo = light.differential_rate(5.0 * KEV, &halo) / contact.differential_rate(5.0 * KEV, &halo);
        let ratio_hi = light.differential_rate(30.0 * KEV, &halo) / contact.differential_rate(30.0 * KEV, &halo);
        assert!(ratio_hi < ratio_lo);
    }
}
