//! Physics capability traits.
//!
//! The inference layer only ever talks to a particle model through
//! [`ParticleModel`] and to a halo model through [`VelocityDistribution`].
//! Energies, speeds and rates are plain `f64` in whatever unit system the
//! implementation uses; the only requirement is that the detector energy
//! window is expressed in the same energy unit as `differential_rate`
//! expects, and that `differential_rate` integrated over energy gives events
//! per unit exposure.

/// Galactic velocity distribution as seen by the detector.
pub trait VelocityDistribution: Send + Sync {
    /// Halo integral `eta(v_min) = ∫_{v > v_min} f(v) / v d³v`.
    fn eta(&self, v_min: f64) -> f64;

    /// Largest particle speed in the detector frame. `eta` vanishes beyond it.
    fn maximum_speed(&self) -> f64;

    /// Local dark-matter mass density.
    fn local_density(&self) -> f64;
}

/// Dark-matter particle model exposing a differential event rate.
///
/// `interaction_strength` is the single scalar coupling (usually a reference
/// cross section) that scales the rate overall. Implementations are expected
/// to be cheap to clone; the limit scanner evaluates every mass point on its
/// own copy.
pub trait ParticleModel: Send + Sync {
    /// Particle mass.
    fn mass(&self) -> f64;

    /// Set the particle mass, keeping the interaction strength unchanged.
    fn set_mass(&mut self, mass: f64);

    /// Current interaction strength.
    fn interaction_strength(&self) -> f64;

    /// Set the interaction strength.
    fn set_interaction_strength(&mut self, strength: f64);

    /// Minimum particle speed needed to deposit `energy` in the detector.
    fn minimum_speed(&self, energy: f64) -> f64;

    /// Differential event rate `dR/dE` at `energy`, per unit exposure.
    fn differential_rate(&self, energy: f64, halo: &dyn VelocityDistribution) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flat;

    impl VelocityDistribution for Flat {
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

    #[derive(Clone)]
    struct Toy {
        mass: f64,
        strength: f64,
    }

    impl ParticleModel for Toy {
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

    #[test]
    fn test_trait_objects() {
        let halo = Flat;
        let mut toy = Toy { mass: 2.0, strength: 3.0 };
        toy.set_mass(4.0);
        let model: &dyn ParticleModel = &toy;
        assert_eq!(model.mass(), 4.0);
        assert_eq!(model.differential_rate(1.0, &halo), 3.0);
        assert_eq!(model.differential_rate(8.0, &halo), 0.0);
    }
}
