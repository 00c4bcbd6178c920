use crate::collider::Collider;
use crate::config::PbfParameters;

/// Fluid preset for quick configuration of solver and boundary behavior.
#[derive(Clone, Copy, Debug)]
pub struct FluidPreset {
    pub rest_density: f32,
    pub pseudo_viscosity: f32,
    pub vorticity: f32,
    pub restitution: f32,
    /// Friction of the boundary the fluid is poured against.
    pub friction: f32,
}

impl FluidPreset {
    /// Water: light pseudo-viscosity, no confinement.
    pub const WATER: Self = Self {
        rest_density: 1000.0,
        pseudo_viscosity: 0.01,
        vorticity: 0.0,
        restitution: 0.0,
        friction: 0.1,
    };

    /// Honey: dense and strongly smoothed.
    pub const HONEY: Self = Self {
        rest_density: 1400.0,
        pseudo_viscosity: 0.5,
        vorticity: 0.0,
        restitution: 0.0,
        friction: 0.4,
    };

    /// Gas/Smoke: very low density, little smoothing, strong confinement.
    pub const GAS: Self = Self {
        rest_density: 10.0,
        pseudo_viscosity: 0.005,
        vorticity: 0.3,
        restitution: 0.1,
        friction: 0.0,
    };

    /// Apply this preset to solver parameters.
    pub fn apply_to(&self, params: &mut PbfParameters) {
        params.target_density = self.rest_density;
        params.pseudo_viscosity_coefficient = self.pseudo_viscosity;
        params.vorticity_confinement_strength = self.vorticity;
        params.restitution_coefficient = self.restitution;
    }

    /// Apply this preset's friction to a collider.
    pub fn apply_to_collider(&self, collider: &mut Collider) {
        collider.set_friction_coefficient(self.friction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Plane;
    use std::sync::Arc;

    #[test]
    fn test_fluid_presets_valid() {
        for (name, preset) in [
            ("water", FluidPreset::WATER),
            ("honey", FluidPreset::HONEY),
            ("gas", FluidPreset::GAS),
        ] {
            assert!(preset.rest_density > 0.0, "{} density must be positive", name);
            assert!(
                (0.0..=1.0).contains(&preset.pseudo_viscosity),
                "{} pseudo-viscosity must be in [0,1]",
                name
            );
            assert!(preset.vorticity >= 0.0, "{} vorticity must be non-negative", name);
            assert!(preset.friction >= 0.0, "{} friction must be non-negative", name);
            assert!(
                (0.0..=1.0).contains(&preset.restitution),
                "{} restitution must be in [0,1]",
                name
            );
        }
    }

    #[test]
    fn test_apply_fluid_preset() {
        let mut params = PbfParameters::default();
        FluidPreset::HONEY.apply_to(&mut params);
        assert_eq!(params.target_density, 1400.0);
        assert_eq!(params.pseudo_viscosity_coefficient, 0.5);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_apply_preset_friction_to_collider() {
        let mut collider = Collider::fixed(Arc::new(Plane::ground(0.0)));
        FluidPreset::HONEY.apply_to_collider(&mut collider);
        assert_eq!(collider.friction_coefficient(), 0.4);
        FluidPreset::GAS.apply_to_collider(&mut collider);
        assert_eq!(collider.friction_coefficient(), 0.0);
    }
}
