//! Serializable solver parameters.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::PbfError;
use crate::WATER_DENSITY;

/// Every tunable of [`PbfSolver`](crate::PbfSolver) in one place.
///
/// Missing fields take their defaults when deserialized. Out-of-range soft
/// parameters (viscosity, restitution, negative strengths) are clamped when
/// applied to a solver; `validate` only rejects values no solver can run
/// with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PbfParameters {
    pub target_density: f32,
    pub target_spacing: f32,
    pub relative_kernel_radius: f32,
    pub max_number_of_iterations: u32,
    pub lambda_relaxation: f32,
    pub pseudo_viscosity_coefficient: f32,
    pub anti_clustering_denominator_factor: f32,
    pub anti_clustering_strength: f32,
    pub anti_clustering_exponent: f32,
    pub vorticity_confinement_strength: f32,
    pub restitution_coefficient: f32,
    pub drag_coefficient: f32,
    pub gravity: Vec3,
}

impl Default for PbfParameters {
    fn default() -> Self {
        Self {
            target_density: WATER_DENSITY,
            target_spacing: 0.1,
            relative_kernel_radius: 1.8,
            max_number_of_iterations: 10,
            lambda_relaxation: 10.0,
            pseudo_viscosity_coefficient: 0.01,
            anti_clustering_denominator_factor: 0.2,
            anti_clustering_strength: 1e-6,
            anti_clustering_exponent: 4.0,
            vorticity_confinement_strength: 0.0,
            restitution_coefficient: 0.0,
            drag_coefficient: 1e-4,
            gravity: Vec3::new(0.0, -9.8, 0.0),
        }
    }
}

impl PbfParameters {
    /// Parse parameters from a JSON document and validate them.
    pub fn from_json_str(json: &str) -> Result<Self, PbfError> {
        let params: PbfParameters = serde_json::from_str(json)
            .map_err(|e| PbfError::InvalidConfig(format!("failed to parse JSON: {}", e)))?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PbfError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String, PbfError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PbfError::InvalidConfig(format!("failed to serialize: {}", e)))
    }

    /// Reject values that leave the fluid undefined.
    pub fn validate(&self) -> Result<(), PbfError> {
        if !(self.target_density > 0.0) || !self.target_density.is_finite() {
            return Err(PbfError::InvalidConfig(
                "target density must be positive".to_string(),
            ));
        }
        if !(self.target_spacing > 0.0) || !self.target_spacing.is_finite() {
            return Err(PbfError::InvalidConfig(
                "target spacing must be positive".to_string(),
            ));
        }
        if !(self.relative_kernel_radius > 0.0) || !self.relative_kernel_radius.is_finite() {
            return Err(PbfError::InvalidConfig(
                "relative kernel radius must be positive".to_string(),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(PbfError::InvalidConfig("gravity must be finite".to_string()));
        }
        Ok(())
    }

    /// SPH smoothing radius: spacing times relative kernel radius.
    pub fn kernel_radius(&self) -> f32 {
        self.target_spacing * self.relative_kernel_radius
    }
}
