use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::errors::{require_non_negative, require_positive, ConfigurationError};
use crate::trajectory_system::aerodynamics::drag_force;

/// The descending body without its parachute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    pub mass: f64,
    /// Airframe drag coefficient, acting before and after deployment.
    pub drag_coefficient: f64,
    pub reference_area: f64,
}

impl VehicleConfig {
    pub fn new(mass: f64, drag_coefficient: f64, reference_area: f64) -> Self {
        VehicleConfig {
            mass,
            drag_coefficient,
            reference_area,
        }
    }

    /// Reference area taken as the frontal disc of the airframe.
    pub fn from_diameter(mass: f64, drag_coefficient: f64, diameter: f64) -> Self {
        Self::new(mass, drag_coefficient, PI * (diameter / 2.0).powi(2))
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        require_positive("vehicle mass", self.mass)?;
        require_non_negative("vehicle drag coefficient", self.drag_coefficient)?;
        require_positive("vehicle reference area", self.reference_area)?;
        Ok(())
    }

    pub fn drag_area(&self) -> f64 {
        self.drag_coefficient * self.reference_area
    }

    /// Airframe drag (N), signed to oppose `velocity` (positive up).
    pub fn body_drag_force(&self, velocity: f64, air_density: f64) -> f64 {
        drag_force(velocity, air_density, self.drag_area())
    }

    /// Weight magnitude (N), acting downward.
    pub fn weight_force(&self, gravity: f64) -> f64 {
        self.mass * gravity
    }
}
