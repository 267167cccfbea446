use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::sequencer::DeploymentStage;
use crate::constants::{
    PARACHUTE_OPEN_DRAG_COEFFICIENT, REEFED_DRAG_AREA_OFFSET, REEFED_DRAG_AREA_SLOPE,
};
use crate::errors::{require_non_negative, require_positive, ConfigurationError};

/// Drag-relevant properties of a single canopy.
///
/// The reefed drag coefficient is an empirical value with large uncertainty.
/// It is always supplied by the caller, never derived here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParachuteConfig {
    /// Projected diameter of the fully open canopy (m).
    pub diameter: f64,
    #[serde(default)]
    pub spill_hole_diameter: f64,
    pub open_cd: f64,
    pub reefed_cd: f64,
    /// Fraction of the full projected area exposed while reefed.
    pub reefing_ratio: f64,
}

impl ParachuteConfig {
    /// An unreefed canopy: reefing ratio 1 and reefed Cd equal to the open Cd.
    pub fn new(diameter: f64, open_cd: f64) -> Self {
        ParachuteConfig {
            diameter,
            spill_hole_diameter: 0.0,
            open_cd,
            reefed_cd: open_cd,
            reefing_ratio: 1.0,
        }
    }

    pub fn with_default_cd(diameter: f64) -> Self {
        Self::new(diameter, PARACHUTE_OPEN_DRAG_COEFFICIENT)
    }

    pub fn with_reefing(mut self, reefing_ratio: f64, reefed_cd: f64) -> Self {
        self.reefing_ratio = reefing_ratio;
        self.reefed_cd = reefed_cd;
        self
    }

    pub fn with_spill_hole(mut self, spill_hole_diameter: f64) -> Self {
        self.spill_hole_diameter = spill_hole_diameter;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        require_positive("parachute diameter", self.diameter)?;
        require_non_negative("spill hole diameter", self.spill_hole_diameter)?;
        require_positive("open drag coefficient", self.open_cd)?;
        require_positive("reefed drag coefficient", self.reefed_cd)?;

        if !(self.reefing_ratio > 0.0 && self.reefing_ratio <= 1.0) {
            return Err(ConfigurationError::ReefingRatioOutOfRange(self.reefing_ratio));
        }
        if self.spill_hole_diameter >= self.diameter {
            return Err(ConfigurationError::SpillHoleTooLarge {
                spill_hole: self.spill_hole_diameter,
                diameter: self.diameter,
            });
        }
        Ok(())
    }

    /// Projected area of the fully open canopy minus the spill hole (m²).
    pub fn open_projected_area(&self) -> f64 {
        disc_area(self.diameter) - disc_area(self.spill_hole_diameter)
    }

    pub fn reefed_projected_area(&self) -> f64 {
        self.reefing_ratio * self.open_projected_area()
    }

    pub fn drag_coefficient(&self, stage: DeploymentStage) -> f64 {
        match stage {
            DeploymentStage::PreDeployment => 0.0,
            DeploymentStage::Reefed => self.reefed_cd,
            DeploymentStage::FullOpen | DeploymentStage::Deployed => self.open_cd,
        }
    }

    pub fn effective_area(&self, stage: DeploymentStage) -> f64 {
        match stage {
            DeploymentStage::PreDeployment => 0.0,
            DeploymentStage::Reefed => self.reefed_projected_area(),
            DeploymentStage::FullOpen | DeploymentStage::Deployed => self.open_projected_area(),
        }
    }

    /// Cd·A for the given stage (m²).
    pub fn drag_area(&self, stage: DeploymentStage) -> f64 {
        self.drag_coefficient(stage) * self.effective_area(stage)
    }
}

fn disc_area(diameter: f64) -> f64 {
    PI * (diameter / 2.0).powi(2)
}

/// Starting estimate for the reefed Cd of a hemispherical canopy.
///
/// Uses the empirical drag-area curve `CdA_reefed / CdA_open = 1.43 d - 0.12`
/// where `d` is the reefed-to-open diameter ratio (`sqrt(reefing_ratio)`).
/// Returns `None` when the curve gives no positive drag area.
pub fn hemispherical_reefed_cd(open_cd: f64, reefing_ratio: f64) -> Option<f64> {
    if !(reefing_ratio > 0.0 && reefing_ratio <= 1.0) {
        return None;
    }
    let drag_area_ratio =
        REEFED_DRAG_AREA_SLOPE * reefing_ratio.sqrt() + REEFED_DRAG_AREA_OFFSET;
    if drag_area_ratio <= 0.0 {
        return None;
    }
    Some(drag_area_ratio * open_cd / reefing_ratio)
}
