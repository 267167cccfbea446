use serde::{Deserialize, Serialize};

use crate::constants::{
    AIR_DENSITY_SEA_LEVEL, BAROMETRIC_EXPONENT, EARTH_RADIUS, GRAVITY, SEA_LEVEL_PRESSURE,
    SEA_LEVEL_TEMPERATURE, SPECIFIC_GAS_CONSTANT_AIR, TROPOSPHERE_HEIGHT,
    TROPOSPHERE_TEMP_GRADIENT,
};
use crate::errors::{require_finite, require_positive, ConfigurationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum AtmosphereModel {
    Constant { air_density: f64 },
    /// Standard atmosphere evaluated at `ground_elevation + altitude`.
    Standard { ground_elevation: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum GravityModel {
    Constant { acceleration: f64 },
    InverseSquare { surface_gravity: f64, body_radius: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub atmosphere: AtmosphereModel,
    pub gravity: GravityModel,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self::constant(AIR_DENSITY_SEA_LEVEL, GRAVITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosphericConditions {
    pub temperature: f64,
    pub pressure: f64,
    pub air_density: f64,
}

impl EnvironmentConfig {
    pub fn constant(air_density: f64, gravity: f64) -> Self {
        EnvironmentConfig {
            atmosphere: AtmosphereModel::Constant { air_density },
            gravity: GravityModel::Constant {
                acceleration: gravity,
            },
        }
    }

    /// Standard atmosphere and inverse-square Earth gravity.
    pub fn standard(ground_elevation: f64) -> Self {
        EnvironmentConfig {
            atmosphere: AtmosphereModel::Standard { ground_elevation },
            gravity: GravityModel::InverseSquare {
                surface_gravity: GRAVITY,
                body_radius: EARTH_RADIUS,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.atmosphere {
            AtmosphereModel::Constant { air_density } => {
                require_positive("air density", air_density)?;
            }
            AtmosphereModel::Standard { ground_elevation } => {
                require_finite("ground elevation", ground_elevation)?;
                if ground_elevation >= TROPOSPHERE_HEIGHT {
                    return Err(ConfigurationError::AboveLimit {
                        field: "ground elevation",
                        value: ground_elevation,
                        limit: TROPOSPHERE_HEIGHT,
                    });
                }
            }
        }
        match self.gravity {
            GravityModel::Constant { acceleration } => {
                require_positive("gravity", acceleration)?;
            }
            GravityModel::InverseSquare {
                surface_gravity,
                body_radius,
            } => {
                require_positive("surface gravity", surface_gravity)?;
                require_positive("body radius", body_radius)?;
            }
        }
        Ok(())
    }

    /// Air density (kg/m³) at `altitude` above the landing site.
    pub fn air_density(&self, altitude: f64) -> f64 {
        match self.atmosphere {
            AtmosphereModel::Constant { air_density } => air_density,
            AtmosphereModel::Standard { .. } => self.conditions(altitude).air_density,
        }
    }

    pub fn gravity(&self, altitude: f64) -> f64 {
        match self.gravity {
            GravityModel::Constant { acceleration } => acceleration,
            GravityModel::InverseSquare {
                surface_gravity,
                body_radius,
            } => {
                let distance = body_radius + altitude.max(0.0);
                surface_gravity * (body_radius / distance).powi(2)
            }
        }
    }

    /// Temperature, pressure and density at `altitude` above the landing site.
    /// The constant model reports sea-level temperature and pressure.
    pub fn conditions(&self, altitude: f64) -> AtmosphericConditions {
        match self.atmosphere {
            AtmosphereModel::Constant { air_density } => AtmosphericConditions {
                temperature: SEA_LEVEL_TEMPERATURE,
                pressure: SEA_LEVEL_PRESSURE,
                air_density,
            },
            AtmosphereModel::Standard { ground_elevation } => {
                standard_atmosphere(ground_elevation + altitude.max(0.0))
            }
        }
    }
}

fn standard_atmosphere(geometric_altitude: f64) -> AtmosphericConditions {
    let (temperature, pressure) = if geometric_altitude < TROPOSPHERE_HEIGHT {
        let temperature = SEA_LEVEL_TEMPERATURE + TROPOSPHERE_TEMP_GRADIENT * geometric_altitude;
        let pressure =
            SEA_LEVEL_PRESSURE * (temperature / SEA_LEVEL_TEMPERATURE).powf(BAROMETRIC_EXPONENT);
        (temperature, pressure)
    } else if geometric_altitude < 47_000.0 {
        // Rough approximation above the tropopause
        let temperature = 216.65 + (-2.8 / 1_000.0) * (geometric_altitude - TROPOSPHERE_HEIGHT);
        let pressure = 22_632.0 * (-0.000157 * (geometric_altitude - TROPOSPHERE_HEIGHT)).exp();
        (temperature, pressure)
    } else if geometric_altitude < 80_000.0 {
        (197.65, 5_474.89 * (-0.000157 * (geometric_altitude - 47_000.0)).exp())
    } else {
        (2.7, 0.0)
    };

    let air_density = if pressure > 0.0 && temperature > 0.0 {
        pressure / (SPECIFIC_GAS_CONSTANT_AIR * temperature)
    } else {
        0.0
    };

    AtmosphericConditions {
        temperature,
        pressure,
        air_density,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_constant_environment_ignores_altitude() {
        let environment = EnvironmentConfig::constant(1.124, 9.81);
        assert_eq!(environment.air_density(0.0), 1.124);
        assert_eq!(environment.air_density(3_000.0), 1.124);
        assert_eq!(environment.gravity(3_000.0), 9.81);
    }

    #[test]
    fn test_standard_atmosphere_sea_level() {
        let environment = EnvironmentConfig::standard(0.0);
        let conditions = environment.conditions(0.0);

        assert_abs_diff_eq!(conditions.temperature, 288.15, epsilon = 0.1);
        assert_abs_diff_eq!(conditions.pressure, 101_325.0, epsilon = 1.0);
        assert_abs_diff_eq!(conditions.air_density, 1.225, epsilon = 0.01);
    }

    #[test]
    fn test_standard_atmosphere_tropopause() {
        let environment = EnvironmentConfig::standard(0.0);
        let conditions = environment.conditions(11_000.0);

        assert_abs_diff_eq!(conditions.temperature, 216.65, epsilon = 0.1);
        assert_abs_diff_eq!(conditions.pressure, 22_632.0, epsilon = 10.0);
        assert_abs_diff_eq!(conditions.air_density, 0.3639, epsilon = 0.01);
    }

    #[test]
    fn test_ground_elevation_shifts_density() {
        let sea_level = EnvironmentConfig::standard(0.0);
        let plateau = EnvironmentConfig::standard(1_500.0);

        assert_abs_diff_eq!(
            plateau.air_density(0.0),
            sea_level.air_density(1_500.0),
            epsilon = 1e-12
        );
        assert!(plateau.air_density(0.0) < sea_level.air_density(0.0));
    }

    #[test]
    fn test_density_decreases_with_altitude() {
        let environment = EnvironmentConfig::standard(0.0);
        let mut previous = environment.air_density(0.0);
        for altitude in (500..=10_000).step_by(500) {
            let density = environment.air_density(altitude as f64);
            assert!(density < previous, "density should drop at {} m", altitude);
            previous = density;
        }
    }

    #[test]
    fn test_gravity_variation_with_altitude() {
        let environment = EnvironmentConfig::standard(0.0);
        let surface = environment.gravity(0.0);
        let high = environment.gravity(100_000.0);

        assert_abs_diff_eq!(surface, GRAVITY, epsilon = 1e-12);
        let expected_ratio = (EARTH_RADIUS / (EARTH_RADIUS + 100_000.0)).powi(2);
        assert_abs_diff_eq!(high / surface, expected_ratio, epsilon = 1e-12);
    }

    #[test]
    fn test_validation() {
        assert!(EnvironmentConfig::constant(0.0, 9.81).validate().is_err());
        assert!(EnvironmentConfig::constant(1.225, -9.81).validate().is_err());
        assert!(EnvironmentConfig::standard(20_000.0).validate().is_err());
        assert!(EnvironmentConfig::default().validate().is_ok());
    }
}
