use serde::{Deserialize, Serialize};

use crate::constants::{GRAVITY, PARACHUTE_OPEN_DRAG_COEFFICIENT};
use crate::control::environment::EnvironmentConfig;
use crate::control::parachute::{hemispherical_reefed_cd, ParachuteConfig};
use crate::control::sequencer::{
    validate_triggers, DeploymentSequencer, DeploymentTrigger, DisreefTrigger,
};
use crate::control::vehicle::VehicleConfig;
use crate::errors::{require_finite, require_positive, ConfigurationError, SimulationError};
use crate::trajectory_system::engine::predicted_deployment_altitude;
use crate::trajectory_system::kinematics::IntegrationConfig;

/// Deployment chain of the run, with the triggers that drive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimulationKind {
    SingleEvent {
        parachute: ParachuteConfig,
        deployment: DeploymentTrigger,
    },
    /// Reefed opening followed by disreef to the full canopy.
    DualEvent {
        parachute: ParachuteConfig,
        deployment: DeploymentTrigger,
        disreef: DisreefTrigger,
    },
}

impl SimulationKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SingleEvent { .. } => "Single event",
            Self::DualEvent { .. } => "Dual event",
        }
    }

    pub fn parachute(&self) -> &ParachuteConfig {
        match self {
            Self::SingleEvent { parachute, .. } | Self::DualEvent { parachute, .. } => parachute,
        }
    }

    pub fn parachute_mut(&mut self) -> &mut ParachuteConfig {
        match self {
            Self::SingleEvent { parachute, .. } | Self::DualEvent { parachute, .. } => parachute,
        }
    }

    pub fn deployment(&self) -> DeploymentTrigger {
        match self {
            Self::SingleEvent { deployment, .. } | Self::DualEvent { deployment, .. } => {
                *deployment
            }
        }
    }

    pub fn disreef(&self) -> Option<DisreefTrigger> {
        match self {
            Self::SingleEvent { .. } => None,
            Self::DualEvent { disreef, .. } => Some(*disreef),
        }
    }

    pub fn sequencer(&self) -> DeploymentSequencer {
        match self {
            Self::SingleEvent { deployment, .. } => DeploymentSequencer::single_event(*deployment),
            Self::DualEvent {
                deployment,
                disreef,
                ..
            } => DeploymentSequencer::dual_event(*deployment, *disreef),
        }
    }
}

/// Everything a run needs. Passed explicitly to every `run` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub vehicle: VehicleConfig,
    pub kind: SimulationKind,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub integration: IntegrationConfig,
    /// Altitude above ground at the start of the run (m).
    pub initial_altitude: f64,
    /// Vertical velocity at the start of the run, positive up (m/s).
    #[serde(default)]
    pub initial_velocity: f64,
}

impl SimulationConfig {
    pub fn new(vehicle: VehicleConfig, kind: SimulationKind, initial_altitude: f64) -> Self {
        SimulationConfig {
            vehicle,
            kind,
            environment: EnvironmentConfig::default(),
            integration: IntegrationConfig::default(),
            initial_altitude,
            initial_velocity: 0.0,
        }
    }

    pub fn single_event(
        vehicle: VehicleConfig,
        parachute: ParachuteConfig,
        deployment: DeploymentTrigger,
        initial_altitude: f64,
    ) -> Self {
        Self::new(
            vehicle,
            SimulationKind::SingleEvent {
                parachute,
                deployment,
            },
            initial_altitude,
        )
    }

    pub fn dual_event(
        vehicle: VehicleConfig,
        parachute: ParachuteConfig,
        deployment: DeploymentTrigger,
        disreef: DisreefTrigger,
        initial_altitude: f64,
    ) -> Self {
        Self::new(
            vehicle,
            SimulationKind::DualEvent {
                parachute,
                deployment,
                disreef,
            },
            initial_altitude,
        )
    }

    pub fn with_environment(mut self, environment: EnvironmentConfig) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_integration(mut self, integration: IntegrationConfig) -> Self {
        self.integration = integration;
        self
    }

    pub fn with_initial_velocity(mut self, initial_velocity: f64) -> Self {
        self.initial_velocity = initial_velocity;
        self
    }

    /// Reference dual-event recovery: 20 kg vehicle, 5 m hemispherical
    /// canopy with a 1 m spill hole, reefed to a quarter of its area.
    pub fn example_dual_event() -> Self {
        let reefing_ratio = 0.25;
        let reefed_cd = hemispherical_reefed_cd(PARACHUTE_OPEN_DRAG_COEFFICIENT, reefing_ratio)
            .unwrap_or(PARACHUTE_OPEN_DRAG_COEFFICIENT);
        let parachute = ParachuteConfig::with_default_cd(5.0)
            .with_spill_hole(1.0)
            .with_reefing(reefing_ratio, reefed_cd);

        Self::dual_event(
            VehicleConfig::from_diameter(20.0, 1.5, 1.0),
            parachute,
            DeploymentTrigger::Time(2.0),
            DisreefTrigger::Altitude(300.0),
            550.0,
        )
        .with_environment(EnvironmentConfig::constant(1.124, GRAVITY))
    }

    /// Checks every parameter and the trigger set before any integration.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.vehicle.validate()?;
        self.kind.parachute().validate()?;
        self.environment.validate()?;
        self.integration.validate()?;
        require_positive("initial altitude", self.initial_altitude)?;
        require_finite("initial velocity", self.initial_velocity)?;
        validate_triggers(
            self.kind.deployment(),
            self.kind.disreef(),
            self.initial_altitude,
            self.integration.max_time,
        )?;
        self.validate_disreef_after_deployment()
    }

    /// An altitude disreef must lie below the altitude the body has fallen to
    /// when the canopy deploys, whatever the deployment trigger.
    fn validate_disreef_after_deployment(&self) -> Result<(), ConfigurationError> {
        let Some(DisreefTrigger::Altitude(disreef_altitude)) = self.kind.disreef() else {
            return Ok(());
        };
        match predicted_deployment_altitude(self) {
            Some(deployment_altitude) if deployment_altitude <= disreef_altitude => {
                Err(ConfigurationError::ContradictoryTriggers(format!(
                    "deployment is reached at {:.2} m, not above the disreef altitude {} m",
                    deployment_altitude, disreef_altitude
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SimulationError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, SimulationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::environment::AtmosphereModel;
    use crate::trajectory_system::kinematics::IntegrationScheme;

    #[test]
    fn test_example_configuration_is_valid() {
        let config = SimulationConfig::example_dual_event();
        assert!(config.validate().is_ok());
        assert_eq!(config.kind.label(), "Dual event");
        assert!(config.kind.parachute().reefed_cd > 0.0);
    }

    #[test]
    fn test_json_round_trip_preserves_configuration() {
        let config = SimulationConfig::example_dual_event();
        let json = config.to_json_string().unwrap();
        let parsed = SimulationConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_json_defaults_for_optional_sections() {
        let json = r#"{
            "vehicle": { "mass": 5.0, "drag_coefficient": 0.0, "reference_area": 0.01 },
            "kind": {
                "type": "single_event",
                "parachute": { "diameter": 1.6, "open_cd": 1.5, "reefed_cd": 1.5, "reefing_ratio": 1.0 },
                "deployment": { "altitude": 300.0 }
            },
            "initial_altitude": 500.0
        }"#;

        let config = SimulationConfig::from_json_str(json).unwrap();
        assert_eq!(config.integration.scheme, IntegrationScheme::SemiImplicitEuler);
        assert_eq!(config.initial_velocity, 0.0);
        assert_eq!(config.kind.deployment(), DeploymentTrigger::Altitude(300.0));
        assert_eq!(config.kind.disreef(), None);
        assert!(matches!(
            config.environment.atmosphere,
            AtmosphereModel::Constant { .. }
        ));
    }

    #[test]
    fn test_invalid_json_configuration_is_rejected() {
        let json = r#"{
            "vehicle": { "mass": 0.0, "drag_coefficient": 0.0, "reference_area": 0.01 },
            "kind": {
                "type": "single_event",
                "parachute": { "diameter": 1.6, "open_cd": 1.5, "reefed_cd": 1.5, "reefing_ratio": 1.0 },
                "deployment": { "time": 0.0 }
            },
            "initial_altitude": 500.0
        }"#;

        assert!(matches!(
            SimulationConfig::from_json_str(json),
            Err(SimulationError::Configuration(
                ConfigurationError::NonPositive { field: "vehicle mass", .. }
            ))
        ));
        assert!(matches!(
            SimulationConfig::from_json_str("{ not json"),
            Err(SimulationError::Parse(_))
        ));
    }

    #[test]
    fn test_free_fall_past_disreef_altitude_is_rejected() {
        let mut config = SimulationConfig::example_dual_event();
        if let SimulationKind::DualEvent { deployment, .. } = &mut config.kind {
            *deployment = DeploymentTrigger::Time(25.0);
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::ContradictoryTriggers(_))
        ));

        if let SimulationKind::DualEvent { disreef, .. } = &mut config.kind {
            *disreef = DisreefTrigger::Timer(5.0);
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_covers_initial_conditions() {
        let mut config = SimulationConfig::example_dual_event();
        config.initial_altitude = 0.0;
        assert!(config.validate().is_err());

        let config = SimulationConfig::example_dual_event().with_initial_velocity(f64::NAN);
        assert!(config.validate().is_err());
    }
}
