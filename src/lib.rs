pub mod config;
pub mod constants;
pub mod control;
pub mod dispersion;
pub mod errors;
pub mod telemetry_system;
pub mod trajectory_system;

pub use constants::*;
pub use config::{SimulationConfig, SimulationKind};
pub use control::environment::{AtmosphereModel, EnvironmentConfig, GravityModel};
pub use control::parachute::{hemispherical_reefed_cd, ParachuteConfig};
pub use control::sequencer::{
    DeploymentSequencer, DeploymentStage, DeploymentTrigger, DisreefTrigger, StageTransition,
};
pub use control::vehicle::VehicleConfig;
pub use errors::{ConfigurationError, ConvergenceWarning, ExportError, SimulationError};

// Re-export commonly used items from trajectory_system
pub use trajectory_system::engine::{
    run, SimulationEngine, StepOutcome, Termination, TrajectoryResult,
};
pub use trajectory_system::kinematics::{IntegrationConfig, IntegrationScheme, KinematicState};

// Re-export commonly used items from telemetry_system
pub use telemetry_system::telemetry::{FlightSummary, SimulationState, TrajectoryRecord};
