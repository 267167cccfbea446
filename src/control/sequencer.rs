use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{require_non_negative, require_positive, ConfigurationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStage {
    PreDeployment,
    Reefed,
    FullOpen,
    /// Single-event chain: the canopy opens straight to full area.
    Deployed,
}

impl DeploymentStage {
    pub fn label(self) -> &'static str {
        match self {
            Self::PreDeployment => "Pre-deployment",
            Self::Reefed => "Reefed",
            Self::FullOpen => "Full open",
            Self::Deployed => "Deployed",
        }
    }
}

/// Condition that releases the parachute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentTrigger {
    /// Elapsed time since the start of the run (s).
    Time(f64),
    /// Altitude above ground at or below which the canopy opens (m).
    Altitude(f64),
    /// Descent speed at or above which the canopy opens (m/s).
    Velocity(f64),
}

/// Condition that releases the reefing line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisreefTrigger {
    /// Time spent in the reefed stage (s).
    Timer(f64),
    Altitude(f64),
}

/// Inputs sampled by the engine at the start of each step.
/// Velocity is positive up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerInput {
    pub time: f64,
    pub altitude: f64,
    pub velocity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: DeploymentStage,
    pub to: DeploymentStage,
    pub time: f64,
    pub altitude: f64,
    pub velocity: f64,
}

impl DeploymentTrigger {
    pub(crate) fn is_met(self, input: &SequencerInput) -> bool {
        match self {
            Self::Time(time) => input.time >= time,
            Self::Altitude(altitude) => input.altitude <= altitude,
            Self::Velocity(speed) => -input.velocity >= speed,
        }
    }

    fn validate(self, max_time: f64) -> Result<(), ConfigurationError> {
        match self {
            Self::Time(time) => {
                require_non_negative("deployment time", time)?;
                if time >= max_time {
                    return Err(ConfigurationError::ContradictoryTriggers(format!(
                        "deployment time {} s is not before the time bound {} s",
                        time, max_time
                    )));
                }
            }
            Self::Altitude(altitude) => {
                require_positive("deployment altitude", altitude)?;
            }
            Self::Velocity(speed) => {
                require_positive("deployment velocity", speed)?;
            }
        }
        Ok(())
    }
}

impl DisreefTrigger {
    fn is_met(self, input: &SequencerInput, time_in_stage: f64) -> bool {
        match self {
            Self::Timer(delay) => time_in_stage >= delay,
            Self::Altitude(altitude) => input.altitude <= altitude,
        }
    }

    fn validate(
        self,
        deployment: DeploymentTrigger,
        initial_altitude: f64,
    ) -> Result<(), ConfigurationError> {
        match self {
            Self::Timer(delay) => {
                require_positive("disreef timer", delay)?;
            }
            Self::Altitude(altitude) => {
                require_positive("disreef altitude", altitude)?;
                if altitude >= initial_altitude {
                    return Err(ConfigurationError::ContradictoryTriggers(format!(
                        "disreef altitude {} m is not below the initial altitude {} m",
                        altitude, initial_altitude
                    )));
                }
                if let DeploymentTrigger::Altitude(deploy_altitude) = deployment {
                    if altitude >= deploy_altitude {
                        return Err(ConfigurationError::ContradictoryTriggers(format!(
                            "disreef altitude {} m is not below the deployment altitude {} m",
                            altitude, deploy_altitude
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Rejects trigger sets that could never fire in order.
pub fn validate_triggers(
    deployment: DeploymentTrigger,
    disreef: Option<DisreefTrigger>,
    initial_altitude: f64,
    max_time: f64,
) -> Result<(), ConfigurationError> {
    deployment.validate(max_time)?;
    if let Some(disreef) = disreef {
        disreef.validate(deployment, initial_altitude)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StageChain {
    SingleEvent {
        deployment: DeploymentTrigger,
    },
    DualEvent {
        deployment: DeploymentTrigger,
        disreef: DisreefTrigger,
    },
}

/// Walks PreDeployment -> Deployed, or PreDeployment -> Reefed -> FullOpen.
///
/// Each transition fires at most once and stages are never revisited.
#[derive(Debug, Clone)]
pub struct DeploymentSequencer {
    chain: StageChain,
    stage: DeploymentStage,
    stage_start_time: f64,
    transitions: Vec<StageTransition>,
}

impl DeploymentSequencer {
    pub fn single_event(deployment: DeploymentTrigger) -> Self {
        Self::with_chain(StageChain::SingleEvent { deployment })
    }

    pub fn dual_event(deployment: DeploymentTrigger, disreef: DisreefTrigger) -> Self {
        Self::with_chain(StageChain::DualEvent {
            deployment,
            disreef,
        })
    }

    fn with_chain(chain: StageChain) -> Self {
        DeploymentSequencer {
            chain,
            stage: DeploymentStage::PreDeployment,
            stage_start_time: 0.0,
            transitions: Vec::with_capacity(2),
        }
    }

    /// Evaluates the pending trigger and applies at most one transition.
    pub fn update(&mut self, input: SequencerInput) -> Option<StageTransition> {
        let time_in_stage = input.time - self.stage_start_time;

        let next_stage = match (self.stage, self.chain) {
            (DeploymentStage::PreDeployment, StageChain::SingleEvent { deployment }) => {
                deployment
                    .is_met(&input)
                    .then_some(DeploymentStage::Deployed)
            }
            (DeploymentStage::PreDeployment, StageChain::DualEvent { deployment, .. }) => {
                deployment.is_met(&input).then_some(DeploymentStage::Reefed)
            }
            (DeploymentStage::Reefed, StageChain::DualEvent { disreef, .. }) => disreef
                .is_met(&input, time_in_stage)
                .then_some(DeploymentStage::FullOpen),
            _ => None,
        };

        next_stage.map(|stage| self.transition_to(stage, &input))
    }

    fn transition_to(&mut self, new_stage: DeploymentStage, input: &SequencerInput) -> StageTransition {
        let transition = StageTransition {
            from: self.stage,
            to: new_stage,
            time: input.time,
            altitude: input.altitude,
            velocity: input.velocity,
        };
        debug!(
            from = self.stage.label(),
            to = new_stage.label(),
            time = input.time,
            altitude = input.altitude,
            "deployment stage transition"
        );

        self.stage = new_stage;
        self.stage_start_time = input.time;
        self.transitions.push(transition);
        transition
    }

    pub fn current_stage(&self) -> DeploymentStage {
        self.stage
    }

    pub fn terminal_stage(&self) -> DeploymentStage {
        match self.chain {
            StageChain::SingleEvent { .. } => DeploymentStage::Deployed,
            StageChain::DualEvent { .. } => DeploymentStage::FullOpen,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage == self.terminal_stage()
    }

    pub fn transitions(&self) -> &[StageTransition] {
        &self.transitions
    }

    /// Time the given stage was entered, if it has been reached.
    pub fn transition_time(&self, stage: DeploymentStage) -> Option<f64> {
        self.transitions
            .iter()
            .find(|transition| transition.to == stage)
            .map(|transition| transition.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(time: f64, altitude: f64, velocity: f64) -> SequencerInput {
        SequencerInput {
            time,
            altitude,
            velocity,
        }
    }

    #[test]
    fn test_single_event_time_trigger() {
        let mut sequencer = DeploymentSequencer::single_event(DeploymentTrigger::Time(2.0));

        assert_eq!(sequencer.update(input(1.999, 500.0, -19.6)), None);
        assert_eq!(sequencer.current_stage(), DeploymentStage::PreDeployment);

        let transition = sequencer.update(input(2.0, 480.0, -19.6)).unwrap();
        assert_eq!(transition.from, DeploymentStage::PreDeployment);
        assert_eq!(transition.to, DeploymentStage::Deployed);
        assert!(sequencer.is_terminal());
    }

    #[test]
    fn test_altitude_and_velocity_triggers() {
        let mut by_altitude =
            DeploymentSequencer::single_event(DeploymentTrigger::Altitude(300.0));
        assert_eq!(by_altitude.update(input(0.0, 300.1, 0.0)), None);
        assert!(by_altitude.update(input(0.1, 300.0, -1.0)).is_some());

        let mut by_velocity =
            DeploymentSequencer::single_event(DeploymentTrigger::Velocity(25.0));
        assert_eq!(by_velocity.update(input(1.0, 450.0, 24.0)), None);
        assert_eq!(by_velocity.update(input(2.0, 440.0, -24.9)), None);
        assert!(by_velocity.update(input(3.0, 420.0, -25.0)).is_some());
    }

    #[test]
    fn test_dual_event_chain_with_timer() {
        let mut sequencer = DeploymentSequencer::dual_event(
            DeploymentTrigger::Time(1.0),
            DisreefTrigger::Timer(4.0),
        );

        sequencer.update(input(1.0, 800.0, -9.8));
        assert_eq!(sequencer.current_stage(), DeploymentStage::Reefed);

        assert_eq!(sequencer.update(input(4.9, 700.0, -20.0)), None);
        let disreef = sequencer.update(input(5.0, 690.0, -20.0)).unwrap();
        assert_eq!(disreef.from, DeploymentStage::Reefed);
        assert_eq!(disreef.to, DeploymentStage::FullOpen);
        assert_eq!(sequencer.transition_time(DeploymentStage::Reefed), Some(1.0));
        assert_eq!(sequencer.transition_time(DeploymentStage::FullOpen), Some(5.0));
    }

    #[test]
    fn test_one_transition_per_update() {
        // Both triggers are already satisfied; the reefed stage must still be visited.
        let mut sequencer = DeploymentSequencer::dual_event(
            DeploymentTrigger::Altitude(500.0),
            DisreefTrigger::Altitude(400.0),
        );

        sequencer.update(input(0.0, 350.0, -10.0));
        assert_eq!(sequencer.current_stage(), DeploymentStage::Reefed);
        sequencer.update(input(0.01, 349.9, -10.0));
        assert_eq!(sequencer.current_stage(), DeploymentStage::FullOpen);
        assert_eq!(sequencer.transitions().len(), 2);
    }

    #[test]
    fn test_stages_are_monotonic_and_terminal_is_idempotent() {
        let mut sequencer = DeploymentSequencer::dual_event(
            DeploymentTrigger::Altitude(500.0),
            DisreefTrigger::Altitude(300.0),
        );

        let mut seen = vec![sequencer.current_stage()];
        // Altitude oscillates around both triggers; stages must not go back.
        for (step, altitude) in [600.0, 490.0, 510.0, 290.0, 310.0, 600.0, 100.0]
            .iter()
            .enumerate()
        {
            sequencer.update(input(step as f64, *altitude, -5.0));
            seen.push(sequencer.current_stage());
        }

        let rank = |stage: &DeploymentStage| match stage {
            DeploymentStage::PreDeployment => 0,
            DeploymentStage::Reefed => 1,
            DeploymentStage::FullOpen | DeploymentStage::Deployed => 2,
        };
        assert!(seen.windows(2).all(|pair| rank(&pair[0]) <= rank(&pair[1])));
        assert_eq!(sequencer.transitions().len(), 2);
        assert!(sequencer.is_terminal());
    }

    #[test]
    fn test_disreef_above_deployment_altitude_is_rejected() {
        let result = validate_triggers(
            DeploymentTrigger::Altitude(400.0),
            Some(DisreefTrigger::Altitude(450.0)),
            800.0,
            300.0,
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::ContradictoryTriggers(_))
        ));
    }

    #[test]
    fn test_disreef_above_initial_altitude_is_rejected() {
        let result = validate_triggers(
            DeploymentTrigger::Time(2.0),
            Some(DisreefTrigger::Altitude(900.0)),
            800.0,
            300.0,
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::ContradictoryTriggers(_))
        ));
    }

    #[test]
    fn test_unreachable_or_invalid_triggers_are_rejected() {
        assert!(validate_triggers(DeploymentTrigger::Time(300.0), None, 800.0, 300.0).is_err());
        assert!(validate_triggers(DeploymentTrigger::Time(-1.0), None, 800.0, 300.0).is_err());
        assert!(validate_triggers(DeploymentTrigger::Altitude(0.0), None, 800.0, 300.0).is_err());
        assert!(validate_triggers(DeploymentTrigger::Velocity(0.0), None, 800.0, 300.0).is_err());
        assert!(validate_triggers(
            DeploymentTrigger::Time(1.0),
            Some(DisreefTrigger::Timer(0.0)),
            800.0,
            300.0
        )
        .is_err());
        assert!(validate_triggers(
            DeploymentTrigger::Time(1.0),
            Some(DisreefTrigger::Altitude(500.0)),
            800.0,
            300.0
        )
        .is_ok());
    }
}
