use serde::Serialize;
use tracing::{debug, info, warn};

use super::aerodynamics::drag_force;
use super::kinematics::KinematicState;
use crate::config::SimulationConfig;
use crate::control::sequencer::{DeploymentSequencer, DeploymentStage, SequencerInput};
use crate::errors::{ConfigurationError, ConvergenceWarning, SimulationError};
use crate::telemetry_system::telemetry::{
    FlightSummary, SimulationState, Telemetry, TrajectoryRecord,
};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Touchdown,
    /// Terminal stage settled; ground contact projected at constant velocity.
    SteadyDescent,
    TimeLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Finished(Termination),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrajectoryResult {
    Landed {
        trajectory: TrajectoryRecord,
        summary: FlightSummary,
    },
    TimeLimitExceeded {
        trajectory: TrajectoryRecord,
        warning: ConvergenceWarning,
    },
}

impl TrajectoryResult {
    pub fn trajectory(&self) -> &TrajectoryRecord {
        match self {
            Self::Landed { trajectory, .. } | Self::TimeLimitExceeded { trajectory, .. } => {
                trajectory
            }
        }
    }

    pub fn summary(&self) -> Option<&FlightSummary> {
        match self {
            Self::Landed { summary, .. } => Some(summary),
            Self::TimeLimitExceeded { .. } => None,
        }
    }

    pub fn warning(&self) -> Option<&ConvergenceWarning> {
        match self {
            Self::Landed { .. } => None,
            Self::TimeLimitExceeded { warning, .. } => Some(warning),
        }
    }

    pub fn is_landed(&self) -> bool {
        matches!(self, Self::Landed { .. })
    }
}

/// Validates `config` and integrates it until touchdown or the time bound.
pub fn run(config: &SimulationConfig) -> Result<TrajectoryResult, SimulationError> {
    SimulationEngine::new(config)?.run()
}

/// Fixed-step integrator of one descent.
///
/// The engine only reads its configuration; all mutable state lives here
/// and is dropped with the engine, apart from the returned trajectory.
pub struct SimulationEngine<'a> {
    config: &'a SimulationConfig,
    sequencer: DeploymentSequencer,
    state: KinematicState,
    step_index: u64,
    steps_per_sample: u64,
    max_steps: u64,
    trajectory: TrajectoryRecord,
    telemetry: Telemetry,
    finished: Option<(Termination, SimulationState)>,
}

impl<'a> SimulationEngine<'a> {
    pub fn new(config: &'a SimulationConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let steps_per_sample = config.integration.steps_per_sample();
        let max_steps = config.integration.max_steps();
        let expected_samples = (max_steps / steps_per_sample).min(1 << 16) as usize;

        Ok(SimulationEngine {
            config,
            sequencer: config.kind.sequencer(),
            state: KinematicState {
                altitude: config.initial_altitude,
                velocity: config.initial_velocity,
            },
            step_index: 0,
            steps_per_sample,
            max_steps,
            trajectory: TrajectoryRecord::with_capacity(expected_samples),
            telemetry: Telemetry::new(),
            finished: None,
        })
    }

    pub fn time(&self) -> f64 {
        self.step_index as f64 * self.config.integration.time_step
    }

    pub fn state(&self) -> KinematicState {
        self.state
    }

    pub fn stage(&self) -> DeploymentStage {
        self.sequencer.current_stage()
    }

    pub fn trajectory(&self) -> &TrajectoryRecord {
        &self.trajectory
    }

    pub fn termination(&self) -> Option<Termination> {
        self.finished.map(|(termination, _)| termination)
    }

    /// Net force over mass at `state` for a fixed `stage`. Positive up.
    pub fn acceleration_at(&self, state: KinematicState, stage: DeploymentStage) -> f64 {
        net_acceleration(self.config, state, stage)
    }

    /// Advances one time step. Once finished, further calls are no-ops.
    pub fn step(&mut self) -> Result<StepOutcome, SimulationError> {
        if let Some((termination, _)) = self.finished {
            return Ok(StepOutcome::Finished(termination));
        }

        match self.advance()? {
            Some((termination, final_state)) => {
                self.telemetry.collect(&final_state);
                self.trajectory.push(final_state);
                self.finished = Some((termination, final_state));
                debug!(
                    ?termination,
                    time = final_state.time,
                    steps = self.telemetry.steps(),
                    "integration finished"
                );
                Ok(StepOutcome::Finished(termination))
            }
            None => Ok(StepOutcome::Continue),
        }
    }

    /// One integration step; returns the final state when the run stops.
    fn advance(&mut self) -> Result<Option<(Termination, SimulationState)>, SimulationError> {
        let time_step = self.config.integration.time_step;
        let time = self.time();
        let current = self.state;

        if let Some(transition) = self.sequencer.update(SequencerInput {
            time,
            altitude: current.altitude,
            velocity: current.velocity,
        }) {
            self.trajectory.record_transition(transition);
        }
        let stage = self.sequencer.current_stage();

        let acceleration = check_finite(time, "acceleration", self.acceleration_at(current, stage))?;
        let sample = SimulationState {
            time,
            altitude: current.altitude,
            velocity: current.velocity,
            acceleration,
            stage,
        };
        self.telemetry.collect(&sample);
        if self.step_index % self.steps_per_sample == 0 {
            self.trajectory.push(sample);
        }

        if self.has_settled(&sample) {
            let remaining_time = current.altitude / -current.velocity;
            let touchdown = SimulationState {
                time: time + remaining_time,
                altitude: 0.0,
                ..sample
            };
            return Ok(Some((Termination::SteadyDescent, touchdown)));
        }

        let next = self.config.integration.scheme.advance(
            current,
            acceleration,
            time_step,
            |state| self.acceleration_at(state, stage),
        );
        check_finite(time, "altitude", next.altitude)?;
        check_finite(time, "velocity", next.velocity)?;

        if next.altitude <= 0.0 {
            // Linear interpolation to the zero crossing inside this step.
            let fraction = current.altitude / (current.altitude - next.altitude);
            let ground = KinematicState {
                altitude: 0.0,
                velocity: current.velocity + fraction * (next.velocity - current.velocity),
            };
            let touchdown = SimulationState {
                time: time + fraction * time_step,
                altitude: 0.0,
                velocity: ground.velocity,
                acceleration: self.acceleration_at(ground, stage),
                stage,
            };
            return Ok(Some((Termination::Touchdown, touchdown)));
        }

        self.state = next;
        self.step_index += 1;

        if self.step_index >= self.max_steps {
            let final_state = SimulationState {
                time: self.time(),
                altitude: next.altitude,
                velocity: next.velocity,
                acceleration: self.acceleration_at(next, stage),
                stage,
            };
            return Ok(Some((Termination::TimeLimit, final_state)));
        }

        Ok(None)
    }

    fn has_settled(&self, sample: &SimulationState) -> bool {
        match self.config.integration.settle_tolerance {
            Some(tolerance) => {
                self.sequencer.is_terminal()
                    && sample.velocity < 0.0
                    && sample.acceleration.abs() < tolerance
            }
            None => false,
        }
    }

    /// Steps until a stopping condition and packages the outcome.
    pub fn run(mut self) -> Result<TrajectoryResult, SimulationError> {
        loop {
            if let Some((termination, final_state)) = self.finished {
                return Ok(self.into_result(termination, final_state));
            }
            self.step()?;
        }
    }

    fn into_result(self, termination: Termination, final_state: SimulationState) -> TrajectoryResult {
        match termination {
            Termination::Touchdown | Termination::SteadyDescent => {
                let summary = self.telemetry.summarize(
                    &final_state,
                    self.sequencer.transitions(),
                    termination == Termination::SteadyDescent,
                );
                info!(
                    kind = self.config.kind.label(),
                    touchdown_velocity = summary.touchdown_velocity,
                    flight_time = summary.flight_time,
                    peak_deceleration = summary.peak_deceleration,
                    "simulation landed"
                );
                TrajectoryResult::Landed {
                    trajectory: self.trajectory,
                    summary,
                }
            }
            Termination::TimeLimit => {
                let warning = ConvergenceWarning {
                    max_time: self.config.integration.max_time,
                    final_altitude: final_state.altitude,
                    final_velocity: final_state.velocity,
                };
                warn!(%warning, "simulation exceeded its time bound");
                TrajectoryResult::TimeLimitExceeded {
                    trajectory: self.trajectory,
                    warning,
                }
            }
        }
    }
}

fn net_acceleration(
    config: &SimulationConfig,
    state: KinematicState,
    stage: DeploymentStage,
) -> f64 {
    let vehicle = &config.vehicle;
    let environment = &config.environment;
    let parachute = config.kind.parachute();

    let air_density = environment.air_density(state.altitude);
    let drag_area = vehicle.drag_area() + parachute.drag_area(stage);
    let drag = drag_force(state.velocity, air_density, drag_area);
    let weight = vehicle.weight_force(environment.gravity(state.altitude));

    (drag - weight) / vehicle.mass
}

/// Altitude at which the deployment trigger fires, found by integrating the
/// free-fall phase with the configured scheme and step.
///
/// `None` when the body reaches the ground or the time bound first, or when
/// the state stops being finite.
pub fn predicted_deployment_altitude(config: &SimulationConfig) -> Option<f64> {
    let deployment = config.kind.deployment();
    let integration = &config.integration;
    let stage = DeploymentStage::PreDeployment;
    let mut state = KinematicState {
        altitude: config.initial_altitude,
        velocity: config.initial_velocity,
    };

    for step_index in 0..integration.max_steps() {
        let input = SequencerInput {
            time: step_index as f64 * integration.time_step,
            altitude: state.altitude,
            velocity: state.velocity,
        };
        if deployment.is_met(&input) {
            return Some(state.altitude);
        }

        let acceleration = net_acceleration(config, state, stage);
        state = integration.scheme.advance(
            state,
            acceleration,
            integration.time_step,
            |trial| net_acceleration(config, trial, stage),
        );
        if !(state.altitude.is_finite() && state.velocity.is_finite()) || state.altitude <= 0.0 {
            return None;
        }
    }
    None
}

fn check_finite(time: f64, quantity: &'static str, value: f64) -> Result<f64, SimulationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimulationError::NumericalAnomaly {
            time,
            quantity,
            value,
        })
    }
}
