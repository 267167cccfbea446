use std::fmt;

use serde::Serialize;

use crate::constants::GRAVITY;
use crate::control::sequencer::{DeploymentStage, StageTransition};

/// One integration sample. Altitude is above ground, velocity and
/// acceleration are positive up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationState {
    pub time: f64,
    pub altitude: f64,
    pub velocity: f64,
    pub acceleration: f64,
    pub stage: DeploymentStage,
}

/// Append-only, time-ordered output of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrajectoryRecord {
    samples: Vec<SimulationState>,
    transitions: Vec<StageTransition>,
}

impl TrajectoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TrajectoryRecord {
            samples: Vec::with_capacity(capacity),
            transitions: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, sample: SimulationState) {
        debug_assert!(self
            .samples
            .last()
            .map_or(true, |last| last.time <= sample.time));
        self.samples.push(sample);
    }

    pub(crate) fn record_transition(&mut self, transition: StageTransition) {
        self.transitions.push(transition);
    }

    pub fn samples(&self) -> &[SimulationState] {
        &self.samples
    }

    pub fn transitions(&self) -> &[StageTransition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&SimulationState> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&SimulationState> {
        self.samples.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimulationState> {
        self.samples.iter()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.time).collect()
    }

    pub fn altitudes(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.altitude).collect()
    }

    pub fn velocities(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.velocity).collect()
    }

    pub fn accelerations(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.acceleration).collect()
    }
}

/// Summary metrics of a run that reached the ground.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSummary {
    /// Descent speed at ground contact (m/s, positive).
    pub touchdown_velocity: f64,
    pub flight_time: f64,
    /// Largest net upward acceleration, i.e. the hardest braking (m/s²).
    pub peak_deceleration: f64,
    pub peak_deceleration_time: f64,
    pub max_descent_speed: f64,
    pub deployment_time: Option<f64>,
    pub disreef_time: Option<f64>,
    /// Touchdown was projected from a settled steady descent.
    pub touchdown_extrapolated: bool,
}

impl FlightSummary {
    pub fn peak_deceleration_g(&self) -> f64 {
        self.peak_deceleration / GRAVITY
    }
}

impl fmt::Display for FlightSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Flight Summary ---")?;
        writeln!(
            f,
            "Touchdown Velocity: {:.2} m/s{}",
            self.touchdown_velocity,
            if self.touchdown_extrapolated {
                " (extrapolated from steady descent)"
            } else {
                ""
            }
        )?;
        writeln!(f, "Flight Time: {}", format_time(self.flight_time))?;
        writeln!(
            f,
            "Peak Deceleration: {:.2} m/s² ({:.2} g) at {}",
            self.peak_deceleration,
            self.peak_deceleration_g(),
            format_time(self.peak_deceleration_time)
        )?;
        writeln!(f, "Max Descent Speed: {:.2} m/s", self.max_descent_speed)?;
        if let Some(time) = self.deployment_time {
            writeln!(f, "Parachute Deployed at: {}", format_time(time))?;
        }
        if let Some(time) = self.disreef_time {
            writeln!(f, "Disreefed at: {}", format_time(time))?;
        }
        Ok(())
    }
}

/// Running extrema over every integration step, recorded or not.
#[derive(Debug, Clone)]
pub struct Telemetry {
    peak_deceleration: f64,
    peak_deceleration_time: f64,
    max_descent_speed: f64,
    steps: u64,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    pub fn new() -> Self {
        Telemetry {
            peak_deceleration: f64::NEG_INFINITY,
            peak_deceleration_time: 0.0,
            max_descent_speed: 0.0,
            steps: 0,
        }
    }

    pub fn collect(&mut self, state: &SimulationState) {
        self.steps += 1;
        if state.acceleration > self.peak_deceleration {
            self.peak_deceleration = state.acceleration;
            self.peak_deceleration_time = state.time;
        }
        let descent_speed = -state.velocity;
        if descent_speed > self.max_descent_speed {
            self.max_descent_speed = descent_speed;
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn summarize(
        &self,
        touchdown: &SimulationState,
        transitions: &[StageTransition],
        touchdown_extrapolated: bool,
    ) -> FlightSummary {
        let entered = |stage: DeploymentStage| {
            transitions
                .iter()
                .find(|transition| transition.to == stage)
                .map(|transition| transition.time)
        };

        FlightSummary {
            touchdown_velocity: -touchdown.velocity,
            flight_time: touchdown.time,
            peak_deceleration: self.peak_deceleration.max(0.0),
            peak_deceleration_time: self.peak_deceleration_time,
            max_descent_speed: self.max_descent_speed,
            deployment_time: entered(DeploymentStage::Reefed)
                .or_else(|| entered(DeploymentStage::Deployed)),
            disreef_time: entered(DeploymentStage::FullOpen),
            touchdown_extrapolated,
        }
    }
}

pub fn format_time(elapsed_time: f64) -> String {
    if elapsed_time >= 3600.0 {
        let hours = (elapsed_time / 3600.0).floor();
        let minutes = ((elapsed_time % 3600.0) / 60.0).floor();
        let seconds = elapsed_time % 60.0;
        format!("{:.0}h {:.0}m {:.2}s", hours, minutes, seconds)
    } else if elapsed_time >= 60.0 {
        let minutes = (elapsed_time / 60.0).floor();
        let seconds = elapsed_time % 60.0;
        format!("{:.0}m {:.2}s", minutes, seconds)
    } else {
        format!("{:.2}s", elapsed_time)
    }
}

pub fn format_altitude(altitude: f64) -> String {
    if altitude >= 1000.0 {
        format!("{:.2} km", altitude / 1000.0)
    } else {
        format!("{:.2} m", altitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64, velocity: f64, acceleration: f64) -> SimulationState {
        SimulationState {
            time,
            altitude: 100.0,
            velocity,
            acceleration,
            stage: DeploymentStage::Deployed,
        }
    }

    #[test]
    fn test_telemetry_tracks_peaks() {
        let mut telemetry = Telemetry::new();
        telemetry.collect(&sample(0.0, 0.0, -9.81));
        telemetry.collect(&sample(1.0, -20.0, 45.0));
        telemetry.collect(&sample(2.0, -12.0, 3.0));

        let touchdown = sample(10.0, -5.0, 0.0);
        let summary = telemetry.summarize(&touchdown, &[], false);

        assert_eq!(summary.peak_deceleration, 45.0);
        assert_eq!(summary.peak_deceleration_time, 1.0);
        assert_eq!(summary.max_descent_speed, 20.0);
        assert_eq!(summary.touchdown_velocity, 5.0);
        assert_eq!(summary.flight_time, 10.0);
        assert_eq!(summary.deployment_time, None);
        assert_eq!(telemetry.steps(), 3);
    }

    #[test]
    fn test_summary_reads_transition_times() {
        let transitions = [
            StageTransition {
                from: DeploymentStage::PreDeployment,
                to: DeploymentStage::Reefed,
                time: 2.0,
                altitude: 530.0,
                velocity: -19.0,
            },
            StageTransition {
                from: DeploymentStage::Reefed,
                to: DeploymentStage::FullOpen,
                time: 30.0,
                altitude: 300.0,
                velocity: -9.0,
            },
        ];
        let summary = Telemetry::new().summarize(&sample(60.0, -4.0, 0.0), &transitions, true);

        assert_eq!(summary.deployment_time, Some(2.0));
        assert_eq!(summary.disreef_time, Some(30.0));
        assert!(summary.touchdown_extrapolated);
        assert!(summary.to_string().contains("extrapolated"));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(12.346), "12.35s");
        assert_eq!(format_time(125.0), "2m 5.00s");
        assert_eq!(format_time(3_725.5), "1h 2m 5.50s");
    }

    #[test]
    fn test_format_altitude() {
        assert_eq!(format_altitude(550.0), "550.00 m");
        assert_eq!(format_altitude(2_500.0), "2.50 km");
    }

    #[test]
    fn test_trajectory_columns() {
        let mut trajectory = TrajectoryRecord::new();
        trajectory.push(sample(0.0, 0.0, -9.81));
        trajectory.push(sample(0.1, -0.981, -9.7));

        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory.times(), vec![0.0, 0.1]);
        assert_eq!(trajectory.velocities(), vec![0.0, -0.981]);
        assert_eq!(trajectory.accelerations(), vec![-9.81, -9.7]);
        assert_eq!(trajectory.altitudes(), vec![100.0, 100.0]);
    }
}
