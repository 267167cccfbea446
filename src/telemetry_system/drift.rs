use serde::Serialize;

use super::telemetry::TrajectoryRecord;
use crate::constants::{DRIFT_WIND_SPEED_STEP, MAX_DRIFT_WIND_SPEED};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriftPoint {
    pub time: f64,
    pub altitude: f64,
    /// Downwind distance from the release point (m).
    pub distance: f64,
}

/// Downwind track of the descent for one constant wind speed.
///
/// The body is assumed to move with the wind over the whole flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftProfile {
    pub wind_speed: f64,
    pub points: Vec<DriftPoint>,
    pub landing_distance: f64,
}

/// 0 to 20 m/s in 2 m/s steps.
pub fn default_wind_speeds() -> Vec<f64> {
    (0..=MAX_DRIFT_WIND_SPEED)
        .step_by(DRIFT_WIND_SPEED_STEP as usize)
        .map(f64::from)
        .collect()
}

/// Samples the trajectory every `sample_interval` seconds (and at its last
/// sample) and builds one drift profile per wind speed.
pub fn drift_profiles(
    trajectory: &TrajectoryRecord,
    wind_speeds: &[f64],
    sample_interval: f64,
) -> Vec<DriftProfile> {
    let (Some(first), Some(last)) = (trajectory.first(), trajectory.last()) else {
        return Vec::new();
    };
    let start_time = first.time;

    let mut sampled = Vec::new();
    let mut next_time = start_time;
    for sample in trajectory.iter() {
        if sample.time >= next_time {
            sampled.push((sample.time, sample.altitude));
            next_time += sample_interval;
        }
    }
    if sampled.last().map_or(true, |(time, _)| *time < last.time) {
        sampled.push((last.time, last.altitude));
    }

    wind_speeds
        .iter()
        .map(|&wind_speed| DriftProfile {
            wind_speed,
            points: sampled
                .iter()
                .map(|&(time, altitude)| DriftPoint {
                    time,
                    altitude,
                    distance: wind_speed * (time - start_time),
                })
                .collect(),
            landing_distance: wind_speed * (last.time - start_time),
        })
        .collect()
}
