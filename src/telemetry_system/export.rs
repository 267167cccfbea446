use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::drift::DriftProfile;
use super::telemetry::TrajectoryRecord;
use crate::errors::ExportError;
use crate::trajectory_system::engine::TrajectoryResult;

/// One CSV row per trajectory sample, with a header.
pub fn write_trajectory_csv<W: Write>(
    trajectory: &TrajectoryRecord,
    writer: W,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for sample in trajectory.iter() {
        csv_writer.serialize(sample)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn save_trajectory_csv(trajectory: &TrajectoryRecord, path: &Path) -> Result<(), ExportError> {
    write_trajectory_csv(trajectory, File::create(path)?)
}

#[derive(Debug, Serialize)]
struct DriftRow {
    wind_speed: f64,
    time: f64,
    altitude: f64,
    distance: f64,
}

pub fn write_drift_csv<W: Write>(profiles: &[DriftProfile], writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for profile in profiles {
        for point in &profile.points {
            csv_writer.serialize(DriftRow {
                wind_speed: profile.wind_speed,
                time: point.time,
                altitude: point.altitude,
                distance: point.distance,
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum ResultReport<'a> {
    Landed {
        summary: &'a super::telemetry::FlightSummary,
        transitions: &'a [crate::control::sequencer::StageTransition],
    },
    TimeLimitExceeded {
        warning: &'a crate::errors::ConvergenceWarning,
        transitions: &'a [crate::control::sequencer::StageTransition],
    },
}

/// Summary (or convergence warning) plus stage transitions, as pretty JSON.
pub fn write_result_json<W: Write>(result: &TrajectoryResult, writer: W) -> Result<(), ExportError> {
    let transitions = result.trajectory().transitions();
    let report = match result {
        TrajectoryResult::Landed { summary, .. } => ResultReport::Landed {
            summary,
            transitions,
        },
        TrajectoryResult::TimeLimitExceeded { warning, .. } => ResultReport::TimeLimitExceeded {
            warning,
            transitions,
        },
    };
    serde_json::to_writer_pretty(writer, &report)?;
    Ok(())
}
