use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::errors::{require_non_negative, ConfigurationError, SimulationError};
use crate::trajectory_system::engine::{run, TrajectoryResult};

/// Monte-Carlo sweep over the drag coefficients of the canopy.
///
/// Each run scales `reefed_cd` and `open_cd` by independent factors drawn
/// uniformly from `1 ± uncertainty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispersionConfig {
    pub runs: usize,
    pub seed: u64,
    pub reefed_cd_uncertainty: f64,
    pub open_cd_uncertainty: f64,
}

impl Default for DispersionConfig {
    fn default() -> Self {
        DispersionConfig {
            runs: 100,
            seed: 0,
            reefed_cd_uncertainty: 0.15,
            open_cd_uncertainty: 0.05,
        }
    }
}

impl DispersionConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.runs == 0 {
            return Err(ConfigurationError::NonPositive {
                field: "dispersion runs",
                value: 0.0,
            });
        }
        for (field, value) in [
            ("reefed Cd uncertainty", self.reefed_cd_uncertainty),
            ("open Cd uncertainty", self.open_cd_uncertainty),
        ] {
            require_non_negative(field, value)?;
            if value >= 1.0 {
                return Err(ConfigurationError::AboveLimit {
                    field,
                    value,
                    limit: 1.0,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spread {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl Spread {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Spread { min, mean, max })
    }
}

impl fmt::Display for Spread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min {:.2} / mean {:.2} / max {:.2}",
            self.min, self.mean, self.max
        )
    }
}

/// Statistics over the runs that landed. `None` when none of them did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispersionReport {
    pub runs: usize,
    pub time_limit_runs: usize,
    pub touchdown_velocity: Option<Spread>,
    pub peak_deceleration: Option<Spread>,
    pub flight_time: Option<Spread>,
}

impl fmt::Display for DispersionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Dispersion ({} runs) ---", self.runs)?;
        let rows = [
            ("Touchdown Velocity (m/s)", self.touchdown_velocity),
            ("Peak Deceleration (m/s²)", self.peak_deceleration),
            ("Flight Time (s)", self.flight_time),
        ];
        for (label, spread) in rows {
            match spread {
                Some(spread) => writeln!(f, "{}: {}", label, spread)?,
                None => writeln!(f, "{}: no landed runs", label)?,
            }
        }
        writeln!(f, "Runs past the time bound: {}", self.time_limit_runs)
    }
}

/// Runs `dispersion.runs` perturbed copies of `base`. The same seed always
/// gives the same report.
pub fn run_dispersion(
    base: &SimulationConfig,
    dispersion: &DispersionConfig,
) -> Result<DispersionReport, SimulationError> {
    base.validate()?;
    dispersion.validate()?;

    let mut rng = StdRng::seed_from_u64(dispersion.seed);
    let mut touchdown_velocities = Vec::with_capacity(dispersion.runs);
    let mut peak_decelerations = Vec::with_capacity(dispersion.runs);
    let mut flight_times = Vec::with_capacity(dispersion.runs);
    let mut time_limit_runs = 0;

    for index in 0..dispersion.runs {
        let config = perturbed(base, dispersion, &mut rng);
        match run(&config)? {
            TrajectoryResult::Landed { summary, .. } => {
                debug!(
                    run = index,
                    touchdown_velocity = summary.touchdown_velocity,
                    "dispersion run landed"
                );
                touchdown_velocities.push(summary.touchdown_velocity);
                peak_decelerations.push(summary.peak_deceleration);
                flight_times.push(summary.flight_time);
            }
            TrajectoryResult::TimeLimitExceeded { .. } => time_limit_runs += 1,
        }
    }

    let report = DispersionReport {
        runs: dispersion.runs,
        time_limit_runs,
        touchdown_velocity: Spread::from_values(&touchdown_velocities),
        peak_deceleration: Spread::from_values(&peak_decelerations),
        flight_time: Spread::from_values(&flight_times),
    };
    info!(
        runs = report.runs,
        time_limit_runs = report.time_limit_runs,
        "dispersion finished"
    );
    Ok(report)
}

fn perturbed(
    base: &SimulationConfig,
    dispersion: &DispersionConfig,
    rng: &mut StdRng,
) -> SimulationConfig {
    let reefed_factor = 1.0 + dispersion.reefed_cd_uncertainty * rng.gen_range(-1.0..=1.0);
    let open_factor = 1.0 + dispersion.open_cd_uncertainty * rng.gen_range(-1.0..=1.0);

    let mut config = base.clone();
    let parachute = config.kind.parachute_mut();
    parachute.reefed_cd *= reefed_factor;
    parachute.open_cd *= open_factor;
    config
}
