use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Invalid or contradictory input, detected before any integration step runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be below {limit}, got {value}")]
    AboveLimit {
        field: &'static str,
        value: f64,
        limit: f64,
    },

    #[error("Reefing ratio must be in (0, 1], got {0}")]
    ReefingRatioOutOfRange(f64),

    #[error("Spill hole diameter {spill_hole} m must be smaller than the canopy diameter {diameter} m")]
    SpillHoleTooLarge {
        spill_hole: f64,
        diameter: f64,
    },

    #[error("Contradictory deployment triggers: {0}")]
    ContradictoryTriggers(String),

    #[error("Integration error: {0}")]
    Integration(String),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Numerical anomaly at t = {time:.4} s: {quantity} became {value}")]
    NumericalAnomaly {
        time: f64,
        quantity: &'static str,
        value: f64,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Returns the value when it is finite and strictly positive.
pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64, ConfigurationError> {
    let value = require_finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigurationError::NonPositive { field, value });
    }
    Ok(value)
}

pub(crate) fn require_non_negative(
    field: &'static str,
    value: f64,
) -> Result<f64, ConfigurationError> {
    let value = require_finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigurationError::Negative { field, value });
    }
    Ok(value)
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> Result<f64, ConfigurationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigurationError::NonFinite { field, value })
    }
}

/// The time bound was reached before ground contact.
///
/// Not an error: the run still hands back the trajectory computed so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergenceWarning {
    pub max_time: f64,
    pub final_altitude: f64,
    pub final_velocity: f64,
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no ground contact within {} s (altitude {:.2} m, velocity {:.2} m/s)",
            self.max_time, self.final_altitude, self.final_velocity
        )
    }
}
