use serde::{Deserialize, Serialize};

use crate::constants::{MAX_SIMULATION_TIME, TIME_STEP};
use crate::errors::{require_positive, ConfigurationError};

/// Fixed-step schemes for `h' = v`, `v' = a(h, v)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationScheme {
    /// Velocity first, then altitude from the updated velocity.
    #[default]
    SemiImplicitEuler,
    ExplicitEuler,
    RungeKutta4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicState {
    pub altitude: f64,
    pub velocity: f64,
}

impl IntegrationScheme {
    /// Advances `state` by `delta_time`.
    ///
    /// `acceleration` is `acceleration_at(state)`, already evaluated by the caller.
    /// Only the Runge-Kutta scheme calls `acceleration_at` again.
    pub fn advance<F>(
        self,
        state: KinematicState,
        acceleration: f64,
        delta_time: f64,
        acceleration_at: F,
    ) -> KinematicState
    where
        F: Fn(KinematicState) -> f64,
    {
        match self {
            Self::SemiImplicitEuler => {
                let velocity = state.velocity + acceleration * delta_time;
                KinematicState {
                    altitude: state.altitude + velocity * delta_time,
                    velocity,
                }
            }
            Self::ExplicitEuler => KinematicState {
                altitude: state.altitude + state.velocity * delta_time,
                velocity: state.velocity + acceleration * delta_time,
            },
            Self::RungeKutta4 => {
                let derivatives = |s: KinematicState| (s.velocity, acceleration_at(s));
                let offset = |k: (f64, f64), scale: f64| KinematicState {
                    altitude: state.altitude + k.0 * scale,
                    velocity: state.velocity + k.1 * scale,
                };

                let k1 = (state.velocity, acceleration);
                let k2 = derivatives(offset(k1, delta_time / 2.0));
                let k3 = derivatives(offset(k2, delta_time / 2.0));
                let k4 = derivatives(offset(k3, delta_time));

                KinematicState {
                    altitude: state.altitude
                        + (delta_time / 6.0) * (k1.0 + 2.0 * k2.0 + 2.0 * k3.0 + k4.0),
                    velocity: state.velocity
                        + (delta_time / 6.0) * (k1.1 + 2.0 * k2.1 + 2.0 * k3.1 + k4.1),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    #[serde(default)]
    pub scheme: IntegrationScheme,
    pub time_step: f64,
    /// Upper bound on simulated time; reaching it is reported, not treated as a landing.
    pub max_time: f64,
    /// Record one sample per interval instead of every step (s).
    #[serde(default)]
    pub sample_interval: Option<f64>,
    /// Stop once the terminal stage has settled to |a| below this value (m/s²)
    /// and extrapolate the rest of the descent at constant velocity.
    #[serde(default)]
    pub settle_tolerance: Option<f64>,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        IntegrationConfig {
            scheme: IntegrationScheme::default(),
            time_step: TIME_STEP,
            max_time: MAX_SIMULATION_TIME,
            sample_interval: None,
            settle_tolerance: None,
        }
    }
}

impl IntegrationConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        require_positive("time step", self.time_step)?;
        require_positive("max time", self.max_time)?;
        if self.max_time <= self.time_step {
            return Err(ConfigurationError::Integration(format!(
                "max time {} s must exceed the time step {} s",
                self.max_time, self.time_step
            )));
        }
        if let Some(interval) = self.sample_interval {
            require_positive("sample interval", interval)?;
            if interval < self.time_step {
                return Err(ConfigurationError::Integration(format!(
                    "sample interval {} s is shorter than the time step {} s",
                    interval, self.time_step
                )));
            }
        }
        if let Some(tolerance) = self.settle_tolerance {
            require_positive("settle tolerance", tolerance)?;
        }
        Ok(())
    }

    /// Number of integration steps between recorded samples.
    pub fn steps_per_sample(&self) -> u64 {
        self.sample_interval
            .map(|interval| (interval / self.time_step).round().max(1.0) as u64)
            .unwrap_or(1)
    }

    pub fn max_steps(&self) -> u64 {
        (self.max_time / self.time_step).ceil() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const GRAVITY: f64 = 9.81;

    fn free_fall(_: KinematicState) -> f64 {
        -GRAVITY
    }

    fn integrate(scheme: IntegrationScheme, steps: usize, delta_time: f64) -> KinematicState {
        let mut state = KinematicState {
            altitude: 100.0,
            velocity: 0.0,
        };
        for _ in 0..steps {
            state = scheme.advance(state, free_fall(state), delta_time, free_fall);
        }
        state
    }

    #[test]
    fn test_semi_implicit_euler_updates_velocity_first() {
        let state = integrate(IntegrationScheme::SemiImplicitEuler, 1, 0.1);
        assert_relative_eq!(state.velocity, -0.981, epsilon = 1e-12);
        assert_relative_eq!(state.altitude, 100.0 - 0.0981, epsilon = 1e-12);
    }

    #[test]
    fn test_explicit_euler_uses_old_velocity() {
        let state = integrate(IntegrationScheme::ExplicitEuler, 1, 0.1);
        assert_relative_eq!(state.velocity, -0.981, epsilon = 1e-12);
        assert_relative_eq!(state.altitude, 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_runge_kutta_is_exact_for_constant_acceleration() {
        let state = integrate(IntegrationScheme::RungeKutta4, 10, 0.1);
        assert_relative_eq!(state.velocity, -GRAVITY, epsilon = 1e-9);
        assert_relative_eq!(state.altitude, 100.0 - 0.5 * GRAVITY, epsilon = 1e-9);
    }

    #[test]
    fn test_schemes_agree_for_small_steps() {
        let reference = integrate(IntegrationScheme::RungeKutta4, 1_000, 0.001);
        for scheme in [
            IntegrationScheme::SemiImplicitEuler,
            IntegrationScheme::ExplicitEuler,
        ] {
            let state = integrate(scheme, 1_000, 0.001);
            assert_relative_eq!(state.altitude, reference.altitude, epsilon = 0.01);
            assert_relative_eq!(state.velocity, reference.velocity, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_integration_config_validation() {
        assert!(IntegrationConfig::default().validate().is_ok());

        let negative_step = IntegrationConfig {
            time_step: -0.01,
            ..IntegrationConfig::default()
        };
        assert!(negative_step.validate().is_err());

        let bound_below_step = IntegrationConfig {
            time_step: 1.0,
            max_time: 0.5,
            ..IntegrationConfig::default()
        };
        assert!(bound_below_step.validate().is_err());

        let coarse_sampling = IntegrationConfig {
            sample_interval: Some(0.0001),
            ..IntegrationConfig::default()
        };
        assert!(coarse_sampling.validate().is_err());
    }

    #[test]
    fn test_steps_per_sample() {
        let config = IntegrationConfig {
            time_step: 0.001,
            sample_interval: Some(0.1),
            ..IntegrationConfig::default()
        };
        assert_eq!(config.steps_per_sample(), 100);
        assert_eq!(IntegrationConfig::default().steps_per_sample(), 1);
        assert_eq!(IntegrationConfig::default().max_steps(), 300_000);
    }
}
