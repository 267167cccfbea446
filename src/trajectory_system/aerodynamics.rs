pub fn dynamic_pressure(velocity: f64, air_density: f64) -> f64 {
    0.5 * air_density * velocity.powi(2)
}

/// Drag force (N) for a drag area `Cd·A`, signed to oppose `velocity`.
pub fn drag_force(velocity: f64, air_density: f64, drag_area: f64) -> f64 {
    let drag_magnitude = dynamic_pressure(velocity, air_density) * drag_area;
    -velocity.signum() * drag_magnitude
}

/// Speed at which drag balances weight for a constant drag area.
pub fn terminal_velocity(mass: f64, gravity: f64, air_density: f64, drag_area: f64) -> f64 {
    (2.0 * mass * gravity / (air_density * drag_area)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_drag_at_sea_level() {
        let drag = drag_force(-100.0, 1.225, 0.5 * 10.0);
        assert_relative_eq!(drag, 30_625.0, epsilon = EPSILON);
    }

    #[test]
    fn test_drag_sign_follows_velocity() {
        assert!(drag_force(10.0, 1.225, 1.0) < 0.0);
        assert!(drag_force(-10.0, 1.225, 1.0) > 0.0);
        assert_eq!(drag_force(0.0, 1.225, 1.0), 0.0);
    }

    #[test]
    fn test_zero_density_gives_no_drag() {
        assert_eq!(drag_force(-250.0, 0.0, 3.0), 0.0);
    }

    #[test]
    fn test_terminal_velocity_balances_weight() {
        let v = terminal_velocity(5.0, 9.81, 1.225, 1.5 * 2.0);
        assert_relative_eq!(v, 5.166_611_805_721, epsilon = 1e-9);
        assert_relative_eq!(drag_force(-v, 1.225, 3.0), 5.0 * 9.81, epsilon = EPSILON);
    }
}
