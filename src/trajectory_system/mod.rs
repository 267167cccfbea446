pub mod aerodynamics;
pub mod engine;
pub mod kinematics;
