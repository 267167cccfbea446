pub mod drift;
pub mod export;
pub mod telemetry;
