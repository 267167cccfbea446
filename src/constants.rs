// Physical Constants
pub const GRAVITY: f64 = 9.81; // m/s²
pub const EARTH_RADIUS: f64 = 6_371_000.0; // meters

// Environmental Constants
pub const AIR_DENSITY_SEA_LEVEL: f64 = 1.225; // kg/m³
pub const SEA_LEVEL_TEMPERATURE: f64 = 288.15; // K
pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0; // Pa
pub const TROPOSPHERE_TEMP_GRADIENT: f64 = -6.5 / 1_000.0; // K per meter
pub const TROPOSPHERE_HEIGHT: f64 = 11_000.0; // m
pub const SPECIFIC_GAS_CONSTANT_AIR: f64 = 287.05; // J/(kg·K)
pub const BAROMETRIC_EXPONENT: f64 = 5.255;

// Simulation Parameters
pub const TIME_STEP: f64 = 0.001; // s
pub const MAX_SIMULATION_TIME: f64 = 300.0; // s

// Parachute Defaults
pub const PARACHUTE_OPEN_DRAG_COEFFICIENT: f64 = 1.5;

// Empirical drag-area curve of a reefed hemispherical canopy:
// CdA_reefed / CdA_open = SLOPE * diameter_ratio + OFFSET
pub const REEFED_DRAG_AREA_SLOPE: f64 = 1.43;
pub const REEFED_DRAG_AREA_OFFSET: f64 = -0.12;

// Wind drift sweep (m/s)
pub const MAX_DRIFT_WIND_SPEED: u32 = 20;
pub const DRIFT_WIND_SPEED_STEP: u32 = 2;
pub const DRIFT_SAMPLE_INTERVAL: f64 = 1.0; // s
