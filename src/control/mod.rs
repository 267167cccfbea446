pub mod environment;
pub mod parachute;
pub mod sequencer;
pub mod vehicle;
