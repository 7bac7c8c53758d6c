//! Telemetry simulation for the feed server.

pub mod paths;
pub mod scenarios;

pub use paths::{CircularPath, FlightPath, LinearPath, PathSample};
pub use scenarios::{create_swarm_scenario, registration_for, Scenario, SimDrone};
