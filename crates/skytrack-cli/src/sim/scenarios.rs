//! Simulated fleet: drones on paths around a center, sampled into feed messages.

use super::paths::{offset_by_bearing, CircularPath, FlightPath, LinearPath};
use rand::Rng;
use skytrack_core::{Feature, FeatureCollection, LngLat};
use std::sync::Arc;

/// One simulated vehicle.
pub struct SimDrone {
    pub serial: String,
    pub registration: String,
    pub path: Arc<dyn FlightPath>,
}

/// A named set of drones flying at the same time.
pub struct Scenario {
    pub name: String,
    pub drones: Vec<SimDrone>,
}

impl Scenario {
    /// Sample every drone at `t` seconds into one feed message.
    pub fn message_at(&self, t: f64) -> FeatureCollection {
        let features = self
            .drones
            .iter()
            .map(|drone| {
                let sample = drone.path.sample(t);
                Feature::point(
                    &drone.serial,
                    &drone.registration,
                    LngLat::new(sample.lon, sample.lat),
                    sample.altitude_m.round(),
                    sample.heading_deg,
                )
            })
            .collect();
        FeatureCollection::new(features)
    }
}

/// Registration for the `index`-th drone: even indices fly as `DR-B`,
/// odd ones as `DR-R`.
pub fn registration_for(index: usize) -> String {
    let prefix = if index % 2 == 0 { "B" } else { "R" };
    format!("DR-{}{:03}", prefix, index + 1)
}

/// `count` drones spread around a center, alternating between orbits and
/// out-and-back legs with randomized radius, speed and altitude.
pub fn create_swarm_scenario<R: Rng>(
    center_lat: f64,
    center_lon: f64,
    count: usize,
    rng: &mut R,
) -> Scenario {
    let drones = (0..count)
        .map(|i| {
            let bearing = (i as f64 * 360.0 / count.max(1) as f64).to_radians();
            let altitude_m = rng.random_range(40.0..150.0);
            let speed_mps = rng.random_range(8.0..20.0);

            let path: Arc<dyn FlightPath> = if i % 3 == 2 {
                let (start_lat, start_lon) =
                    offset_by_bearing(center_lat, center_lon, rng.random_range(500.0..2_000.0), bearing);
                let (end_lat, end_lon) = offset_by_bearing(
                    center_lat,
                    center_lon,
                    rng.random_range(500.0..2_000.0),
                    bearing + std::f64::consts::PI,
                );
                Arc::new(LinearPath::new(
                    start_lat, start_lon, end_lat, end_lon, altitude_m, speed_mps,
                ))
            } else {
                let (orbit_lat, orbit_lon) =
                    offset_by_bearing(center_lat, center_lon, rng.random_range(0.0..3_000.0), bearing);
                Arc::new(CircularPath::new(
                    orbit_lat,
                    orbit_lon,
                    rng.random_range(200.0..800.0),
                    altitude_m,
                    speed_mps,
                    rng.random_range(0.0..std::f64::consts::TAU),
                    rng.random_bool(0.5),
                ))
            };

            SimDrone {
                serial: format!("SIM{:04}", i + 1),
                registration: registration_for(i),
                path,
            }
        })
        .collect();

    Scenario {
        name: "swarm".to_string(),
        drones,
    }
}
