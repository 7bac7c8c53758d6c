//! Flight paths the simulated drones follow.

use std::f64::consts::PI;

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// A point sampled from a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    /// Degrees clockwise from north, in `[0, 360)`.
    pub heading_deg: f64,
}

pub trait FlightPath: Send + Sync {
    /// (lat, lon, altitude_m) at `t` seconds from start.
    fn position(&self, t: f64) -> (f64, f64, f64);

    /// Heading at `t`, estimated from a short look-ahead.
    fn heading(&self, t: f64) -> f64 {
        let (lat1, lon1, _) = self.position(t);
        let (lat2, lon2, _) = self.position(t + 0.1);
        bearing_deg(lat1, lon1, lat2, lon2)
    }

    fn sample(&self, t: f64) -> PathSample {
        let (lat, lon, altitude_m) = self.position(t);
        PathSample {
            lat,
            lon,
            altitude_m,
            heading_deg: self.heading(t),
        }
    }
}

/// Orbit around a center point.
pub struct CircularPath {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_m: f64,
    pub altitude_m: f64,
    pub start_angle: f64,
    pub clockwise: bool,
    period: f64,
}

impl CircularPath {
    pub fn new(
        center_lat: f64,
        center_lon: f64,
        radius_m: f64,
        altitude_m: f64,
        speed_mps: f64,
        start_angle: f64,
        clockwise: bool,
    ) -> Self {
        let period = 2.0 * PI * radius_m / speed_mps.max(0.1);
        Self {
            center_lat,
            center_lon,
            radius_m,
            altitude_m,
            start_angle,
            clockwise,
            period,
        }
    }

    pub fn period(&self) -> f64 {
        self.period
    }
}

impl FlightPath for CircularPath {
    fn position(&self, t: f64) -> (f64, f64, f64) {
        let sweep = 2.0 * PI * t / self.period;
        let angle = if self.clockwise {
            self.start_angle + sweep
        } else {
            self.start_angle - sweep
        };

        // Angle measured clockwise from north, so north is cos and east is sin.
        let lat_offset = (self.radius_m / METERS_PER_DEG_LAT) * angle.cos();
        let lon_offset =
            (self.radius_m / (METERS_PER_DEG_LAT * self.center_lat.to_radians().cos())) * angle.sin();

        (
            self.center_lat + lat_offset,
            self.center_lon + lon_offset,
            self.altitude_m,
        )
    }
}

/// Out-and-back leg between two points. Reverses at each end so the
/// drone stays in the air for the whole run.
pub struct LinearPath {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    pub altitude_m: f64,
    pub distance_m: f64,
    leg_secs: f64,
}

impl LinearPath {
    pub fn new(
        start_lat: f64,
        start_lon: f64,
        end_lat: f64,
        end_lon: f64,
        altitude_m: f64,
        speed_mps: f64,
    ) -> Self {
        let distance_m = haversine_distance(start_lat, start_lon, end_lat, end_lon);
        let leg_secs = if speed_mps > 0.0 {
            distance_m / speed_mps
        } else {
            0.0
        };

        Self {
            start_lat,
            start_lon,
            end_lat,
            end_lon,
            altitude_m,
            distance_m,
            leg_secs,
        }
    }

    pub fn leg_secs(&self) -> f64 {
        self.leg_secs
    }

    fn progress(&self, t: f64) -> f64 {
        if self.leg_secs <= 0.0 {
            return 0.0;
        }
        let cycle = (t / self.leg_secs).rem_euclid(2.0);
        if cycle <= 1.0 {
            cycle
        } else {
            2.0 - cycle
        }
    }
}

impl FlightPath for LinearPath {
    fn position(&self, t: f64) -> (f64, f64, f64) {
        let progress = self.progress(t);
        (
            self.start_lat + progress * (self.end_lat - self.start_lat),
            self.start_lon + progress * (self.end_lon - self.start_lon),
            self.altitude_m,
        )
    }
}

/// Initial bearing from point 1 to point 2, degrees in `[0, 360)`.
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = lat2 - lat1;
    let dlon = (lon2 - lon1) * lat1.to_radians().cos();
    if dlat.abs() < 1e-12 && dlon.abs() < 1e-12 {
        return 0.0;
    }
    dlon.atan2(dlat).to_degrees().rem_euclid(360.0)
}

/// Great-circle distance in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Destination point `distance_m` away along `bearing_rad` (0 = north).
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular = distance_m / EARTH_RADIUS_M;

    let sin_lat2 = lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
    let y = bearing_rad.sin() * angular.sin() * lat1.cos();
    let x = angular.cos() - lat1.sin() * sin_lat2;
    let lon2 = lon1 + y.atan2(x);

    (lat2.to_degrees(), (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0)
}
