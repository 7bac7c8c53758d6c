//! Core data models for the live track map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of trajectory points kept per track.
pub const TRAJECTORY_CAPACITY: usize = 100;

/// A (longitude, latitude) pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// `[lng, lat]` as used by map backends.
    pub fn to_array(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// One telemetry sample for one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialUpdate {
    pub track_id: String,
    pub registration: String,
    pub position: LngLat,
    pub altitude: f64,
    /// Orientation in degrees, 0 = North.
    pub heading: f64,
}

/// Track classification derived from the registration label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Second registration segment starts with `B`
    A,
    /// Everything else, including registrations without a separator
    #[default]
    B,
}

impl Classification {
    /// Split on `-`, take the second segment, A when it starts with `B`.
    pub fn from_registration(registration: &str) -> Self {
        match registration.split('-').nth(1) {
            Some(segment) if segment.starts_with('B') => Classification::A,
            _ => Classification::B,
        }
    }

    pub fn color(self) -> TrackColor {
        match self {
            Classification::A => TrackColor::Accent1,
            Classification::B => TrackColor::Accent2,
        }
    }
}

/// Fixed display colors, one per classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackColor {
    Accent1,
    Accent2,
}

impl TrackColor {
    pub fn hex(self) -> &'static str {
        match self {
            TrackColor::Accent1 => "#00ff88",
            TrackColor::Accent2 => "#ff0044",
        }
    }

    /// Hex value without the leading `#`, safe for use inside keys.
    pub fn key_fragment(self) -> &'static str {
        &self.hex()[1..]
    }
}

/// Persistent per-track record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: String,
    pub registration: String,
    pub classification: Classification,
    pub position: LngLat,
    pub altitude: f64,
    pub heading: f64,
    /// Oldest first, bounded by the store capacity
    pub trajectory: VecDeque<LngLat>,
    pub first_observed_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub update_count: u64,
}

impl TrackRecord {
    /// Create an empty record for a newly observed track.
    pub fn new(update: &PartialUpdate, observed_at: DateTime<Utc>) -> Self {
        Self {
            id: update.track_id.clone(),
            registration: update.registration.clone(),
            classification: Classification::from_registration(&update.registration),
            position: update.position,
            altitude: update.altitude,
            heading: update.heading,
            trajectory: VecDeque::new(),
            first_observed_at: observed_at,
            last_updated_at: observed_at,
            update_count: 0,
        }
    }

    /// Merge one update, keeping at most `capacity` trajectory points.
    pub fn apply(&mut self, update: &PartialUpdate, capacity: usize, now: DateTime<Utc>) {
        self.classification = Classification::from_registration(&update.registration);

        self.trajectory.push_back(update.position);
        while self.trajectory.len() > capacity.max(1) {
            self.trajectory.pop_front();
        }

        self.registration.clone_from(&update.registration);
        self.altitude = update.altitude;
        self.heading = update.heading;
        self.position = update.position;
        self.last_updated_at = now;
        self.update_count += 1;
    }

    pub fn color(&self) -> TrackColor {
        self.classification.color()
    }

    /// Whole seconds since the track was first observed, rounded.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        let millis = (now - self.first_observed_at).num_milliseconds().max(0);
        (millis + 500) / 1000
    }
}

/// Format elapsed seconds as `m:ss`.
pub fn format_elapsed(total_secs: i64) -> String {
    let total_secs = total_secs.max(0);
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
