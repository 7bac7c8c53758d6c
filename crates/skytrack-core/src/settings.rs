//! Tunables for camera motion, icon quantization and display labels.

use crate::models::LngLat;
use serde::{Deserialize, Serialize};

/// View and rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Zoom level reached by the fly-to on a new selection
    pub fly_to_zoom: f64,
    /// Duration of the fly-to animation in milliseconds
    pub fly_to_ms: u64,
    /// Duration of the follow re-centering pan in milliseconds
    pub pan_ms: u64,
    /// Icon orientation bucket width in degrees
    pub icon_bucket_deg: u16,
    /// Trajectory points kept per track
    pub trajectory_capacity: usize,
    /// Camera center when the map is first created
    pub initial_center: LngLat,
    pub initial_zoom: f64,
    /// Operator shown in the track list
    pub operator_label: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            fly_to_zoom: 15.0,
            fly_to_ms: 1000,
            pan_ms: 100,
            icon_bucket_deg: 1,
            trajectory_capacity: crate::models::TRAJECTORY_CAPACITY,
            initial_center: LngLat::new(35.85, 32.55),
            initial_zoom: 7.0,
            operator_label: "Sager Drone".into(),
        }
    }
}
