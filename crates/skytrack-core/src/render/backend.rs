//! Contract between the reconciler and a stateful map-drawing backend.
//!
//! The backend owns tiles, projection and compositing. The reconciler only
//! creates and updates sources by key, binds icons and moves the camera.
//! Interaction flows the other way as [`MapEvent`] values that the host feeds
//! back into the session.

use crate::models::{LngLat, TrackColor, TrackRecord};
use crate::render::icons::{IconImage, IconKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which drawable a primitive key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Path,
    Marker,
}

impl PrimitiveKind {
    fn prefix(self) -> &'static str {
        match self {
            PrimitiveKind::Path => "path-",
            PrimitiveKind::Marker => "marker-",
        }
    }
}

/// Backend key of a per-track primitive, rendered as `path-<id>` / `marker-<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimitiveKey {
    pub kind: PrimitiveKind,
    pub track_id: String,
}

impl PrimitiveKey {
    pub fn path(track_id: impl Into<String>) -> Self {
        Self {
            kind: PrimitiveKind::Path,
            track_id: track_id.into(),
        }
    }

    pub fn marker(track_id: impl Into<String>) -> Self {
        Self {
            kind: PrimitiveKind::Marker,
            track_id: track_id.into(),
        }
    }

    /// Parse a backend layer id back into a key.
    pub fn parse(raw: &str) -> Option<Self> {
        [PrimitiveKind::Path, PrimitiveKind::Marker]
            .into_iter()
            .find_map(|kind| {
                raw.strip_prefix(kind.prefix())
                    .filter(|id| !id.is_empty())
                    .map(|id| Self {
                        kind,
                        track_id: id.to_string(),
                    })
            })
    }
}

impl fmt::Display for PrimitiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.track_id)
    }
}

/// Paint of a trajectory line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: TrackColor,
    pub width: f64,
    /// (zoom, opacity) stops, interpolated linearly
    pub opacity_stops: [(f64, f64); 2],
}

impl LineStyle {
    pub fn for_color(color: TrackColor) -> Self {
        Self {
            color,
            width: 2.0,
            opacity_stops: [(10.0, 0.4), (15.0, 0.8)],
        }
    }

    pub fn opacity_at(&self, zoom: f64) -> f64 {
        let [(z0, o0), (z1, o1)] = self.opacity_stops;
        if zoom <= z0 {
            o0
        } else if zoom >= z1 {
            o1
        } else {
            o0 + (o1 - o0) * (zoom - z0) / (z1 - z0)
        }
    }
}

/// Properties attached to a marker's point source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerProperties {
    pub id: String,
    pub yaw: f64,
    pub altitude: f64,
    pub registration: String,
    pub color: TrackColor,
    pub opacity: f64,
}

impl MarkerProperties {
    pub fn for_track(record: &TrackRecord, selected: bool) -> Self {
        Self {
            id: record.id.clone(),
            yaw: record.heading,
            altitude: record.altitude,
            registration: record.registration.clone(),
            color: record.color(),
            opacity: if selected { 1.0 } else { 0.9 },
        }
    }
}

/// Transient hover overlay shown near a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub track_id: String,
    pub anchor: LngLat,
    /// Pixel offset from the anchor, overlay sits above the marker
    pub offset: [f64; 2],
    pub color: TrackColor,
    pub registration: String,
    pub altitude: f64,
    pub elapsed: String,
    pub coordinates: String,
}

impl Overlay {
    pub fn for_track(record: &TrackRecord, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            track_id: record.id.clone(),
            anchor: record.position,
            offset: [0.0, -20.0],
            color: record.color(),
            registration: record.registration.clone(),
            altitude: record.altitude,
            elapsed: crate::models::format_elapsed(record.elapsed_secs(now)),
            coordinates: format!("[{:.6}, {:.6}]", record.position.lng, record.position.lat),
        }
    }

    /// Text body, one entry per rendered line.
    pub fn lines(&self) -> Vec<String> {
        vec![
            self.registration.clone(),
            format!("Altitude: {}m", self.altitude),
            format!("Flight time: {}", self.elapsed),
            self.coordinates.clone(),
        ]
    }
}

/// Events raised by the backend and fed back into the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "key", rename_all = "snake_case")]
pub enum MapEvent {
    PointerEnter(PrimitiveKey),
    PointerLeave(PrimitiveKey),
    Click(PrimitiveKey),
    DragStart,
    ZoomStart,
    /// An icon passed to `register_icon_asset` finished loading
    IconReady(IconKey),
}

/// Stateful drawing backend driven by the reconciler.
pub trait MapBackend {
    fn add_line_source(&mut self, key: &PrimitiveKey, points: &[LngLat], style: &LineStyle);

    /// Replace the complete geometry of an existing line.
    fn update_line_data(&mut self, key: &PrimitiveKey, points: &[LngLat]);

    fn add_point_source(
        &mut self,
        key: &PrimitiveKey,
        point: LngLat,
        properties: &MarkerProperties,
        icon: &IconKey,
    );

    fn update_point_data(&mut self, key: &PrimitiveKey, point: LngLat, properties: &MarkerProperties);

    /// Start loading an icon. Readiness is reported later as
    /// [`MapEvent::IconReady`]; until then the backend draws a fallback.
    fn register_icon_asset(&mut self, key: &IconKey, image: &IconImage);

    fn set_layer_icon(&mut self, key: &PrimitiveKey, icon: &IconKey);

    /// Deliver pointer-enter, pointer-leave and click for this primitive.
    fn subscribe_marker(&mut self, key: &PrimitiveKey);

    fn unsubscribe_marker(&mut self, key: &PrimitiveKey);

    /// Deliver raw `dragstart` and `zoomstart` gestures.
    fn subscribe_gestures(&mut self);

    fn unsubscribe_gestures(&mut self);

    fn pan_to(&mut self, center: LngLat, duration: Duration);

    fn fly_to(&mut self, center: LngLat, zoom: f64, duration: Duration);

    /// Place the camera without animation.
    fn jump_to(&mut self, center: LngLat, zoom: f64);

    fn show_overlay(&mut self, overlay: &Overlay);

    fn remove_overlay(&mut self);

    fn set_pointer_cursor(&mut self, pointer: bool);

    /// Final teardown; no other call follows.
    fn release(&mut self);
}

impl<T: MapBackend + ?Sized> MapBackend for &mut T {
    fn add_line_source(&mut self, key: &PrimitiveKey, points: &[LngLat], style: &LineStyle) {
        (**self).add_line_source(key, points, style)
    }

    fn update_line_data(&mut self, key: &PrimitiveKey, points: &[LngLat]) {
        (**self).update_line_data(key, points)
    }

    fn add_point_source(
        &mut self,
        key: &PrimitiveKey,
        point: LngLat,
        properties: &MarkerProperties,
        icon: &IconKey,
    ) {
        (**self).add_point_source(key, point, properties, icon)
    }

    fn update_point_data(&mut self, key: &PrimitiveKey, point: LngLat, properties: &MarkerProperties) {
        (**self).update_point_data(key, point, properties)
    }

    fn register_icon_asset(&mut self, key: &IconKey, image: &IconImage) {
        (**self).register_icon_asset(key, image)
    }

    fn set_layer_icon(&mut self, key: &PrimitiveKey, icon: &IconKey) {
        (**self).set_layer_icon(key, icon)
    }

    fn subscribe_marker(&mut self, key: &PrimitiveKey) {
        (**self).subscribe_marker(key)
    }

    fn unsubscribe_marker(&mut self, key: &PrimitiveKey) {
        (**self).unsubscribe_marker(key)
    }

    fn subscribe_gestures(&mut self) {
        (**self).subscribe_gestures()
    }

    fn unsubscribe_gestures(&mut self) {
        (**self).unsubscribe_gestures()
    }

    fn pan_to(&mut self, center: LngLat, duration: Duration) {
        (**self).pan_to(center, duration)
    }

    fn fly_to(&mut self, center: LngLat, zoom: f64, duration: Duration) {
        (**self).fly_to(center, zoom, duration)
    }

    fn jump_to(&mut self, center: LngLat, zoom: f64) {
        (**self).jump_to(center, zoom)
    }

    fn show_overlay(&mut self, overlay: &Overlay) {
        (**self).show_overlay(overlay)
    }

    fn remove_overlay(&mut self) {
        (**self).remove_overlay()
    }

    fn set_pointer_cursor(&mut self, pointer: bool) {
        (**self).set_pointer_cursor(pointer)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_key_round_trip() {
        let key = PrimitiveKey::marker("S-1");
        assert_eq!(key.to_string(), "marker-S-1");
        assert_eq!(PrimitiveKey::parse("marker-S-1"), Some(key));
        assert_eq!(PrimitiveKey::parse("path-S1"), Some(PrimitiveKey::path("S1")));
        assert_eq!(PrimitiveKey::parse("marker-"), None);
        assert_eq!(PrimitiveKey::parse("label-S1"), None);
    }

    #[test]
    fn test_line_opacity_interpolates_with_zoom() {
        let style = LineStyle::for_color(TrackColor::Accent1);
        assert_eq!(style.opacity_at(5.0), 0.4);
        assert!((style.opacity_at(12.5) - 0.6).abs() < 1e-9);
        assert_eq!(style.opacity_at(18.0), 0.8);
    }
}
