//! Oriented marker icons and their global cache.
//!
//! Orientation is continuous, so icons are keyed by a quantized heading. With
//! one-degree buckets the cache holds at most 360 icons per color.

use crate::models::TrackColor;
use crate::render::backend::MapBackend;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Snap a heading in degrees to the nearest bucket in `[0, 360)`.
pub fn quantize_orientation(heading_deg: f64, bucket_deg: u16) -> u16 {
    if !heading_deg.is_finite() {
        return 0;
    }
    let bucket = f64::from(bucket_deg.clamp(1, 360));
    let snapped = (heading_deg.rem_euclid(360.0) / bucket).round() * bucket;
    if snapped >= 360.0 {
        0
    } else {
        snapped as u16
    }
}

/// Cache key of one icon asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconKey {
    pub orientation_deg: u16,
    pub color: TrackColor,
}

impl IconKey {
    pub fn new(heading_deg: f64, color: TrackColor, bucket_deg: u16) -> Self {
        Self {
            orientation_deg: quantize_orientation(heading_deg, bucket_deg),
            color,
        }
    }
}

impl fmt::Display for IconKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "drone-icon-{}-{}",
            self.orientation_deg,
            self.color.key_fragment()
        )
    }
}

/// SVG image for a marker: colored disc, white quad-rotor glyph and a
/// heading arrow outside the disc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    svg: String,
}

impl IconImage {
    pub fn render(key: &IconKey) -> Self {
        let color = key.color.hex();
        let yaw = key.orientation_deg;
        let svg = format!(
            concat!(
                r#"<svg width="50" height="50" viewBox="0 0 50 50" xmlns="http://www.w3.org/2000/svg">"#,
                r#"<circle cx="25" cy="25" r="18" fill="{color}" stroke="white" stroke-width="2"/>"#,
                r#"<g fill="white" transform="translate(25, 25)">"#,
                r#"<rect x="-6" y="-2" width="12" height="4" rx="2"/>"#,
                r#"<circle cx="-8" cy="-6" r="3" fill="none" stroke="white" stroke-width="1"/>"#,
                r#"<circle cx="8" cy="-6" r="3" fill="none" stroke="white" stroke-width="1"/>"#,
                r#"<circle cx="-8" cy="6" r="3" fill="none" stroke="white" stroke-width="1"/>"#,
                r#"<circle cx="8" cy="6" r="3" fill="none" stroke="white" stroke-width="1"/>"#,
                r#"<line x1="-6" y1="-2" x2="-8" y2="-6" stroke="white" stroke-width="1"/>"#,
                r#"<line x1="6" y1="-2" x2="8" y2="-6" stroke="white" stroke-width="1"/>"#,
                r#"<line x1="-6" y1="2" x2="-8" y2="6" stroke="white" stroke-width="1"/>"#,
                r#"<line x1="6" y1="2" x2="8" y2="6" stroke="white" stroke-width="1"/>"#,
                r#"</g>"#,
                r#"<g transform="rotate({yaw} 25 25)">"#,
                r#"<path d="M25 3 L28 8 L22 8 Z" fill="{color}" stroke="white" stroke-width="1"/>"#,
                r#"</g>"#,
                r#"</svg>"#,
            ),
            color = color,
            yaw = yaw,
        );
        Self { svg }
    }

    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn bytes(&self) -> &[u8] {
        self.svg.as_bytes()
    }

    pub fn data_url(&self) -> String {
        format!("data:image/svg+xml;base64,{}", STANDARD.encode(self.bytes()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconStatus {
    /// Handed to the backend, not yet confirmed
    Pending,
    Ready,
}

/// Global memo of registered icons, shared by every track.
#[derive(Debug, Default)]
pub struct IconCache {
    entries: HashMap<IconKey, IconStatus>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the icon with the backend unless it already was.
    /// Returns true when this call registered it.
    pub fn ensure<B: MapBackend>(&mut self, backend: &mut B, key: IconKey) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        backend.register_icon_asset(&key, &IconImage::render(&key));
        self.entries.insert(key, IconStatus::Pending);
        tracing::trace!(icon = %key, "icon asset registered");
        true
    }

    /// Record backend confirmation. Unknown keys are ignored.
    pub fn mark_ready(&mut self, key: &IconKey) {
        if let Some(status) = self.entries.get_mut(key) {
            *status = IconStatus::Ready;
        }
    }

    pub fn status(&self, key: &IconKey) -> Option<IconStatus> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_orientation() {
        assert_eq!(quantize_orientation(45.0, 1), 45);
        assert_eq!(quantize_orientation(45.4, 1), 45);
        assert_eq!(quantize_orientation(45.6, 1), 46);
        assert_eq!(quantize_orientation(359.7, 1), 0);
        assert_eq!(quantize_orientation(-90.0, 1), 270);
        assert_eq!(quantize_orientation(725.0, 1), 5);
        assert_eq!(quantize_orientation(44.0, 10), 40);
        assert_eq!(quantize_orientation(46.0, 10), 50);
        assert_eq!(quantize_orientation(f64::NAN, 1), 0);
        assert_eq!(quantize_orientation(12.0, 0), 12);
    }

    #[test]
    fn test_icon_key_display() {
        let key = IconKey::new(90.2, TrackColor::Accent1, 1);
        assert_eq!(key.to_string(), "drone-icon-90-00ff88");
    }

    #[test]
    fn test_icon_image_embeds_color_and_rotation() {
        let image = IconImage::render(&IconKey::new(135.0, TrackColor::Accent2, 1));
        assert!(image.svg().contains(r##"fill="#ff0044""##));
        assert!(image.svg().contains("rotate(135 25 25)"));
        assert!(image.data_url().starts_with("data:image/svg+xml;base64,"));
    }
}
