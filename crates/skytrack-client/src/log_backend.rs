//! Headless map backend that renders every call as a tracing event.
//!
//! Icons are "loaded" immediately: each registration queues an
//! [`MapEvent::IconReady`] for the host to feed back into the session.

use skytrack_core::render::{IconImage, LineStyle, MarkerProperties, Overlay};
use skytrack_core::{IconKey, LngLat, MapBackend, MapEvent, PrimitiveKey};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct LogBackend {
    lines: HashMap<PrimitiveKey, LineStyle>,
    points: HashSet<PrimitiveKey>,
    subscribed: HashSet<PrimitiveKey>,
    icon_urls: HashMap<IconKey, String>,
    zoom: f64,
    queued: Vec<MapEvent>,
    released: bool,
}

impl LogBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events raised since the last drain.
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.queued)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscribed.len()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Camera zoom after the last jump or fly-to.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Opacity a line is painted with at the current zoom.
    pub fn line_opacity(&self, key: &PrimitiveKey) -> Option<f64> {
        self.lines.get(key).map(|style| style.opacity_at(self.zoom))
    }

    /// Data URL an icon was registered under.
    pub fn icon_url(&self, key: &IconKey) -> Option<&str> {
        self.icon_urls.get(key).map(String::as_str)
    }
}

impl MapBackend for LogBackend {
    fn add_line_source(&mut self, key: &PrimitiveKey, points: &[LngLat], style: &LineStyle) {
        tracing::debug!(
            %key,
            points = points.len(),
            color = style.color.hex(),
            opacity = style.opacity_at(self.zoom),
            "add line"
        );
        self.lines.insert(key.clone(), style.clone());
    }

    fn update_line_data(&mut self, key: &PrimitiveKey, points: &[LngLat]) {
        tracing::trace!(%key, points = points.len(), "update line");
    }

    fn add_point_source(
        &mut self,
        key: &PrimitiveKey,
        point: LngLat,
        properties: &MarkerProperties,
        icon: &IconKey,
    ) {
        tracing::debug!(
            %key,
            lng = point.lng,
            lat = point.lat,
            registration = %properties.registration,
            %icon,
            "add marker"
        );
        self.points.insert(key.clone());
    }

    fn update_point_data(&mut self, key: &PrimitiveKey, point: LngLat, properties: &MarkerProperties) {
        tracing::trace!(
            %key,
            lng = point.lng,
            lat = point.lat,
            altitude = properties.altitude,
            "update marker"
        );
    }

    fn register_icon_asset(&mut self, key: &IconKey, image: &IconImage) {
        let url = image.data_url();
        tracing::debug!(icon = %key, bytes = image.bytes().len(), url_len = url.len(), "register icon");
        self.icon_urls.insert(*key, url);
        self.queued.push(MapEvent::IconReady(*key));
    }

    fn set_layer_icon(&mut self, key: &PrimitiveKey, icon: &IconKey) {
        tracing::trace!(%key, %icon, "rebind icon");
    }

    fn subscribe_marker(&mut self, key: &PrimitiveKey) {
        self.subscribed.insert(key.clone());
    }

    fn unsubscribe_marker(&mut self, key: &PrimitiveKey) {
        self.subscribed.remove(key);
    }

    fn subscribe_gestures(&mut self) {
        tracing::debug!("gesture subscription added");
    }

    fn unsubscribe_gestures(&mut self) {
        tracing::debug!("gesture subscription removed");
    }

    fn pan_to(&mut self, center: LngLat, duration: Duration) {
        tracing::debug!(lng = center.lng, lat = center.lat, ms = duration.as_millis() as u64, "pan");
    }

    fn fly_to(&mut self, center: LngLat, zoom: f64, duration: Duration) {
        self.zoom = zoom;
        tracing::info!(
            lng = center.lng,
            lat = center.lat,
            zoom,
            ms = duration.as_millis() as u64,
            "fly to"
        );
    }

    fn jump_to(&mut self, center: LngLat, zoom: f64) {
        self.zoom = zoom;
        tracing::info!(lng = center.lng, lat = center.lat, zoom, "camera placed");
    }

    fn show_overlay(&mut self, overlay: &Overlay) {
        tracing::info!(track_id = %overlay.track_id, "overlay: {}", overlay.lines().join(" | "));
    }

    fn remove_overlay(&mut self) {
        tracing::trace!("overlay removed");
    }

    fn set_pointer_cursor(&mut self, pointer: bool) {
        tracing::trace!(pointer, "cursor");
    }

    fn release(&mut self) {
        tracing::info!(
            lines = self.lines.len(),
            markers = self.points.len(),
            icons = self.icon_urls.len(),
            "backend released"
        );
        self.released = true;
    }
}
