//! In-memory backend that records every call, for tests and dry runs.

use crate::models::LngLat;
use crate::render::backend::{LineStyle, MapBackend, MarkerProperties, Overlay, PrimitiveKey};
use crate::render::icons::{IconImage, IconKey};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    AddLine { key: PrimitiveKey, points: Vec<LngLat> },
    UpdateLine { key: PrimitiveKey, points: Vec<LngLat> },
    AddPoint { key: PrimitiveKey, point: LngLat, properties: MarkerProperties, icon: IconKey },
    UpdatePoint { key: PrimitiveKey, point: LngLat, properties: MarkerProperties },
    RegisterIcon(IconKey),
    SetLayerIcon { key: PrimitiveKey, icon: IconKey },
    SubscribeMarker(PrimitiveKey),
    UnsubscribeMarker(PrimitiveKey),
    SubscribeGestures,
    UnsubscribeGestures,
    PanTo { center: LngLat, duration: Duration },
    FlyTo { center: LngLat, zoom: f64, duration: Duration },
    JumpTo { center: LngLat, zoom: f64 },
    ShowOverlay(Overlay),
    RemoveOverlay,
    SetPointerCursor(bool),
    Release,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far.
    pub fn take(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }
}

impl MapBackend for RecordingBackend {
    fn add_line_source(&mut self, key: &PrimitiveKey, points: &[LngLat], _style: &LineStyle) {
        self.calls.push(BackendCall::AddLine {
            key: key.clone(),
            points: points.to_vec(),
        });
    }

    fn update_line_data(&mut self, key: &PrimitiveKey, points: &[LngLat]) {
        self.calls.push(BackendCall::UpdateLine {
            key: key.clone(),
            points: points.to_vec(),
        });
    }

    fn add_point_source(
        &mut self,
        key: &PrimitiveKey,
        point: LngLat,
        properties: &MarkerProperties,
        icon: &IconKey,
    ) {
        self.calls.push(BackendCall::AddPoint {
            key: key.clone(),
            point,
            properties: properties.clone(),
            icon: *icon,
        });
    }

    fn update_point_data(&mut self, key: &PrimitiveKey, point: LngLat, properties: &MarkerProperties) {
        self.calls.push(BackendCall::UpdatePoint {
            key: key.clone(),
            point,
            properties: properties.clone(),
        });
    }

    fn register_icon_asset(&mut self, key: &IconKey, _image: &IconImage) {
        self.calls.push(BackendCall::RegisterIcon(*key));
    }

    fn set_layer_icon(&mut self, key: &PrimitiveKey, icon: &IconKey) {
        self.calls.push(BackendCall::SetLayerIcon {
            key: key.clone(),
            icon: *icon,
        });
    }

    fn subscribe_marker(&mut self, key: &PrimitiveKey) {
        self.calls.push(BackendCall::SubscribeMarker(key.clone()));
    }

    fn unsubscribe_marker(&mut self, key: &PrimitiveKey) {
        self.calls.push(BackendCall::UnsubscribeMarker(key.clone()));
    }

    fn subscribe_gestures(&mut self) {
        self.calls.push(BackendCall::SubscribeGestures);
    }

    fn unsubscribe_gestures(&mut self) {
        self.calls.push(BackendCall::UnsubscribeGestures);
    }

    fn pan_to(&mut self, center: LngLat, duration: Duration) {
        self.calls.push(BackendCall::PanTo { center, duration });
    }

    fn fly_to(&mut self, center: LngLat, zoom: f64, duration: Duration) {
        self.calls.push(BackendCall::FlyTo {
            center,
            zoom,
            duration,
        });
    }

    fn jump_to(&mut self, center: LngLat, zoom: f64) {
        self.calls.push(BackendCall::JumpTo { center, zoom });
    }

    fn show_overlay(&mut self, overlay: &Overlay) {
        self.calls.push(BackendCall::ShowOverlay(overlay.clone()));
    }

    fn remove_overlay(&mut self) {
        self.calls.push(BackendCall::RemoveOverlay);
    }

    fn set_pointer_cursor(&mut self, pointer: bool) {
        self.calls.push(BackendCall::SetPointerCursor(pointer));
    }

    fn release(&mut self) {
        self.calls.push(BackendCall::Release);
    }
}
