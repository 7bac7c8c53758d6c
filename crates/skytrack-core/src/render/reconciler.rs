//! Incremental reconciliation of track snapshots against a map backend.
//!
//! Primitives are created lazily on first sight of a track and only updated
//! afterwards. Marker interaction is subscribed in the create branch, so a
//! primitive is never subscribed twice.

use crate::models::{Classification, LngLat, TrackRecord};
use crate::render::backend::{LineStyle, MapBackend, MarkerProperties, Overlay, PrimitiveKey};
use crate::render::icons::{IconCache, IconKey, IconStatus};
use crate::selection::{CameraMove, SelectionState};
use crate::store::TrackStoreSnapshot;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// What one `sync` call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub paths_created: usize,
    pub paths_updated: usize,
    pub markers_created: usize,
    pub markers_updated: usize,
    pub icons_registered: usize,
    pub icons_rebound: usize,
    /// Tracks classified B in the synced snapshot
    pub b_count: usize,
}

#[derive(Debug, Clone)]
struct MarkerEntry {
    icon: IconKey,
}

/// Owns the visual primitive cache for one backend.
#[derive(Debug)]
pub struct RenderReconciler {
    paths: HashSet<String>,
    markers: HashMap<String, MarkerEntry>,
    icons: IconCache,
    hovered: Option<String>,
    icon_bucket_deg: u16,
}

impl Default for RenderReconciler {
    fn default() -> Self {
        Self::new(1)
    }
}

impl RenderReconciler {
    pub fn new(icon_bucket_deg: u16) -> Self {
        Self {
            paths: HashSet::new(),
            markers: HashMap::new(),
            icons: IconCache::new(),
            hovered: None,
            icon_bucket_deg: icon_bucket_deg.max(1),
        }
    }

    /// Bring the backend in line with `snapshot`.
    pub fn sync<B: MapBackend>(
        &mut self,
        backend: &mut B,
        snapshot: &TrackStoreSnapshot,
        selection: &SelectionState,
        now: DateTime<Utc>,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        for record in snapshot.iter() {
            self.sync_path(backend, record, &mut report);
            self.sync_marker(backend, record, selection.is_selected(&record.id), &mut report);
        }

        self.refresh_overlay(backend, snapshot, now);
        report.b_count = b_count(snapshot);

        tracing::trace!(
            tracks = snapshot.len(),
            paths_created = report.paths_created,
            markers_created = report.markers_created,
            icons_registered = report.icons_registered,
            "render sync"
        );
        report
    }

    fn sync_path<B: MapBackend>(&mut self, backend: &mut B, record: &TrackRecord, report: &mut SyncReport) {
        let key = PrimitiveKey::path(record.id.as_str());
        let points: Vec<LngLat> = record.trajectory.iter().copied().collect();

        if self.paths.contains(&record.id) {
            backend.update_line_data(&key, &points);
            report.paths_updated += 1;
        } else {
            backend.add_line_source(&key, &points, &LineStyle::for_color(record.color()));
            self.paths.insert(record.id.clone());
            report.paths_created += 1;
        }
    }

    fn sync_marker<B: MapBackend>(
        &mut self,
        backend: &mut B,
        record: &TrackRecord,
        selected: bool,
        report: &mut SyncReport,
    ) {
        let key = PrimitiveKey::marker(record.id.as_str());
        let properties = MarkerProperties::for_track(record, selected);
        let icon = IconKey::new(record.heading, record.color(), self.icon_bucket_deg);

        match self.markers.get_mut(&record.id) {
            Some(entry) => {
                backend.update_point_data(&key, record.position, &properties);
                if entry.icon != icon {
                    if self.icons.ensure(backend, icon) {
                        report.icons_registered += 1;
                    }
                    backend.set_layer_icon(&key, &icon);
                    entry.icon = icon;
                    report.icons_rebound += 1;
                }
                report.markers_updated += 1;
            }
            None => {
                if self.icons.ensure(backend, icon) {
                    report.icons_registered += 1;
                }
                backend.add_point_source(&key, record.position, &properties, &icon);
                backend.subscribe_marker(&key);
                self.markers.insert(record.id.clone(), MarkerEntry { icon });
                report.markers_created += 1;
            }
        }
    }

    /// Execute a camera move decided by the selection controller.
    pub fn apply_camera<B: MapBackend>(&mut self, backend: &mut B, camera: CameraMove) {
        match camera {
            CameraMove::FlyTo {
                center,
                zoom,
                duration,
            } => backend.fly_to(center, zoom, duration),
            CameraMove::PanTo { center, duration } => backend.pan_to(center, duration),
        }
    }

    /// Pointer entered a marker: remember it and show its overlay.
    pub fn pointer_enter<B: MapBackend>(
        &mut self,
        backend: &mut B,
        snapshot: &TrackStoreSnapshot,
        track_id: &str,
        now: DateTime<Utc>,
    ) {
        if !self.markers.contains_key(track_id) {
            return;
        }
        backend.set_pointer_cursor(true);
        self.hovered = Some(track_id.to_string());
        self.refresh_overlay(backend, snapshot, now);
    }

    /// Pointer left a marker: drop the overlay.
    pub fn pointer_leave<B: MapBackend>(&mut self, backend: &mut B) {
        backend.set_pointer_cursor(false);
        backend.remove_overlay();
        self.hovered = None;
    }

    fn refresh_overlay<B: MapBackend>(
        &self,
        backend: &mut B,
        snapshot: &TrackStoreSnapshot,
        now: DateTime<Utc>,
    ) {
        let Some(record) = self.hovered.as_deref().and_then(|id| snapshot.get(id)) else {
            return;
        };
        backend.show_overlay(&Overlay::for_track(record, now));
    }

    pub fn icon_ready(&mut self, key: &IconKey) {
        self.icons.mark_ready(key);
    }

    pub fn icon_status(&self, key: &IconKey) -> Option<IconStatus> {
        self.icons.status(key)
    }

    pub fn icon_count(&self) -> usize {
        self.icons.len()
    }

    pub fn has_marker(&self, track_id: &str) -> bool {
        self.markers.contains_key(track_id)
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Remove the overlay and every marker subscription.
    pub fn release<B: MapBackend>(&mut self, backend: &mut B) {
        backend.remove_overlay();
        self.hovered = None;
        for track_id in self.markers.keys() {
            backend.unsubscribe_marker(&PrimitiveKey::marker(track_id.as_str()));
        }
        tracing::debug!(markers = self.markers.len(), "released marker subscriptions");
    }
}

/// Number of tracks classified B.
pub fn b_count(snapshot: &TrackStoreSnapshot) -> usize {
    snapshot.count_classified(Classification::B)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PartialUpdate;
    use crate::render::recording::{BackendCall, RecordingBackend};
    use crate::store::TrackStore;

    fn update(id: &str, reg: &str, lng: f64, heading: f64) -> PartialUpdate {
        PartialUpdate {
            track_id: id.to_string(),
            registration: reg.to_string(),
            position: LngLat::new(lng, 32.0),
            altitude: 120.0,
            heading,
        }
    }

    #[test]
    fn test_first_sync_creates_then_updates_in_place() {
        let mut store = TrackStore::new();
        let mut backend = RecordingBackend::new();
        let mut reconciler = RenderReconciler::default();
        let selection = SelectionState::default();

        let snapshot = store.apply(vec![update("S1", "DR-B001", 35.0, 45.0)]);
        let report = reconciler.sync(&mut backend, &snapshot, &selection, Utc::now());
        assert_eq!(report.paths_created, 1);
        assert_eq!(report.markers_created, 1);
        assert_eq!(report.icons_registered, 1);

        let snapshot = store.apply(vec![update("S1", "DR-B001", 35.001, 45.0)]);
        let report = reconciler.sync(&mut backend, &snapshot, &selection, Utc::now());
        assert_eq!(report.paths_created, 0);
        assert_eq!(report.paths_updated, 1);
        assert_eq!(report.markers_updated, 1);
        assert_eq!(report.icons_rebound, 0);

        assert_eq!(backend.count(|c| matches!(c, BackendCall::AddLine { .. })), 1);
        assert_eq!(backend.count(|c| matches!(c, BackendCall::AddPoint { .. })), 1);
        assert_eq!(backend.count(|c| matches!(c, BackendCall::SubscribeMarker(_))), 1);
        assert_eq!(backend.count(|c| matches!(c, BackendCall::SetLayerIcon { .. })), 0);
    }

    #[test]
    fn test_line_update_carries_full_trajectory() {
        let mut store = TrackStore::new();
        let mut backend = RecordingBackend::new();
        let mut reconciler = RenderReconciler::default();
        let selection = SelectionState::default();

        let snapshot = store.apply(vec![update("S1", "DR-B001", 35.0, 0.0)]);
        reconciler.sync(&mut backend, &snapshot, &selection, Utc::now());
        let snapshot = store.apply(vec![update("S1", "DR-B001", 35.001, 0.0)]);
        backend.take();
        reconciler.sync(&mut backend, &snapshot, &selection, Utc::now());

        let line = backend.calls.iter().find_map(|call| match call {
            BackendCall::UpdateLine { points, .. } => Some(points.clone()),
            _ => None,
        });
        assert_eq!(
            line,
            Some(vec![LngLat::new(35.0, 32.0), LngLat::new(35.001, 32.0)])
        );
    }

    #[test]
    fn test_orientation_change_rebinds_icon() {
        let mut store = TrackStore::new();
        let mut backend = RecordingBackend::new();
        let mut reconciler = RenderReconciler::default();
        let selection = SelectionState::default();

        let snapshot = store.apply(vec![update("S1", "DR-B001", 35.0, 45.0)]);
        reconciler.sync(&mut backend, &snapshot, &selection, Utc::now());

        // Sub-degree change stays in the same bucket.
        let snapshot = store.apply(vec![update("S1", "DR-B001", 35.0, 45.3)]);
        let report = reconciler.sync(&mut backend, &snapshot, &selection, Utc::now());
        assert_eq!(report.icons_rebound, 0);

        let snapshot = store.apply(vec![update("S1", "DR-B001", 35.0, 90.0)]);
        let report = reconciler.sync(&mut backend, &snapshot, &selection, Utc::now());
        assert_eq!(report.icons_rebound, 1);
        assert_eq!(report.icons_registered, 1);
        assert!(backend.calls.contains(&BackendCall::SetLayerIcon {
            key: PrimitiveKey::marker("S1"),
            icon: IconKey::new(90.0, crate::models::TrackColor::Accent1, 1),
        }));
    }

    #[test]
    fn test_icons_are_shared_across_tracks() {
        let mut store = TrackStore::new();
        let mut backend = RecordingBackend::new();
        let mut reconciler = RenderReconciler::default();

        let snapshot = store.apply(vec![
            update("S1", "DR-B001", 35.0, 45.0),
            update("S2", "DR-B002", 35.1, 45.0),
            update("S3", "DR-R003", 35.2, 45.0),
        ]);
        let report = reconciler.sync(&mut backend, &snapshot, &SelectionState::default(), Utc::now());

        assert_eq!(report.markers_created, 3);
        assert_eq!(report.icons_registered, 2);
        assert_eq!(reconciler.icon_count(), 2);
        assert_eq!(report.b_count, 1);
    }

    #[test]
    fn test_pending_icon_does_not_block_binding() {
        let mut store = TrackStore::new();
        let mut backend = RecordingBackend::new();
        let mut reconciler = RenderReconciler::default();
        let key = IconKey::new(10.0, crate::models::TrackColor::Accent2, 1);

        let snapshot = store.apply(vec![update("S1", "DR-R001", 35.0, 10.0)]);
        reconciler.sync(&mut backend, &snapshot, &SelectionState::default(), Utc::now());

        assert_eq!(reconciler.icon_status(&key), Some(IconStatus::Pending));
        assert!(reconciler.has_marker("S1"));

        reconciler.icon_ready(&key);
        assert_eq!(reconciler.icon_status(&key), Some(IconStatus::Ready));
    }

    #[test]
    fn test_selected_marker_is_opaque() {
        let mut store = TrackStore::new();
        let mut backend = RecordingBackend::new();
        let mut reconciler = RenderReconciler::default();
        let selection = SelectionState {
            selected_id: Some("S1".to_string()),
            is_following: true,
            last_selected_id: Some("S1".to_string()),
        };

        let snapshot = store.apply(vec![
            update("S1", "DR-B001", 35.0, 0.0),
            update("S2", "DR-B002", 35.1, 0.0),
        ]);
        reconciler.sync(&mut backend, &snapshot, &selection, Utc::now());

        let opacities: HashMap<String, f64> = backend
            .calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::AddPoint { properties, .. } => {
                    Some((properties.id.clone(), properties.opacity))
                }
                _ => None,
            })
            .collect();
        assert_eq!(opacities.get("S1"), Some(&1.0));
        assert_eq!(opacities.get("S2"), Some(&0.9));
    }

    #[test]
    fn test_hover_overlay_follows_track() {
        let mut store = TrackStore::new();
        let mut backend = RecordingBackend::new();
        let mut reconciler = RenderReconciler::default();
        let selection = SelectionState::default();
        let t0 = Utc::now();

        let (snapshot, _) = store.apply_at(vec![update("S1", "DR-B001", 35.0, 0.0)], t0);
        reconciler.sync(&mut backend, &snapshot, &selection, t0);
        reconciler.pointer_enter(&mut backend, &snapshot, "S1", t0 + chrono::Duration::seconds(125));
        assert_eq!(reconciler.hovered(), Some("S1"));

        let overlay = backend.calls.iter().rev().find_map(|call| match call {
            BackendCall::ShowOverlay(overlay) => Some(overlay.clone()),
            _ => None,
        });
        let overlay = overlay.expect("overlay shown");
        assert_eq!(overlay.elapsed, "2:05");
        assert_eq!(overlay.coordinates, "[35.000000, 32.000000]");
        assert_eq!(overlay.lines()[1], "Altitude: 120m");

        let (snapshot, _) = store.apply_at(vec![update("S1", "DR-B001", 35.5, 0.0)], t0);
        backend.take();
        reconciler.sync(&mut backend, &snapshot, &selection, t0);
        assert!(backend.calls.iter().any(|call| matches!(
            call,
            BackendCall::ShowOverlay(overlay) if overlay.anchor == LngLat::new(35.5, 32.0)
        )));

        reconciler.pointer_leave(&mut backend);
        assert_eq!(reconciler.hovered(), None);
        assert_eq!(backend.calls.last(), Some(&BackendCall::RemoveOverlay));
    }

    #[test]
    fn test_enter_on_unknown_marker_is_ignored() {
        let mut backend = RecordingBackend::new();
        let mut reconciler = RenderReconciler::default();
        reconciler.pointer_enter(&mut backend, &TrackStoreSnapshot::default(), "GHOST", Utc::now());

        assert_eq!(reconciler.hovered(), None);
        assert!(backend.calls.is_empty());
    }
}
