//! Map session: the single owner of a backend and everything drawn on it.
//!
//! A session is created once per hosting view. Dropping it removes the
//! overlay, every marker subscription and the gesture subscription, then
//! releases the backend.

use crate::ingress::{decode_message, IngressError};
use crate::models::PartialUpdate;
use crate::panel::TrackListView;
use crate::render::{b_count, MapBackend, MapEvent, PrimitiveKind, RenderReconciler, SyncReport};
use crate::selection::{FollowState, SelectionController, SelectionState};
use crate::settings::ViewSettings;
use crate::store::{TrackStore, TrackStoreSnapshot};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Per-marker interaction capability, subscribed once when a marker is created.
pub trait MarkerInteraction {
    fn on_enter(&mut self, track_id: &str);
    fn on_leave(&mut self, track_id: &str);
    fn on_click(&mut self, track_id: &str);
}

pub struct MapSession<B: MapBackend> {
    backend: B,
    store: TrackStore,
    selection: SelectionController,
    reconciler: RenderReconciler,
    settings: ViewSettings,
}

impl<B: MapBackend> MapSession<B> {
    /// Take ownership of the backend, place the initial view and subscribe
    /// to user camera gestures.
    pub fn new(mut backend: B, settings: ViewSettings) -> Self {
        backend.jump_to(settings.initial_center, settings.initial_zoom);
        backend.subscribe_gestures();
        let store = TrackStore::with_capacity(settings.trajectory_capacity);
        tracing::info!(
            lng = settings.initial_center.lng,
            lat = settings.initial_center.lat,
            zoom = settings.initial_zoom,
            trajectory_capacity = store.capacity(),
            "map session started"
        );

        Self {
            backend,
            store,
            selection: SelectionController::new(
                settings.fly_to_zoom,
                Duration::from_millis(settings.fly_to_ms),
                Duration::from_millis(settings.pan_ms),
            ),
            reconciler: RenderReconciler::new(settings.icon_bucket_deg),
            settings,
        }
    }

    /// Decode a wire message and apply it as one batch.
    pub fn ingest(&mut self, raw: &str) -> Result<SyncReport, IngressError> {
        let batch = decode_message(raw)?;
        if batch.skipped > 0 {
            tracing::warn!(skipped = batch.skipped, "message had malformed features");
        }
        Ok(self.apply(batch.updates))
    }

    pub fn apply<I>(&mut self, updates: I) -> SyncReport
    where
        I: IntoIterator<Item = PartialUpdate>,
    {
        self.apply_at(updates, Utc::now())
    }

    pub fn apply_at<I>(&mut self, updates: I, now: DateTime<Utc>) -> SyncReport
    where
        I: IntoIterator<Item = PartialUpdate>,
    {
        let (snapshot, _) = self.store.apply_at(updates, now);
        self.render(&snapshot, now)
    }

    fn render(&mut self, snapshot: &TrackStoreSnapshot, now: DateTime<Utc>) -> SyncReport {
        let report = self
            .reconciler
            .sync(&mut self.backend, snapshot, self.selection.state(), now);
        if let Some(camera) = self.selection.camera_move(snapshot) {
            self.reconciler.apply_camera(&mut self.backend, camera);
        }
        report
    }

    /// Re-render the current snapshot after a selection change.
    fn refresh(&mut self) {
        let snapshot = self.store.snapshot();
        self.render(&snapshot, Utc::now());
    }

    pub fn snapshot(&self) -> TrackStoreSnapshot {
        self.store.snapshot()
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn follow_state(&self) -> FollowState {
        self.selection.follow_state()
    }

    pub fn select(&mut self, track_id: &str) {
        self.selection.select(track_id);
        self.refresh();
    }

    pub fn deselect(&mut self) {
        self.selection.deselect();
        self.refresh();
    }

    pub fn on_user_camera_move(&mut self) {
        self.selection.user_moved_camera();
    }

    /// Dispatch an event raised by the backend.
    pub fn handle_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::PointerEnter(key) if key.kind == PrimitiveKind::Marker => {
                self.on_enter(&key.track_id)
            }
            MapEvent::PointerLeave(key) if key.kind == PrimitiveKind::Marker => {
                self.on_leave(&key.track_id)
            }
            MapEvent::Click(key) if key.kind == PrimitiveKind::Marker => {
                self.on_click(&key.track_id)
            }
            MapEvent::DragStart | MapEvent::ZoomStart => self.on_user_camera_move(),
            MapEvent::IconReady(icon) => self.reconciler.icon_ready(&icon),
            other => tracing::trace!(?other, "ignoring event for non-marker primitive"),
        }
    }

    pub fn list_view(&self, now: DateTime<Utc>) -> TrackListView {
        TrackListView::build(
            &self.store.snapshot(),
            self.selection.state(),
            &self.settings.operator_label,
            now,
        )
    }

    pub fn b_count(&self) -> usize {
        b_count(&self.store.snapshot())
    }

    pub fn reconciler(&self) -> &RenderReconciler {
        &self.reconciler
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Host access, e.g. to drain events the backend queued.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: MapBackend> MarkerInteraction for MapSession<B> {
    fn on_enter(&mut self, track_id: &str) {
        let snapshot = self.store.snapshot();
        self.reconciler
            .pointer_enter(&mut self.backend, &snapshot, track_id, Utc::now());
    }

    fn on_leave(&mut self, _track_id: &str) {
        self.reconciler.pointer_leave(&mut self.backend);
    }

    fn on_click(&mut self, track_id: &str) {
        self.select(track_id);
    }
}

impl<B: MapBackend> Drop for MapSession<B> {
    fn drop(&mut self) {
        self.reconciler.release(&mut self.backend);
        self.backend.unsubscribe_gestures();
        self.backend.release();
        tracing::info!(tracks = self.store.snapshot().len(), "map session released");
    }
}
