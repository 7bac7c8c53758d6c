//! Selection and camera-follow state machine.
//!
//! The controller never touches the map itself. It answers "which camera move,
//! if any" for each new snapshot and the reconciler executes the answer.

use crate::models::LngLat;
use crate::store::TrackStoreSnapshot;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Follow state of the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowState {
    Idle,
    SelectedNotFollowing,
    SelectedFollowing,
}

/// Selection as seen by renderers and list views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    /// Weak reference, validate against the snapshot before use
    pub selected_id: Option<String>,
    pub is_following: bool,
    pub last_selected_id: Option<String>,
}

impl SelectionState {
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_id.as_deref() == Some(id)
    }
}

/// Camera motion requested by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraMove {
    /// One-shot animation on a new selection
    FlyTo {
        center: LngLat,
        zoom: f64,
        duration: Duration,
    },
    /// Short re-centering pan while following, zoom unchanged
    PanTo { center: LngLat, duration: Duration },
}

/// Selection & follow controller.
#[derive(Debug, Clone)]
pub struct SelectionController {
    state: SelectionState,
    /// Fly-to owed to the current selection, deferred until the track exists
    pending_fly_to: bool,
    fly_to_zoom: f64,
    fly_to_duration: Duration,
    pan_duration: Duration,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new(15.0, Duration::from_millis(1000), Duration::from_millis(100))
    }
}

impl SelectionController {
    pub fn new(fly_to_zoom: f64, fly_to_duration: Duration, pan_duration: Duration) -> Self {
        Self {
            state: SelectionState::default(),
            pending_fly_to: false,
            fly_to_zoom,
            fly_to_duration,
            pan_duration,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn follow_state(&self) -> FollowState {
        match (&self.state.selected_id, self.state.is_following) {
            (None, _) => FollowState::Idle,
            (Some(_), true) => FollowState::SelectedFollowing,
            (Some(_), false) => FollowState::SelectedNotFollowing,
        }
    }

    /// Select a track. A different id restarts following and owes a fly-to;
    /// the same id again is a refresh and changes nothing.
    pub fn select(&mut self, id: impl Into<String>) {
        let id = id.into();
        if self.state.last_selected_id.as_deref() == Some(id.as_str()) {
            return;
        }

        tracing::debug!(track_id = %id, "track selected");
        self.state.selected_id = Some(id.clone());
        self.state.last_selected_id = Some(id);
        self.state.is_following = true;
        self.pending_fly_to = true;
    }

    /// Clear the selection from any state.
    pub fn deselect(&mut self) {
        if self.state.selected_id.is_some() {
            tracing::debug!("selection cleared");
        }
        self.state = SelectionState::default();
        self.pending_fly_to = false;
    }

    /// User started a drag or zoom: stop following, keep the selection.
    pub fn user_moved_camera(&mut self) {
        if self.state.is_following {
            tracing::debug!("follow cancelled by user camera move");
        }
        self.state.is_following = false;
        self.pending_fly_to = false;
    }

    /// Camera move owed for this snapshot, if any.
    pub fn camera_move(&mut self, snapshot: &TrackStoreSnapshot) -> Option<CameraMove> {
        if !self.state.is_following {
            return None;
        }
        let id = self.state.selected_id.as_deref()?;
        let center = snapshot.get(id)?.position;

        if self.pending_fly_to {
            self.pending_fly_to = false;
            return Some(CameraMove::FlyTo {
                center,
                zoom: self.fly_to_zoom,
                duration: self.fly_to_duration,
            });
        }

        Some(CameraMove::PanTo {
            center,
            duration: self.pan_duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PartialUpdate;
    use crate::store::TrackStore;

    fn snapshot_with(ids: &[&str]) -> TrackStoreSnapshot {
        let mut store = TrackStore::new();
        store.apply(ids.iter().enumerate().map(|(i, id)| PartialUpdate {
            track_id: id.to_string(),
            registration: "DR-B001".to_string(),
            position: LngLat::new(35.0 + i as f64, 32.0),
            altitude: 100.0,
            heading: 0.0,
        }))
    }

    fn is_fly_to(mv: Option<CameraMove>) -> bool {
        matches!(mv, Some(CameraMove::FlyTo { .. }))
    }

    fn is_pan_to(mv: Option<CameraMove>) -> bool {
        matches!(mv, Some(CameraMove::PanTo { .. }))
    }

    #[test]
    fn test_idle_never_moves_camera() {
        let mut controller = SelectionController::default();
        let snapshot = snapshot_with(&["X"]);
        assert_eq!(controller.follow_state(), FollowState::Idle);
        assert_eq!(controller.camera_move(&snapshot), None);
    }

    #[test]
    fn test_reselect_same_id_only_pans() {
        let mut controller = SelectionController::default();
        let snapshot = snapshot_with(&["X"]);

        controller.select("X");
        assert!(is_fly_to(controller.camera_move(&snapshot)));

        controller.select("X");
        assert!(is_pan_to(controller.camera_move(&snapshot)));
        assert!(is_pan_to(controller.camera_move(&snapshot)));
    }

    #[test]
    fn test_new_selection_flies_once() {
        let mut controller = SelectionController::default();
        let snapshot = snapshot_with(&["X", "Y"]);

        controller.select("X");
        assert!(is_fly_to(controller.camera_move(&snapshot)));

        controller.select("Y");
        match controller.camera_move(&snapshot) {
            Some(CameraMove::FlyTo { center, zoom, duration }) => {
                assert_eq!(center, LngLat::new(36.0, 32.0));
                assert_eq!(zoom, 15.0);
                assert_eq!(duration, Duration::from_millis(1000));
            }
            other => panic!("expected fly-to, got {:?}", other),
        }
        assert!(is_pan_to(controller.camera_move(&snapshot)));
    }

    #[test]
    fn test_user_move_stops_following_but_keeps_selection() {
        let mut controller = SelectionController::default();
        let snapshot = snapshot_with(&["X"]);

        controller.select("X");
        controller.camera_move(&snapshot);
        controller.user_moved_camera();

        assert_eq!(controller.follow_state(), FollowState::SelectedNotFollowing);
        assert!(!controller.state().is_following);
        assert_eq!(controller.state().selected_id.as_deref(), Some("X"));
        assert_eq!(controller.camera_move(&snapshot), None);

        // Re-selecting the same track does not resume following.
        controller.select("X");
        assert_eq!(controller.camera_move(&snapshot), None);
    }

    #[test]
    fn test_unknown_selection_defers_fly_to() {
        let mut controller = SelectionController::default();
        controller.select("LATE");

        assert_eq!(controller.follow_state(), FollowState::SelectedFollowing);
        assert_eq!(controller.camera_move(&snapshot_with(&["X"])), None);
        assert!(is_fly_to(controller.camera_move(&snapshot_with(&["X", "LATE"]))));
    }

    #[test]
    fn test_deselect_returns_to_idle() {
        let mut controller = SelectionController::default();
        let snapshot = snapshot_with(&["X"]);
        controller.select("X");
        controller.deselect();

        assert_eq!(controller.follow_state(), FollowState::Idle);
        assert_eq!(controller.state(), &SelectionState::default());
        assert_eq!(controller.camera_move(&snapshot), None);

        // After a close, the same id counts as a new selection.
        controller.select("X");
        assert!(is_fly_to(controller.camera_move(&snapshot)));
    }
}
