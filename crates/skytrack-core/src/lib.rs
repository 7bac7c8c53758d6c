//! SkyTrack core - live track model and map render synchronization
//!
//! Merges streamed telemetry into bounded per-track records, tracks the
//! selected/followed vehicle and keeps a stateful map backend in step with
//! the latest snapshot.

pub mod ingress;
pub mod models;
pub mod panel;
pub mod render;
pub mod selection;
pub mod session;
pub mod settings;
pub mod store;

pub use ingress::{decode_message, decode_value, DecodedBatch, Feature, FeatureCollection, IngressError};
pub use models::{
    format_elapsed, Classification, LngLat, PartialUpdate, TrackColor, TrackRecord,
    TRAJECTORY_CAPACITY,
};
pub use panel::{b_count_label, TrackListView, TrackRow};
pub use render::{
    IconKey, MapBackend, MapEvent, MarkerProperties, Overlay, PrimitiveKey, RenderReconciler,
    SyncReport,
};
pub use selection::{CameraMove, FollowState, SelectionController, SelectionState};
pub use session::{MapSession, MarkerInteraction};
pub use settings::ViewSettings;
pub use store::{ApplyStats, TrackStore, TrackStoreSnapshot};
