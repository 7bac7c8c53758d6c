//! Render synchronization: backend contract, icon cache and reconciler.

pub mod backend;
pub mod icons;
pub mod reconciler;
pub mod recording;

pub use backend::{LineStyle, MapBackend, MapEvent, MarkerProperties, Overlay, PrimitiveKey, PrimitiveKind};
pub use icons::{quantize_orientation, IconCache, IconImage, IconKey, IconStatus};
pub use reconciler::{b_count, RenderReconciler, SyncReport};
pub use recording::{BackendCall, RecordingBackend};
