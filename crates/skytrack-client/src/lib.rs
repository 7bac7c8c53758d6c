//! SkyTrack client - feed transport and the headless map viewer.
//!
//! Connects to a telemetry feed over WebSocket, reconnecting with capped
//! backoff, and drives a [`skytrack_core::MapSession`] from its messages.

pub mod backoff;
pub mod config;
pub mod feed;
pub mod log_backend;
pub mod viewer;

pub use backoff::Backoff;
pub use config::Config;
pub use feed::{run_feed, FeedEvent, FeedStream};
pub use log_backend::LogBackend;
pub use viewer::{run_viewer, Viewer, ViewerCommand};
