//! SkyTrack CLI - feed simulator and headless viewer.
//!
//! Binaries:
//! - skytrack-feed: serves simulated telemetry over WebSocket
//! - skytrack-view: headless map viewer driven by stdin commands

pub mod feed_server;
pub mod sim;

pub use feed_server::{feed_period, feed_router, run_broadcaster, FeedState, MIN_PERIOD};
