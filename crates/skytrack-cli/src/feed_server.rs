//! Simulated feed server: one broadcast of FeatureCollection text per tick.

use crate::sim::Scenario;
use anyhow::{bail, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

const BROADCAST_CAPACITY: usize = 64;

/// Shortest broadcast tick.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Tick period for a rate in messages per second.
pub fn feed_period(rate: f64) -> Result<Duration> {
    if !rate.is_finite() || rate <= 0.0 {
        bail!("rate must be a positive number, got {}", rate);
    }
    let period = Duration::try_from_secs_f64(1.0 / rate)?;
    if period < MIN_PERIOD {
        bail!("rate {} is above the limit of one message per {:?}", rate, MIN_PERIOD);
    }
    Ok(period)
}

pub struct FeedState {
    pub tx: broadcast::Sender<Arc<str>>,
}

impl FeedState {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn feed_router(state: Arc<FeedState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/stream", get(ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<FeedState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<FeedState>) {
    let mut rx = state.tx.subscribe();
    tracing::info!(subscribers = state.tx.receiver_count(), "viewer connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
            message = rx.recv() => {
                match message {
                    Ok(text) => {
                        if socket.send(Message::Text(text.as_ref().to_owned())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "slow viewer, skipping to newest message");
                        continue;
                    }
                    Err(_) => break,
                }
            }
        }
    }

    tracing::info!("viewer disconnected");
}

/// Sample the scenario every `period` (at least [`MIN_PERIOD`]) and
/// broadcast the result.
pub async fn run_broadcaster(state: Arc<FeedState>, scenario: Scenario, period: Duration) {
    if period < MIN_PERIOD {
        tracing::warn!(?period, "feed period too short, clamping to {:?}", MIN_PERIOD);
    }
    let period = period.max(MIN_PERIOD);
    let start = tokio::time::Instant::now();
    let mut interval = tokio::time::interval(period);
    let mut ticks: u64 = 0;

    loop {
        interval.tick().await;
        let t = start.elapsed().as_secs_f64();
        let message = match serde_json::to_string(&scenario.message_at(t)) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, "failed to encode feed message");
                continue;
            }
        };

        ticks += 1;
        // No receivers is normal between viewers.
        let delivered = state.tx.send(Arc::from(message)).unwrap_or(0);
        if ticks % 30 == 0 {
            tracing::debug!(ticks, delivered, drones = scenario.drones.len(), "feed tick");
        }
    }
}
