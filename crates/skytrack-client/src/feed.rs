//! WebSocket transport for the telemetry feed.
//!
//! The transport owns connection and reconnection. It forwards raw text
//! messages and connectivity changes; decoding happens in the session.

use crate::backoff::Backoff;
use anyhow::{Context, Result};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const RECONNECT_BASE: Duration = Duration::from_millis(500);
const RECONNECT_MAX: Duration = Duration::from_secs(30);

/// Something the transport observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Connected,
    Disconnected { reason: String },
    Message(String),
}

/// An open feed connection.
pub struct FeedStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl FeedStream {
    pub async fn connect(url: &str) -> Result<Self> {
        let (socket, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to feed at {}", url))?;
        Ok(Self { socket })
    }

    /// Next text payload (returns None on close).
    pub async fn next_message(&mut self) -> Result<Option<String>> {
        while let Some(msg) = self.socket.next().await {
            match msg.context("Feed socket error")? {
                Message::Text(text) => return Ok(Some(text)),
                Message::Binary(data) => match String::from_utf8(data) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => tracing::warn!("dropping non-UTF-8 binary feed frame"),
                },
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }
}

/// Keep a feed connection alive, forwarding everything to `tx`.
/// Returns once the receiver is gone.
pub async fn run_feed(url: String, tx: mpsc::Sender<FeedEvent>) {
    let mut backoff = Backoff::new(RECONNECT_BASE, RECONNECT_MAX);

    loop {
        let reason = match FeedStream::connect(&url).await {
            Ok(mut stream) => {
                backoff.reset();
                tracing::info!(url = %url, "feed connected");
                if tx.send(FeedEvent::Connected).await.is_err() {
                    return;
                }
                loop {
                    match stream.next_message().await {
                        Ok(Some(text)) => {
                            if tx.send(FeedEvent::Message(text)).await.is_err() {
                                return;
                            }
                        }
                        Ok(None) => break "closed by server".to_string(),
                        Err(err) => break format!("{:#}", err),
                    }
                }
            }
            Err(err) => format!("{:#}", err),
        };

        let delay = backoff.fail();
        tracing::warn!(
            attempt = backoff.attempts(),
            retry_in_ms = delay.as_millis() as u64,
            "feed unavailable: {}",
            reason
        );
        if tx.send(FeedEvent::Disconnected { reason }).await.is_err() {
            return;
        }
        tokio::time::sleep(delay).await;
    }
}
