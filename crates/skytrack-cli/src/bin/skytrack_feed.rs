//! Simulated telemetry feed.
//!
//! Usage:
//!   cargo run -p skytrack-cli --bin skytrack-feed -- --count 12 --rate 2

use anyhow::{Context, Result};
use clap::Parser;
use skytrack_cli::sim::create_swarm_scenario;
use skytrack_cli::{feed_period, feed_router, run_broadcaster, FeedState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serve simulated drone telemetry over WebSocket
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 9013)]
    port: u16,

    /// Number of simulated drones
    #[arg(long, default_value_t = 8)]
    count: usize,

    /// Messages per second
    #[arg(long, default_value_t = 1.0)]
    rate: f64,

    /// Center latitude
    #[arg(long, default_value_t = 32.55)]
    lat: f64,

    /// Center longitude
    #[arg(long, default_value_t = 35.85)]
    lon: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("skytrack_cli=info".parse()?))
        .init();

    let args = Args::parse();
    let period = feed_period(args.rate).context("invalid --rate")?;

    let scenario = create_swarm_scenario(args.lat, args.lon, args.count, &mut rand::rng());
    tracing::info!(
        scenario = %scenario.name,
        drones = scenario.drones.len(),
        rate = args.rate,
        "starting feed"
    );

    let state = Arc::new(FeedState::new());
    tokio::spawn(run_broadcaster(state.clone(), scenario, period));

    let app = feed_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
