//! Headless live map viewer.
//!
//! Reads commands from stdin, one per line:
//!   select <id> | deselect | close | drag | zoom | list | quit
//!   hover <target> | leave <target> | click <target>
//! where a target is a track id (its marker) or a layer id such as `path-S1`.

use anyhow::Result;
use clap::Parser;
use skytrack_client::{run_viewer, Config, ViewerCommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Follow a live telemetry feed on a headless map
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Feed URL (overrides SKYTRACK_FEED_URL)
    #[arg(long)]
    url: Option<String>,

    /// Operator label shown in the list (overrides SKYTRACK_OPERATOR)
    #[arg(long)]
    operator: Option<String>,

    /// Select this track on startup
    #[arg(long)]
    follow: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("skytrack_client=info".parse()?)
            .add_directive("skytrack_core=info".parse()?))
        .init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(url) = args.url {
        config.feed_url = url;
    }
    if let Some(operator) = args.operator {
        config.view.operator_label = operator;
    }

    let (tx, rx) = mpsc::channel(32);
    if let Some(id) = args.follow {
        tx.send(ViewerCommand::Select(id)).await?;
    }

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match line.parse::<ViewerCommand>() {
                    Ok(command) => {
                        if tx.send(command).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => eprintln!("{}", err),
                },
                Ok(None) => {
                    let _ = tx.send(ViewerCommand::Quit).await;
                    break;
                }
                Err(err) => {
                    tracing::error!(error = %err, "stdin read failed");
                    break;
                }
            }
        }
    });

    run_viewer(config, rx).await
}
