//! Headless viewer: one map session driven by the feed and operator commands.

use crate::config::Config;
use crate::feed::{run_feed, FeedEvent};
use crate::log_backend::LogBackend;
use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use skytrack_core::{b_count_label, MapEvent, MapSession, PrimitiveKey, TrackListView};
use std::str::FromStr;
use tokio::sync::mpsc;

const FEED_CHANNEL_SIZE: usize = 256;

/// Operator input, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerCommand {
    Select(String),
    Deselect,
    /// Simulated pan gesture.
    Drag,
    /// Simulated zoom gesture.
    Zoom,
    /// Pointer events target a layer id (`marker-S1`, `path-S1`) or a bare
    /// track id, which means its marker.
    Hover(PrimitiveKey),
    Leave(PrimitiveKey),
    Click(PrimitiveKey),
    List,
    Quit,
}

impl FromStr for ViewerCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts
            .next()
            .ok_or_else(|| anyhow!("empty command"))?
            .to_ascii_lowercase();
        let arg = parts.next();
        if parts.next().is_some() {
            bail!("too many arguments: {}", line.trim());
        }

        let id = |name: &str| -> Result<String> {
            arg.map(str::to_string)
                .ok_or_else(|| anyhow!("'{}' needs a track id", name))
        };
        let target = |name: &str| -> Result<PrimitiveKey> {
            let raw = id(name)?;
            Ok(PrimitiveKey::parse(&raw).unwrap_or_else(|| PrimitiveKey::marker(raw)))
        };

        let command = match verb.as_str() {
            "select" => ViewerCommand::Select(id("select")?),
            "deselect" | "close" => ViewerCommand::Deselect,
            "drag" => ViewerCommand::Drag,
            "zoom" => ViewerCommand::Zoom,
            "hover" => ViewerCommand::Hover(target("hover")?),
            "leave" => ViewerCommand::Leave(target("leave")?),
            "click" => ViewerCommand::Click(target("click")?),
            "list" => ViewerCommand::List,
            "quit" | "exit" => ViewerCommand::Quit,
            other => bail!("unknown command: {}", other),
        };
        Ok(command)
    }
}

/// Session plus the glue that feeds backend events back into it.
pub struct Viewer {
    session: MapSession<LogBackend>,
}

impl Viewer {
    pub fn new(config: &Config) -> Self {
        Self {
            session: MapSession::new(LogBackend::new(), config.view.clone()),
        }
    }

    pub fn session(&self) -> &MapSession<LogBackend> {
        &self.session
    }

    pub fn handle_feed(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Connected => tracing::info!("feed online"),
            FeedEvent::Disconnected { reason } => {
                tracing::warn!(reason = %reason, "feed offline, keeping last known tracks")
            }
            FeedEvent::Message(text) => match self.session.ingest(&text) {
                Ok(report) => tracing::debug!(
                    paths_created = report.paths_created,
                    markers_created = report.markers_created,
                    icons = report.icons_registered,
                    b_count = report.b_count,
                    "batch rendered"
                ),
                Err(err) => tracing::warn!(error = %err, "dropping feed message"),
            },
        }
        self.pump();
    }

    /// Apply a command. Returns false once the viewer should stop.
    pub fn handle_command(&mut self, command: ViewerCommand) -> bool {
        match command {
            ViewerCommand::Select(id) => self.session.select(&id),
            ViewerCommand::Deselect => self.session.deselect(),
            ViewerCommand::Drag => self.session.handle_event(MapEvent::DragStart),
            ViewerCommand::Zoom => self.session.handle_event(MapEvent::ZoomStart),
            ViewerCommand::Hover(key) => self.session.handle_event(MapEvent::PointerEnter(key)),
            ViewerCommand::Leave(key) => self.session.handle_event(MapEvent::PointerLeave(key)),
            ViewerCommand::Click(key) => self.session.handle_event(MapEvent::Click(key)),
            ViewerCommand::List => {
                for line in self.list_lines(Utc::now()) {
                    println!("{}", line);
                }
            }
            ViewerCommand::Quit => return false,
        }
        self.pump();
        true
    }

    /// Text rendering of the track list panel.
    pub fn list_lines(&self, now: DateTime<Utc>) -> Vec<String> {
        let view: TrackListView = self.session.list_view(now);
        let mut lines = vec![format!(
            "{} | {}",
            view.active_label(),
            b_count_label(self.session.b_count())
        )];
        lines.extend(view.rows.iter().map(|row| {
            format!(
                "{} {:<10} {:<10} {:>6} {:>10} {}",
                if row.selected { '*' } else { ' ' },
                row.id,
                row.registration,
                row.elapsed,
                row.altitude,
                row.operator
            )
        }));
        lines
    }

    /// Feed queued backend events back until the backend goes quiet.
    fn pump(&mut self) {
        loop {
            let events = self.session.backend_mut().drain_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.session.handle_event(event);
            }
        }
    }
}

/// Run until `quit` or until the command channel closes.
pub async fn run_viewer(config: Config, mut commands: mpsc::Receiver<ViewerCommand>) -> Result<()> {
    let (feed_tx, mut feed_rx) = mpsc::channel(FEED_CHANNEL_SIZE);
    let feed = tokio::spawn(run_feed(config.feed_url.clone(), feed_tx));
    let mut viewer = Viewer::new(&config);

    tracing::info!(url = %config.feed_url, "viewer started");

    loop {
        tokio::select! {
            event = feed_rx.recv() => match event {
                Some(event) => viewer.handle_feed(event),
                None => {
                    tracing::error!("feed task stopped");
                    break;
                }
            },
            command = commands.recv() => match command {
                Some(command) => {
                    if !viewer.handle_command(command) {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    feed.abort();
    drop(viewer);
    tracing::info!("viewer stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skytrack_core::render::IconStatus;
    use skytrack_core::{Feature, FeatureCollection, FollowState, IconKey, LngLat, TrackColor};

    fn config() -> Config {
        Config {
            feed_url: "ws://127.0.0.1:1/stream".to_string(),
            view: Default::default(),
        }
    }

    fn message(serial: &str, registration: &str, lng: f64) -> String {
        let collection = FeatureCollection::new(vec![Feature::point(
            serial,
            registration,
            LngLat::new(lng, 32.0),
            90.0,
            30.0,
        )]);
        serde_json::to_string(&collection).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("select S1".parse::<ViewerCommand>().unwrap(), ViewerCommand::Select("S1".into()));
        assert_eq!("  DRAG ".parse::<ViewerCommand>().unwrap(), ViewerCommand::Drag);
        assert_eq!("exit".parse::<ViewerCommand>().unwrap(), ViewerCommand::Quit);
        assert!("select".parse::<ViewerCommand>().is_err());
        assert!("hover a b".parse::<ViewerCommand>().is_err());
        assert!("teleport".parse::<ViewerCommand>().is_err());
        assert!("".parse::<ViewerCommand>().is_err());
    }

    #[test]
    fn test_pointer_targets_accept_layer_ids() {
        assert_eq!(
            "click S1".parse::<ViewerCommand>().unwrap(),
            ViewerCommand::Click(PrimitiveKey::marker("S1"))
        );
        assert_eq!(
            "hover path-S1".parse::<ViewerCommand>().unwrap(),
            ViewerCommand::Hover(PrimitiveKey::path("S1"))
        );
        assert_eq!(
            "leave marker-S1".parse::<ViewerCommand>().unwrap(),
            ViewerCommand::Leave(PrimitiveKey::marker("S1"))
        );
        assert_eq!("close".parse::<ViewerCommand>().unwrap(), ViewerCommand::Deselect);
    }

    #[test]
    fn test_path_clicks_do_not_select() {
        let mut viewer = Viewer::new(&config());
        viewer.handle_feed(FeedEvent::Message(message("S1", "DR-R001", 35.0)));

        let command = "click path-S1".parse::<ViewerCommand>().unwrap();
        assert!(viewer.handle_command(command));
        assert_eq!(viewer.session().follow_state(), FollowState::Idle);

        let command = "click S1".parse::<ViewerCommand>().unwrap();
        assert!(viewer.handle_command(command));
        assert_eq!(viewer.session().follow_state(), FollowState::SelectedFollowing);
        assert!(viewer.handle_command("close".parse().unwrap()));
        assert_eq!(viewer.session().follow_state(), FollowState::Idle);
    }

    #[test]
    fn test_icons_become_ready_after_pump() {
        let mut viewer = Viewer::new(&config());
        viewer.handle_feed(FeedEvent::Message(message("S1", "DR-B001", 35.0)));

        let key = IconKey::new(30.0, TrackColor::Accent1, 1);
        assert_eq!(viewer.session().reconciler().icon_status(&key), Some(IconStatus::Ready));
        assert_eq!(viewer.session().backend().point_count(), 1);
        assert_eq!(viewer.session().backend().subscription_count(), 1);
    }

    #[test]
    fn test_commands_drive_selection() {
        let mut viewer = Viewer::new(&config());
        viewer.handle_feed(FeedEvent::Message(message("S1", "DR-R001", 35.0)));

        assert!(viewer.handle_command(ViewerCommand::Click(PrimitiveKey::marker("S1"))));
        assert_eq!(viewer.session().follow_state(), FollowState::SelectedFollowing);
        assert!(viewer.handle_command(ViewerCommand::Zoom));
        assert_eq!(viewer.session().follow_state(), FollowState::SelectedNotFollowing);
        assert!(viewer.handle_command(ViewerCommand::Deselect));
        assert_eq!(viewer.session().follow_state(), FollowState::Idle);
        assert!(!viewer.handle_command(ViewerCommand::Quit));
    }

    #[test]
    fn test_garbage_and_disconnects_keep_tracks() {
        let mut viewer = Viewer::new(&config());
        viewer.handle_feed(FeedEvent::Message(message("S1", "DR-R001", 35.0)));
        viewer.handle_feed(FeedEvent::Message("not json".to_string()));
        viewer.handle_feed(FeedEvent::Disconnected {
            reason: "closed by server".to_string(),
        });

        assert_eq!(viewer.session().snapshot().len(), 1);
        let lines = viewer.list_lines(Utc::now());
        assert_eq!(lines[0], "1 Active | 1 red drone");
        assert!(lines[1].contains("DR-R001"));
        assert!(lines[1].contains("Sager Drone"));
    }
}
