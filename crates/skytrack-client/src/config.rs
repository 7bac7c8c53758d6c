//! Viewer configuration from environment.

use skytrack_core::ViewSettings;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    pub view: ViewSettings,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = ViewSettings::default();
        Self {
            feed_url: env::var("SKYTRACK_FEED_URL")
                .unwrap_or_else(|_| "ws://localhost:9013/stream".to_string()),
            view: ViewSettings {
                fly_to_zoom: env_parse("SKYTRACK_FLY_TO_ZOOM").unwrap_or(defaults.fly_to_zoom),
                fly_to_ms: env_parse("SKYTRACK_FLY_TO_MS").unwrap_or(defaults.fly_to_ms),
                pan_ms: env_parse("SKYTRACK_PAN_MS").unwrap_or(defaults.pan_ms),
                icon_bucket_deg: env_parse("SKYTRACK_ICON_BUCKET_DEG")
                    .unwrap_or(defaults.icon_bucket_deg),
                operator_label: env::var("SKYTRACK_OPERATOR")
                    .unwrap_or_else(|_| defaults.operator_label.clone()),
                ..defaults
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
