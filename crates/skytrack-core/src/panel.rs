//! Read model for the track list panel and the B-count badge.

use crate::models::{format_elapsed, TrackColor, TrackRecord};
use crate::selection::SelectionState;
use crate::store::TrackStoreSnapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRow {
    pub id: String,
    pub registration: String,
    pub color: TrackColor,
    pub elapsed: String,
    pub operator: String,
    pub altitude: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackListView {
    pub active_count: usize,
    pub rows: Vec<TrackRow>,
}

impl TrackListView {
    /// Rows in order of first observation, ties broken by id.
    pub fn build(
        snapshot: &TrackStoreSnapshot,
        selection: &SelectionState,
        operator: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let mut records: Vec<&TrackRecord> = snapshot.iter().collect();
        records.sort_by(|a, b| {
            a.first_observed_at
                .cmp(&b.first_observed_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let rows = records
            .into_iter()
            .map(|record| TrackRow {
                id: record.id.clone(),
                registration: record.registration.clone(),
                color: record.color(),
                elapsed: format_elapsed(record.elapsed_secs(now)),
                operator: operator.to_string(),
                altitude: format!("{} m", record.altitude),
                selected: selection.is_selected(&record.id),
            })
            .collect();

        Self {
            active_count: snapshot.len(),
            rows,
        }
    }

    pub fn active_label(&self) -> String {
        format!("{} Active", self.active_count)
    }
}

/// Badge text for the number of B-classified tracks.
pub fn b_count_label(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("{} red drone{}", count, plural)
}
