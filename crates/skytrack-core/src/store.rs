//! Copy-on-write track store.
//!
//! Every batch builds a new map and swaps it in whole, so a snapshot handed
//! out earlier never changes and readers never see a half-applied batch.

use crate::models::{Classification, PartialUpdate, TrackRecord, TRAJECTORY_CAPACITY};
use chrono::{DateTime, Utc};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable point-in-time view of every track record.
#[derive(Debug, Clone, Default)]
pub struct TrackStoreSnapshot {
    tracks: Arc<BTreeMap<String, Arc<TrackRecord>>>,
    generation: u64,
}

impl TrackStoreSnapshot {
    pub fn get(&self, id: &str) -> Option<&TrackRecord> {
        self.tracks.get(id).map(|record| record.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tracks.contains_key(id)
    }

    /// Records ordered by track id.
    pub fn iter(&self) -> impl Iterator<Item = &TrackRecord> {
        self.tracks.values().map(|record| record.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Number of batches applied before this snapshot was taken.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn count_classified(&self, classification: Classification) -> usize {
        self.iter()
            .filter(|record| record.classification == classification)
            .count()
    }

    /// True when both handles point at the same underlying map.
    pub fn same_as(&self, other: &TrackStoreSnapshot) -> bool {
        Arc::ptr_eq(&self.tracks, &other.tracks)
    }
}

/// Result of applying one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub created: usize,
    pub updated: usize,
}

/// Authoritative mapping from track id to record.
pub struct TrackStore {
    current: TrackStoreSnapshot,
    capacity: usize,
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackStore {
    pub fn new() -> Self {
        Self::with_capacity(TRAJECTORY_CAPACITY)
    }

    /// Create a store keeping at most `capacity` trajectory points per track.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            current: TrackStoreSnapshot::default(),
            capacity: capacity.max(1),
        }
    }

    pub fn snapshot(&self) -> TrackStoreSnapshot {
        self.current.clone()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Apply a batch using the wall clock for new records.
    pub fn apply<I>(&mut self, updates: I) -> TrackStoreSnapshot
    where
        I: IntoIterator<Item = PartialUpdate>,
    {
        self.apply_at(updates, Utc::now()).0
    }

    /// Apply a batch in input order with an explicit clock reading.
    pub fn apply_at<I>(&mut self, updates: I, now: DateTime<Utc>) -> (TrackStoreSnapshot, ApplyStats)
    where
        I: IntoIterator<Item = PartialUpdate>,
    {
        // Records are shared with older snapshots; make_mut clones only the
        // ones this batch touches.
        let mut tracks: BTreeMap<String, Arc<TrackRecord>> = self.current.tracks.as_ref().clone();
        let mut stats = ApplyStats::default();

        for update in updates {
            let record = match tracks.entry(update.track_id.clone()) {
                Entry::Occupied(entry) => {
                    stats.updated += 1;
                    entry.into_mut()
                }
                Entry::Vacant(entry) => {
                    stats.created += 1;
                    tracing::debug!(track_id = %update.track_id, "new track observed");
                    entry.insert(Arc::new(TrackRecord::new(&update, now)))
                }
            };
            Arc::make_mut(record).apply(&update, self.capacity, now);
        }

        self.current = TrackStoreSnapshot {
            tracks: Arc::new(tracks),
            generation: self.current.generation + 1,
        };

        tracing::debug!(
            created = stats.created,
            updated = stats.updated,
            total = self.current.len(),
            "applied track batch"
        );

        (self.current.clone(), stats)
    }
}
