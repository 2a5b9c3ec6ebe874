//! Bounded record of recent contour runs, newest first.
//!
//! Owned by the boundary [`ContourEngine`](crate::ContourEngine); the
//! pipeline itself never sees it.

use std::collections::VecDeque;

use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::scene::Scene;

/// Runs kept before the oldest is dropped.
pub const HISTORY_CAPACITY: usize = 10;

/// Where the survey points of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointSource {
    /// `X,Y,Z` lines typed or pasted by the user.
    Manual,
    /// A flat numeric array handed over by the host.
    Array,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: u64,
    /// UTC, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub interval: f64,
    pub source: PointSource,
    pub point_count: usize,
    pub layer_count: usize,
    pub polyline_count: usize,
}

#[derive(Debug, Clone)]
pub struct ContourHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    next_id: u64,
}

impl Default for ContourHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl ContourHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// History holding at most `capacity` runs (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            next_id: 1,
        }
    }

    /// Records a finished run stamped with the current UTC time. Returns the
    /// entry that fell off the end, if any.
    pub fn record(
        &mut self,
        scene: &Scene,
        interval: f64,
        source: PointSource,
    ) -> Option<HistoryEntry> {
        self.record_at(OffsetDateTime::now_utc(), scene, interval, source)
    }

    pub fn record_at(
        &mut self,
        at: OffsetDateTime,
        scene: &Scene,
        interval: f64,
        source: PointSource,
    ) -> Option<HistoryEntry> {
        let entry = HistoryEntry {
            id: self.next_id,
            timestamp: format_timestamp(at),
            interval,
            source,
            point_count: scene.points().len(),
            layer_count: scene.layer_count(),
            polyline_count: scene.polyline_count(),
        };
        self.next_id += 1;
        self.entries.push_front(entry);

        let evicted = if self.entries.len() > self.capacity {
            self.entries.pop_back()
        } else {
            None
        };
        if let Some(old) = &evicted {
            log::debug!("history full, dropped run #{}", old.id);
        }
        evicted
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot for serialisation, newest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

fn format_timestamp(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    at.format(format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}
