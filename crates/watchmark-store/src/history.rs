use chrono::{DateTime, Utc};
use watchmark_core::{WatchedRecord, MS_PER_DAY};

/// Result of a manual toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

/// Ordered watched-video history, oldest record first.
///
/// Records are appended at the end and evicted from the front, which keeps
/// the sequence sorted non-decreasing by timestamp. `prune` relies on that
/// ordering to stop at the first unexpired record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchedHistory {
    records: Vec<WatchedRecord>,
}

impl WatchedHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<WatchedRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[WatchedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the first record with this id. Callers removing a record
    /// need the position, not just membership.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|record| record.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Append a record for `id` unless one already exists. Returns whether
    /// a record was appended; re-visiting a watched video is a no-op.
    pub fn record_visit(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        if self.contains(id) {
            return false;
        }
        self.records.push(WatchedRecord::new(id, now));
        true
    }

    /// Flip membership for `id`: remove the existing record, or append a
    /// fresh one stamped `now`. The only removal path outside aging, and it
    /// carries no age check of its own.
    pub fn toggle(&mut self, id: &str, now: DateTime<Utc>) -> Toggled {
        match self.position(id) {
            Some(index) => {
                self.records.remove(index);
                Toggled::Removed
            }
            None => {
                self.records.push(WatchedRecord::new(id, now));
                Toggled::Added
            }
        }
    }

    /// Evict expired records from the front, stopping at the first record
    /// still within `max_age_days`. Zero disables eviction. Returns the
    /// number of records removed.
    pub fn prune(&mut self, now: DateTime<Utc>, max_age_days: u32) -> usize {
        if max_age_days == 0 {
            return 0;
        }
        let cutoff_ms = i64::from(max_age_days) * MS_PER_DAY;
        let mut evicted = 0;
        while let Some(front) = self.records.first() {
            if front.age_ms(now) > cutoff_ms {
                self.records.remove(0);
                evicted += 1;
            } else {
                break;
            }
        }
        evicted
    }
}
