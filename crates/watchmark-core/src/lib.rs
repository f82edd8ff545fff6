pub mod config;
pub mod video_id;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use config::{MarkerConfig, MouseButton};
pub use video_id::extract_video_id;

/// Milliseconds in one day, the unit of the age-based eviction policy.
pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// One watched video: canonical id plus the moment it was first seen.
///
/// The wire shape is `{"id": "...", "timestamp": <integer ms>}`, compatible
/// with history blobs written by earlier versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedRecord {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl WatchedRecord {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            timestamp,
        }
    }

    /// Whole milliseconds elapsed since this record was created.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.timestamp).num_milliseconds()
    }
}
