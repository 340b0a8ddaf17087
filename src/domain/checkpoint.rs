//! Checkpoint record - "unit X reached status S at time T"

use crate::domain::status::CheckpointStatus;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a new random checkpoint ID (UUIDv4)
pub fn new_checkpoint_id() -> String {
    Uuid::new_v4().to_string()
}

/// Render a timestamp as ISO-8601 with millisecond precision, e.g. `2025-10-08T12:34:56.789Z`
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One status transition in a unit's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub status: CheckpointStatus,
    /// Human-readable wall-clock time of the update
    pub date: String,
}

/// Immutable checkpoint record
///
/// Fields are private; a checkpoint cannot be changed once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    id: String,
    unit_id: String,
    status: CheckpointStatus,
    timestamp: String,
    /// Always empty, reserved for future use
    history: Vec<HistoryEntry>,
}

impl Checkpoint {
    /// Create a checkpoint with a freshly generated ID.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use tracking_api::domain::checkpoint::Checkpoint;
    /// use tracking_api::domain::status::CheckpointStatus;
    ///
    /// let at = Utc.with_ymd_and_hms(2025, 10, 8, 12, 34, 56).unwrap();
    /// let checkpoint = Checkpoint::new("unit-1", CheckpointStatus::Created, at);
    /// assert_eq!(checkpoint.timestamp(), "2025-10-08T12:34:56.000Z");
    /// assert!(checkpoint.history().is_empty());
    /// ```
    pub fn new(unit_id: &str, status: CheckpointStatus, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: new_checkpoint_id(),
            unit_id: unit_id.to_string(),
            status,
            timestamp: format_timestamp(timestamp),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn status(&self) -> CheckpointStatus {
        self.status
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }
}
