//! Unit projection - current status plus the history of status updates

use crate::domain::checkpoint::HistoryEntry;
use crate::domain::status::CheckpointStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Human-readable rendering used for history entries,
/// e.g. `Wed Oct 08 2025 12:34:56 GMT+0000 (Coordinated Universal Time)`
pub fn format_history_date(at: DateTime<Utc>) -> String {
    at.format("%a %b %d %Y %H:%M:%S GMT%z (Coordinated Universal Time)").to_string()
}

/// Tracked logical unit (e.g. a parcel)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub status: CheckpointStatus,
    /// One entry per status update; the creating status is not recorded here
    pub checkpoints: Vec<HistoryEntry>,
}

impl Unit {
    pub fn new(id: &str, status: CheckpointStatus) -> Self {
        Self { id: id.to_string(), status, checkpoints: Vec::new() }
    }

    /// Set the current status and append a history entry stamped with the wall clock
    pub fn update_status(&mut self, status: CheckpointStatus) {
        self.update_status_at(status, Utc::now());
    }

    /// Same as [`Unit::update_status`] with an explicit clock
    pub fn update_status_at(&mut self, status: CheckpointStatus, at: DateTime<Utc>) {
        self.status = status;
        self.checkpoints.push(HistoryEntry { status, date: format_history_date(at) });
    }
}
