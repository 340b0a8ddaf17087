//! Checkpoint status - the closed set of lifecycle states a unit can report

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state reported by a checkpoint
///
/// No transition graph is enforced: any status may follow any other.
/// Repeating the current status is rejected by the record operation, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckpointStatus {
    Created,
    PickedUp,
    InTransit,
    AtFacility,
    OutForDelivery,
    Delivered,
    Exception,
}

/// Every valid status literal, in declaration order
pub const VALID_STATUSES: [&str; 7] = [
    "CREATED",
    "PICKED_UP",
    "IN_TRANSIT",
    "AT_FACILITY",
    "OUT_FOR_DELIVERY",
    "DELIVERED",
    "EXCEPTION",
];

impl CheckpointStatus {
    pub const ALL: [CheckpointStatus; 7] = [
        CheckpointStatus::Created,
        CheckpointStatus::PickedUp,
        CheckpointStatus::InTransit,
        CheckpointStatus::AtFacility,
        CheckpointStatus::OutForDelivery,
        CheckpointStatus::Delivered,
        CheckpointStatus::Exception,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointStatus::Created => "CREATED",
            CheckpointStatus::PickedUp => "PICKED_UP",
            CheckpointStatus::InTransit => "IN_TRANSIT",
            CheckpointStatus::AtFacility => "AT_FACILITY",
            CheckpointStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            CheckpointStatus::Delivered => "DELIVERED",
            CheckpointStatus::Exception => "EXCEPTION",
        }
    }
}

impl fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a literal is not one of [`VALID_STATUSES`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl FromStr for CheckpointStatus {
    type Err = UnknownStatus;

    /// Exact, case-sensitive match. No trimming or normalization.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckpointStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// True iff `candidate` is exactly one of the seven status literals
pub fn is_valid_status(candidate: &str) -> bool {
    candidate.parse::<CheckpointStatus>().is_ok()
}
