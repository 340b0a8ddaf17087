//! Domain models - statuses, checkpoints and unit projections
//!
//! - `CheckpointStatus` - closed set of lifecycle states
//! - `Checkpoint` - immutable record of a status report
//! - `Unit` - current status of a tracked unit plus its update history
//! - `TrackingError` - domain error kinds

pub mod checkpoint;
pub mod error;
pub mod status;
pub mod unit;

// Re-export commonly used types at module level
pub use checkpoint::{Checkpoint, HistoryEntry};
pub use error::{TrackingError, TrackingResult};
pub use status::{is_valid_status, CheckpointStatus, VALID_STATUSES};
pub use unit::Unit;
