//! Services - the tracking operations
//!
//! - `record_checkpoint` - validate, guard against duplicates, persist checkpoint and unit
//! - `history` - read a unit's checkpoints in save order
//! - `units` - list unit projections
//! - `unit_locks` - per-unit serialization of commits

pub mod history;
pub mod record_checkpoint;
pub mod unit_locks;
pub mod units;

// Re-export commonly used types
pub use history::GetHistory;
pub use record_checkpoint::RecordCheckpoint;
pub use unit_locks::UnitLocks;
pub use units::ListUnits;
