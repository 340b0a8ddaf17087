//! Record-checkpoint operation
//!
//! validate status -> (lock unit) -> idempotency check -> save checkpoint -> create/update unit.
//! Failure paths return before any store write.

use crate::domain::checkpoint::Checkpoint;
use crate::domain::error::{TrackingError, TrackingResult};
use crate::domain::status::CheckpointStatus;
use crate::domain::unit::Unit;
use crate::infra::checkpoint_store::CheckpointStore;
use crate::infra::metrics::Metrics;
use crate::infra::unit_store::UnitStore;
use crate::services::unit_locks::UnitLocks;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Commits for one unit id are serialized through `locks`. Instances writing to the
/// same stores must share one registry (see [`RecordCheckpoint::with_locks`]).
pub struct RecordCheckpoint {
    checkpoints: Arc<dyn CheckpointStore>,
    units: Arc<dyn UnitStore>,
    locks: Arc<UnitLocks>,
    metrics: Arc<Metrics>,
}

impl RecordCheckpoint {
    pub fn new(checkpoints: Arc<dyn CheckpointStore>, units: Arc<dyn UnitStore>) -> Self {
        Self::with_metrics(checkpoints, units, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(
        checkpoints: Arc<dyn CheckpointStore>,
        units: Arc<dyn UnitStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self::with_locks(checkpoints, units, metrics, Arc::new(UnitLocks::new()))
    }

    pub fn with_locks(
        checkpoints: Arc<dyn CheckpointStore>,
        units: Arc<dyn UnitStore>,
        metrics: Arc<Metrics>,
        locks: Arc<UnitLocks>,
    ) -> Self {
        Self { checkpoints, units, locks, metrics }
    }

    /// Record that `unit_id` reached `status` at `timestamp`.
    ///
    /// Fails with `InvalidStatus` if `status` is not an exact status literal,
    /// and with `DuplicateRequest` if the unit already holds `status`.
    pub async fn execute(
        &self,
        unit_id: &str,
        status: &str,
        timestamp: DateTime<Utc>,
    ) -> TrackingResult<Checkpoint> {
        let start = Instant::now();
        let result = self.record(unit_id, status, timestamp).await;

        match &result {
            Ok(_) => self.metrics.record_checkpoint_recorded(),
            Err(TrackingError::InvalidStatus { .. }) => self.metrics.record_invalid_status(),
            Err(TrackingError::DuplicateRequest { .. }) => self.metrics.record_duplicate(),
            Err(TrackingError::Store(e)) => {
                self.metrics.record_store_error();
                error!(unit_id = %unit_id, error = %e, "checkpoint_store_failed");
            }
        }
        self.metrics.record_latency(start.elapsed().as_micros() as u64);

        result
    }

    async fn record(
        &self,
        unit_id: &str,
        raw_status: &str,
        timestamp: DateTime<Utc>,
    ) -> TrackingResult<Checkpoint> {
        let Ok(status) = raw_status.parse::<CheckpointStatus>() else {
            warn!(unit_id = %unit_id, status = %raw_status, "checkpoint_rejected_invalid_status");
            return Err(TrackingError::invalid_status(raw_status));
        };

        let _guard = self.locks.lock(unit_id).await;

        let existing = self.units.find_by_id(unit_id).await?;
        if let Some(unit) = &existing {
            if unit.status == status {
                warn!(unit_id = %unit_id, status = %status, "checkpoint_rejected_duplicate");
                return Err(TrackingError::duplicate_request(unit_id, status.as_str()));
            }
        }

        let checkpoint = Checkpoint::new(unit_id, status, timestamp);
        self.checkpoints.save(checkpoint.clone()).await?;

        let unit = match existing {
            None => {
                debug!(unit_id = %unit_id, status = %status, "unit_created");
                Unit::new(unit_id, status)
            }
            Some(mut unit) => {
                let previous = unit.status;
                unit.update_status(status);
                debug!(
                    unit_id = %unit_id,
                    from = %previous,
                    to = %status,
                    history_len = %unit.checkpoints.len(),
                    "unit_status_updated"
                );
                unit
            }
        };
        self.units.save(unit).await?;

        info!(
            checkpoint_id = %checkpoint.id(),
            unit_id = %unit_id,
            status = %status,
            timestamp = %checkpoint.timestamp(),
            "checkpoint_recorded"
        );

        Ok(checkpoint)
    }
}
