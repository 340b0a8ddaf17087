//! History-query operation - all checkpoints of a unit in save order

use crate::domain::checkpoint::Checkpoint;
use crate::domain::error::TrackingResult;
use crate::infra::checkpoint_store::CheckpointStore;
use crate::infra::metrics::Metrics;
use std::sync::Arc;
use tracing::debug;

pub struct GetHistory {
    checkpoints: Arc<dyn CheckpointStore>,
    metrics: Arc<Metrics>,
}

impl GetHistory {
    pub fn new(checkpoints: Arc<dyn CheckpointStore>) -> Self {
        Self::with_metrics(checkpoints, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(checkpoints: Arc<dyn CheckpointStore>, metrics: Arc<Metrics>) -> Self {
        Self { checkpoints, metrics }
    }

    /// Empty for unknown or empty unit ids. Only a store failure can error.
    pub async fn execute(&self, unit_id: &str) -> TrackingResult<Vec<Checkpoint>> {
        self.metrics.record_history_query();
        if unit_id.is_empty() {
            return Ok(Vec::new());
        }

        let history = self.checkpoints.find_by_unit_id(unit_id).await?;
        debug!(unit_id = %unit_id, checkpoints = %history.len(), "history_queried");
        Ok(history)
    }
}
