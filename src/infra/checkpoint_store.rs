//! Checkpoint persistence, keyed by checkpoint id and queryable by unit id

use crate::domain::checkpoint::Checkpoint;
use crate::infra::store_error::StoreResult;
use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Insert or overwrite by id (last write wins)
    async fn save(&self, checkpoint: Checkpoint) -> StoreResult<()>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Checkpoint>>;

    /// All checkpoints for `unit_id` in insertion order
    async fn find_by_unit_id(&self, unit_id: &str) -> StoreResult<Vec<Checkpoint>>;

    /// Number of stored checkpoints
    async fn count(&self) -> StoreResult<usize>;
}

#[derive(Default)]
struct Inner {
    /// Records in first-insertion order
    records: Vec<Checkpoint>,
    /// checkpoint id -> index into `records`
    index: FxHashMap<String, usize>,
}

/// Process-lifetime checkpoint store
///
/// Overwriting an existing id replaces the record in place, so it keeps
/// its original position in the insertion order.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    inner: RwLock<Inner>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(&self, checkpoint: Checkpoint) -> StoreResult<()> {
        let mut inner = self.inner.write();
        match inner.index.get(checkpoint.id()).copied() {
            Some(idx) => inner.records[idx] = checkpoint,
            None => {
                let idx = inner.records.len();
                inner.index.insert(checkpoint.id().to_string(), idx);
                inner.records.push(checkpoint);
            }
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Checkpoint>> {
        let inner = self.inner.read();
        Ok(inner.index.get(id).map(|&idx| inner.records[idx].clone()))
    }

    async fn find_by_unit_id(&self, unit_id: &str) -> StoreResult<Vec<Checkpoint>> {
        let inner = self.inner.read();
        Ok(inner.records.iter().filter(|c| c.unit_id() == unit_id).cloned().collect())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.len())
    }
}
