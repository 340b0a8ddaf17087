//! Unit persistence, keyed by unit id and queryable by status

use crate::domain::unit::Unit;
use crate::infra::store_error::StoreResult;
use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

#[async_trait]
pub trait UnitStore: Send + Sync {
    /// Insert or overwrite by id
    async fn save(&self, unit: Unit) -> StoreResult<()>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Unit>>;

    /// Order unspecified
    async fn find_all(&self) -> StoreResult<Vec<Unit>>;

    /// Units whose current status literal equals `status` (order unspecified).
    /// An empty or unknown literal matches nothing.
    async fn find_by_status(&self, status: &str) -> StoreResult<Vec<Unit>>;

    /// Number of stored units
    async fn count(&self) -> StoreResult<usize>;
}

/// Process-lifetime unit store
#[derive(Default)]
pub struct InMemoryUnitStore {
    units: RwLock<FxHashMap<String, Unit>>,
}

impl InMemoryUnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.units.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UnitStore for InMemoryUnitStore {
    async fn save(&self, unit: Unit) -> StoreResult<()> {
        self.units.write().insert(unit.id.clone(), unit);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Unit>> {
        Ok(self.units.read().get(id).cloned())
    }

    async fn find_all(&self) -> StoreResult<Vec<Unit>> {
        Ok(self.units.read().values().cloned().collect())
    }

    async fn find_by_status(&self, status: &str) -> StoreResult<Vec<Unit>> {
        Ok(self.units.read().values().filter(|u| u.status.as_str() == status).cloned().collect())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::CheckpointStatus;

    #[tokio::test]
    async fn test_save_and_find_by_id() {
        let store = InMemoryUnitStore::new();
        let unit = Unit::new("unit-1", CheckpointStatus::Created);

        store.save(unit.clone()).await.unwrap();

        assert_eq!(store.find_by_id("unit-1").await.unwrap(), Some(unit));
        assert_eq!(store.find_by_id("unit-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_replaces_existing() {
        let store = InMemoryUnitStore::new();
        let mut unit = Unit::new("unit-1", CheckpointStatus::Created);
        store.save(unit.clone()).await.unwrap();

        unit.update_status(CheckpointStatus::InTransit);
        store.save(unit.clone()).await.unwrap();

        assert_eq!(store.len(), 1);
        let stored = store.find_by_id("unit-1").await.unwrap().unwrap();
        assert_eq!(stored.status, CheckpointStatus::InTransit);
        assert_eq!(stored.checkpoints.len(), 1);
    }

    #[tokio::test]
    async fn test_find_all() {
        let store = InMemoryUnitStore::new();
        assert!(store.find_all().await.unwrap().is_empty());

        store.save(Unit::new("a", CheckpointStatus::Created)).await.unwrap();
        store.save(Unit::new("b", CheckpointStatus::Delivered)).await.unwrap();

        let mut ids: Vec<String> =
            store.find_all().await.unwrap().into_iter().map(|u| u.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_find_by_status() {
        let store = InMemoryUnitStore::new();
        store.save(Unit::new("a", CheckpointStatus::InTransit)).await.unwrap();
        store.save(Unit::new("b", CheckpointStatus::Delivered)).await.unwrap();
        store.save(Unit::new("c", CheckpointStatus::InTransit)).await.unwrap();

        let mut in_transit: Vec<String> =
            store.find_by_status("IN_TRANSIT").await.unwrap().into_iter().map(|u| u.id).collect();
        in_transit.sort();

        assert_eq!(in_transit, vec!["a", "c"]);
        assert_eq!(store.find_by_status("DELIVERED").await.unwrap().len(), 1);
        assert!(store.find_by_status("EXCEPTION").await.unwrap().is_empty());
        assert!(store.find_by_status("").await.unwrap().is_empty());
        assert!(store.find_by_status("in_transit").await.unwrap().is_empty());
    }
}
