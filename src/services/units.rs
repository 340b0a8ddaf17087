//! Unit listing - current projections, optionally filtered by status

use crate::domain::error::TrackingResult;
use crate::domain::unit::Unit;
use crate::infra::unit_store::UnitStore;
use std::sync::Arc;

pub struct ListUnits {
    units: Arc<dyn UnitStore>,
}

impl ListUnits {
    pub fn new(units: Arc<dyn UnitStore>) -> Self {
        Self { units }
    }

    /// All units, or those whose current status literal equals `status`
    pub async fn execute(&self, status: Option<&str>) -> TrackingResult<Vec<Unit>> {
        let mut units = match status {
            Some(status) => self.units.find_by_status(status).await?,
            None => self.units.find_all().await?,
        };
        // Store order is unspecified; keep responses stable
        units.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::CheckpointStatus;
    use crate::infra::unit_store::InMemoryUnitStore;

    #[tokio::test]
    async fn test_list_all_and_filtered() {
        let store = Arc::new(InMemoryUnitStore::new());
        store.save(Unit::new("b", CheckpointStatus::Delivered)).await.unwrap();
        store.save(Unit::new("a", CheckpointStatus::InTransit)).await.unwrap();
        store.save(Unit::new("c", CheckpointStatus::Delivered)).await.unwrap();
        let list = ListUnits::new(store);

        let all: Vec<String> = list.execute(None).await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(all, vec!["a", "b", "c"]);

        let delivered: Vec<String> =
            list.execute(Some("DELIVERED")).await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(delivered, vec!["b", "c"]);

        assert!(list.execute(Some("")).await.unwrap().is_empty());
    }
}
