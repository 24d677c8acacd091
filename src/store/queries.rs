use chrono::NaiveDate;
use tokio::sync::oneshot;
use ulid::Ulid;

use crate::calendar::days_in_month;
use crate::layout::{self, layout_grid, CellLayout, GridLayout};
use crate::model::*;

use super::{Store, StoreError, WalCommand};

impl Store {
    /// All resources, ordered by id (creation order for generated ids).
    pub async fn resources(&self) -> Vec<ResourceInfo> {
        let mut out = Vec::with_capacity(self.resources.len());
        for rs in self.shared_resources() {
            let guard = rs.read().await;
            out.push(ResourceInfo {
                id: guard.id,
                name: guard.name.clone(),
                event_count: guard.events.len(),
            });
        }
        out
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub async fn get_event(&self, id: Ulid) -> Option<CalendarEvent> {
        let resource_id = self.get_resource_for_event(&id)?;
        let rs = self.get_resource(&resource_id)?;
        let guard = rs.read().await;
        guard.get_event(id).cloned()
    }

    /// Events of one resource, ordered by start day.
    pub async fn events_for_resource(&self, resource_id: Ulid) -> Result<Vec<CalendarEvent>, StoreError> {
        let rs = self
            .get_resource(&resource_id)
            .ok_or(StoreError::NotFound(resource_id))?;
        let guard = rs.read().await;
        Ok(guard.events.clone())
    }

    /// Members of the `(resource_id, day)` cell.
    pub async fn cell_events(&self, resource_id: Ulid, day: NaiveDate) -> Result<Vec<CalendarEvent>, StoreError> {
        let rs = self
            .get_resource(&resource_id)
            .ok_or(StoreError::NotFound(resource_id))?;
        let guard = rs.read().await;
        Ok(guard.events_on(day).cloned().collect())
    }

    /// Top a new event would get in the cell right now. Advisory only:
    /// `create_event` recomputes it under the write lock.
    pub async fn next_position(&self, resource_id: Ulid, day: NaiveDate) -> Result<Px, StoreError> {
        let cell = self.layout_cell(resource_id, day).await?;
        Ok(self.layout.find_available_position(&cell.placements)?)
    }

    pub async fn layout_cell(&self, resource_id: Ulid, day: NaiveDate) -> Result<CellLayout, StoreError> {
        let rs = self
            .get_resource(&resource_id)
            .ok_or(StoreError::NotFound(resource_id))?;
        let guard = rs.read().await;
        Ok(layout::layout_cell(day, guard.events_on(day), &self.layout)?)
    }

    /// Grid over `days` for every resource, rows ordered by resource id.
    pub async fn layout_days(&self, days: &[NaiveDate]) -> Result<GridLayout, StoreError> {
        let snapshot = self.snapshot().await;
        Ok(layout_grid(&snapshot, days, &self.layout)?)
    }

    /// Grid over the whole month containing `date`.
    pub async fn layout_month(&self, date: NaiveDate) -> Result<GridLayout, StoreError> {
        self.layout_days(&days_in_month(date)).await
    }

    /// Copy of every resource row, ordered by id.
    pub async fn snapshot(&self) -> Vec<ResourceState> {
        let mut out = Vec::with_capacity(self.resources.len());
        for rs in self.shared_resources() {
            out.push(rs.read().await.clone());
        }
        out
    }

    pub async fn appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    fn shared_resources(&self) -> Vec<super::SharedResourceState> {
        let mut entries: Vec<(Ulid, super::SharedResourceState)> = self
            .resources
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, rs)| rs).collect()
    }
}
