use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use tokio::sync::{oneshot, RwLock};
use tracing::{debug, info};
use ulid::Ulid;

use crate::calendar::time::{drag_minutes, minute_of_day};
use crate::calendar::shift_minutes;
use crate::limits::*;
use crate::model::*;
use crate::observability::{COMPACTIONS_TOTAL, RESOURCES_ACTIVE};

use super::placement::{check_span, place_in_cell, validate_draft, validate_name};
use super::{Store, StoreError, WalCommand};

impl Store {
    /// The id is claimed in the map before the log append; the new row stays
    /// write-locked until the append settles, and is taken out again if the
    /// append fails.
    pub async fn create_resource(&self, id: Ulid, name: String) -> Result<(), StoreError> {
        let _gate = self.commit_gate.read().await;
        validate_name(&name)?;
        if self.resources.len() >= MAX_RESOURCES {
            return Err(StoreError::LimitExceeded("too many resources"));
        }

        let row = Arc::new(RwLock::new(ResourceState::new(id, name.clone())));
        let guard = row.clone().write_owned().await;
        match self.resources.entry(id) {
            Entry::Occupied(_) => return Err(StoreError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                slot.insert(row.clone());
            }
        }

        let change = Change::ResourceCreated { id, name };
        if let Err(e) = self.wal_append(&change).await {
            self.resources.remove_if(&id, |_, current| Arc::ptr_eq(current, &row));
            return Err(e);
        }
        drop(guard);
        metrics::gauge!(RESOURCES_ACTIVE).set(self.resources.len() as f64);
        self.notify.send(id, &change);
        debug!(%id, "resource created");
        Ok(())
    }

    pub async fn rename_resource(&self, id: Ulid, name: String) -> Result<(), StoreError> {
        let _gate = self.commit_gate.read().await;
        validate_name(&name)?;
        let mut guard = self.lock_live(id).await?;
        let change = Change::ResourceRenamed { id, name };
        self.persist_and_apply(&mut [&mut *guard], &change).await
    }

    /// The row leaves the map while still locked, so anything queued on its
    /// lock finds it gone.
    pub async fn delete_resource(&self, id: Ulid) -> Result<(), StoreError> {
        let _gate = self.commit_gate.read().await;
        let guard = self.lock_live(id).await?;
        if !guard.events.is_empty() {
            return Err(StoreError::HasEvents(id));
        }

        let change = Change::ResourceDeleted { id };
        self.wal_append(&change).await?;
        self.resources.remove(&id);
        drop(guard);
        metrics::gauge!(RESOURCES_ACTIVE).set(self.resources.len() as f64);
        self.notify.send(id, &change);
        self.notify.remove(&id);
        debug!(%id, "resource deleted");
        Ok(())
    }

    /// Validate, place in the start-day cell and commit, all under the
    /// resource's write lock. Returns the stored event with its `top`.
    ///
    /// The event id is claimed in the index up front and released again if
    /// anything after that fails.
    pub async fn create_event(&self, id: Ulid, draft: EventDraft) -> Result<CalendarEvent, StoreError> {
        let _gate = self.commit_gate.read().await;
        let span = validate_draft(&draft)?;
        match self.event_index.entry(id) {
            Entry::Occupied(_) => return Err(StoreError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                slot.insert(draft.resource_id);
            }
        }

        let result = self.insert_event(id, draft, span).await;
        if result.is_err() {
            self.event_index.remove(&id);
        }
        result
    }

    async fn insert_event(&self, id: Ulid, draft: EventDraft, span: DaySpan) -> Result<CalendarEvent, StoreError> {
        let mut guard = self.lock_live(draft.resource_id).await?;
        if guard.events.len() >= MAX_EVENTS_PER_RESOURCE {
            return Err(StoreError::LimitExceeded("too many events on resource"));
        }

        let top = place_in_cell(&guard, span.start, id, &self.layout)?;
        let event = CalendarEvent::from_draft(id, draft, span, Some(top));
        let change = Change::EventCreated { event: event.clone() };
        self.persist_and_apply(&mut [&mut *guard], &change).await?;
        debug!(%id, resource = %event.resource_id, day = %span.start, top, "event created");
        Ok(event)
    }

    /// Replace-by-id with the fields of `draft`. The slot is kept while the
    /// event stays in the same (resource, start day) cell.
    pub async fn update_event(&self, id: Ulid, draft: EventDraft) -> Result<CalendarEvent, StoreError> {
        let span = validate_draft(&draft)?;
        let to = draft.resource_id;
        self.rewrite_event(id, to, move |existing| {
            Ok(CalendarEvent::from_draft(existing.id, draft, span, existing.top))
        })
        .await
    }

    /// Drop an event onto another cell. The span keeps its length; a
    /// sideways drag shifts start and end times by the same number of
    /// minutes, bounded by the start time hitting either end of the day.
    /// An event with only an end time has that end shifted and clamped.
    pub async fn move_event(&self, id: Ulid, to: MoveRequest) -> Result<CalendarEvent, StoreError> {
        let minutes_per_pixel = self.minutes_per_pixel;
        self.rewrite_event(id, to.resource_id, move |existing| {
            let span = existing
                .span
                .moved_to(to.start_date)
                .ok_or(StoreError::InvalidEvent("moved span leaves the calendar"))?;
            check_span(&span)?;

            let mut event = existing.clone();
            event.resource_id = to.resource_id;
            event.span = span;
            if let Some(px) = to.drag_px {
                let minutes = drag_minutes(px, minutes_per_pixel);
                match (existing.start_time, existing.end_time) {
                    (Some(start), end) => {
                        let shifted = shift_minutes(start, minutes);
                        let applied = minute_of_day(shifted) - minute_of_day(start);
                        event.start_time = Some(shifted);
                        event.end_time = end.map(|t| shift_minutes(t, applied));
                    }
                    // Only an end time: it takes the drag itself.
                    (None, Some(end)) => event.end_time = Some(shift_minutes(end, minutes)),
                    (None, None) => {}
                }
            }
            Ok(event)
        })
        .await
    }

    pub async fn delete_event(&self, id: Ulid) -> Result<CalendarEvent, StoreError> {
        let _gate = self.commit_gate.read().await;
        let (resource_id, mut guard) = self.resolve_event_write(&id).await?;
        let existing = guard.get_event(id).cloned().ok_or(StoreError::NotFound(id))?;
        let change = Change::EventDeleted { id, resource_id };
        self.persist_and_apply(&mut [&mut *guard], &change).await?;
        debug!(%id, resource = %resource_id, "event deleted");
        Ok(existing)
    }

    /// Shared path of update and move. `build` produces the new version from
    /// the committed one; placement and commit happen under the write locks
    /// of both the source and the destination row.
    async fn rewrite_event<F>(&self, id: Ulid, to: Ulid, build: F) -> Result<CalendarEvent, StoreError>
    where
        F: FnOnce(&CalendarEvent) -> Result<CalendarEvent, StoreError>,
    {
        let _gate = self.commit_gate.read().await;
        let from = self.get_resource_for_event(&id).ok_or(StoreError::NotFound(id))?;

        if from == to {
            let mut guard = self.lock_live(from).await?;
            let existing = guard.get_event(id).cloned().ok_or(StoreError::NotFound(id))?;
            let mut event = build(&existing)?;
            if existing.start_day() != event.start_day() || existing.top.is_none() {
                event.top = Some(place_in_cell(&guard, event.start_day(), id, &self.layout)?);
            }
            let change = Change::EventUpdated { previous_resource_id: from, event: event.clone() };
            self.persist_and_apply(&mut [&mut *guard], &change).await?;
            debug!(%id, resource = %to, top = ?event.top, "event updated");
            return Ok(event);
        }

        let (mut source, mut dest) = self.lock_pair(from, to).await?;
        let existing = source.get_event(id).cloned().ok_or(StoreError::NotFound(id))?;
        if dest.events.len() >= MAX_EVENTS_PER_RESOURCE {
            return Err(StoreError::LimitExceeded("too many events on resource"));
        }
        let mut event = build(&existing)?;
        event.top = Some(place_in_cell(&dest, event.start_day(), id, &self.layout)?);
        let change = Change::EventUpdated { previous_resource_id: from, event: event.clone() };
        self.persist_and_apply(&mut [&mut *source, &mut *dest], &change).await?;
        debug!(%id, from = %from, to = %to, top = ?event.top, "event moved between resources");
        Ok(event)
    }

    /// Rewrite the change log as the minimal sequence that rebuilds the
    /// current state.
    pub async fn compact(&self) -> Result<(), StoreError> {
        let _gate = self.commit_gate.write().await;
        let mut ids: Vec<Ulid> = self.resources.iter().map(|e| *e.key()).collect();
        ids.sort();

        let mut changes = Vec::new();
        for id in ids {
            let Some(rs) = self.get_resource(&id) else { continue };
            let guard = rs.read().await;
            changes.push(Change::ResourceCreated { id, name: guard.name.clone() });
            changes.extend(
                guard
                    .events
                    .iter()
                    .map(|event| Change::EventCreated { event: event.clone() }),
            );
        }

        let count = changes.len();
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { changes, response: tx })
            .await
            .map_err(|_| StoreError::WalError("writer shut down".into()))?;
        rx.await
            .map_err(|_| StoreError::WalError("writer dropped response".into()))?
            .map_err(|e| StoreError::WalError(e.to_string()))?;

        metrics::counter!(COMPACTIONS_TOTAL).increment(1);
        info!(changes = count, "change log compacted");
        Ok(())
    }
}
