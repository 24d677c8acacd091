use chrono::NaiveDate;
use ulid::Ulid;

use crate::layout::{layout_cell, LayoutConfig};
use crate::limits::*;
use crate::model::*;
use crate::observability::EVENTS_PLACED_TOTAL;

use super::StoreError;

pub(crate) fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidEvent("resource name must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(StoreError::LimitExceeded("resource name too long"));
    }
    Ok(())
}

/// Check a draft's fields and resolve its day span.
pub(crate) fn validate_draft(draft: &EventDraft) -> Result<DaySpan, StoreError> {
    if draft.title.trim().is_empty() {
        return Err(StoreError::InvalidEvent("title must not be empty"));
    }
    if draft.title.len() > MAX_TITLE_LEN {
        return Err(StoreError::LimitExceeded("title too long"));
    }
    if let Some(ref color) = draft.color
        && color.len() > MAX_COLOR_LEN
    {
        return Err(StoreError::LimitExceeded("color too long"));
    }
    let span = draft
        .span()
        .ok_or(StoreError::InvalidEvent("end date before start date"))?;
    check_span(&span)?;
    if span.day_count() == 1
        && let (Some(start), Some(end)) = (draft.start_time, draft.end_time)
        && end < start
    {
        return Err(StoreError::InvalidEvent("end time before start time"));
    }
    Ok(span)
}

pub(crate) fn check_span(span: &DaySpan) -> Result<(), StoreError> {
    if span.day_count() > MAX_EVENT_DAYS {
        return Err(StoreError::LimitExceeded("event spans too many days"));
    }
    Ok(())
}

/// Slot for `event_id` in the `day` cell of `rs`, computed from committed
/// state. The event itself is left out of the cell so a re-placement does
/// not collide with its own old slot.
pub(crate) fn place_in_cell(
    rs: &ResourceState,
    day: NaiveDate,
    event_id: Ulid,
    config: &LayoutConfig,
) -> Result<Px, StoreError> {
    let cell = layout_cell(day, rs.events_on(day).filter(|e| e.id != event_id), config)?;
    let top = config.find_available_position(&cell.placements)?;
    metrics::counter!(EVENTS_PLACED_TOTAL).increment(1);
    Ok(top)
}
