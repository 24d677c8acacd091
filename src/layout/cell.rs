use chrono::NaiveDate;
use serde::Serialize;
use ulid::Ulid;

use crate::model::{CalendarEvent, Px};

use super::{compute_cell_height, LayoutConfig, LayoutError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub event_id: Ulid,
    pub top: Px,
}

/// Resolved slots of one (resource, day) cell, sorted by `top`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellLayout {
    pub day: NaiveDate,
    pub placements: Vec<Placement>,
    pub height: Px,
}

impl CellLayout {
    pub fn top_of(&self, event_id: Ulid) -> Option<Px> {
        self.placements
            .iter()
            .find(|p| p.event_id == event_id)
            .map(|p| p.top)
    }
}

fn slots_overlap(a: Px, b: Px, height: Px) -> bool {
    a < b + height && b < a + height
}

/// Lay out the events of one cell.
///
/// Stored offsets are honoured in ascending order as long as they do not
/// collide with a slot already kept. Unplaced and colliding events (the
/// latter is what happens on the later days of a multi-day event) are
/// placed first-fit in id order. A stored offset that is negative or not
/// finite is an `InvalidOffset` error.
pub fn layout_cell<'a>(
    day: NaiveDate,
    events: impl IntoIterator<Item = &'a CalendarEvent>,
    config: &LayoutConfig,
) -> Result<CellLayout, LayoutError> {
    let height = config.event_height();
    let mut stored: Vec<(Px, &CalendarEvent)> = Vec::new();
    let mut pending: Vec<&CalendarEvent> = Vec::new();

    for event in events {
        match event.top {
            Some(top) if top.is_finite() && top >= 0.0 => stored.push((top, event)),
            Some(top) => return Err(LayoutError::InvalidOffset(top)),
            None => pending.push(event),
        }
    }
    stored.sort_by(|(ta, a), (tb, b)| ta.total_cmp(tb).then(a.id.cmp(&b.id)));

    let mut placements: Vec<Placement> = Vec::with_capacity(stored.len() + pending.len());
    for (top, event) in stored {
        if placements.iter().all(|p| !slots_overlap(p.top, top, height)) {
            placements.push(Placement { event_id: event.id, top });
        } else {
            pending.push(event);
        }
    }

    pending.sort_by_key(|e| e.id);
    for event in pending {
        let top = config.find_available_position(&placements)?;
        placements.push(Placement { event_id: event.id, top });
    }
    placements.sort_by(|a, b| a.top.total_cmp(&b.top));

    let lowest = placements
        .iter()
        .map(|p| p.top + height + config.cell_padding())
        .fold(0.0, Px::max);
    let cell_height = compute_cell_height(&placements, config).max(lowest);

    Ok(CellLayout {
        day,
        placements,
        height: cell_height,
    })
}
