use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Pixel offsets and heights. The only layout unit.
pub type Px = f64;

/// Closed range of calendar days `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DaySpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "DaySpan start must not be after end");
        Self { start, end }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    /// Number of days covered, counting both ends.
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains_day(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn overlaps(&self, other: &DaySpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Same length, starting at `start`. `None` if the end would leave the calendar.
    pub fn moved_to(&self, start: NaiveDate) -> Option<DaySpan> {
        let end = start.checked_add_signed(Duration::days(self.day_count() - 1))?;
        Some(DaySpan { start, end })
    }
}

/// Caller-supplied fields of an event, as entered in the create/edit dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub resource_id: Ulid,
    pub title: String,
    pub start_date: NaiveDate,
    /// Defaults to `start_date`.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub color: Option<String>,
}

impl EventDraft {
    pub fn new(resource_id: Ulid, title: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            resource_id,
            title: title.into(),
            start_date,
            end_date: None,
            start_time: None,
            end_time: None,
            color: None,
        }
    }

    pub fn ending(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn at(mut self, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    /// `None` when the end date precedes the start date.
    pub fn span(&self) -> Option<DaySpan> {
        let end = self.end_date.unwrap_or(self.start_date);
        (end >= self.start_date).then(|| DaySpan::new(self.start_date, end))
    }
}

/// One event on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Ulid,
    pub resource_id: Ulid,
    pub title: String,
    pub span: DaySpan,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub color: Option<String>,
    /// Slot offset inside the start-day cell, assigned by the store.
    pub top: Option<Px>,
}

impl CalendarEvent {
    pub fn from_draft(id: Ulid, draft: EventDraft, span: DaySpan, top: Option<Px>) -> Self {
        Self {
            id,
            resource_id: draft.resource_id,
            title: draft.title,
            span,
            start_time: draft.start_time,
            end_time: draft.end_time,
            color: draft.color,
            top,
        }
    }

    pub fn start_day(&self) -> NaiveDate {
        self.span.start
    }

    /// True if this event is a member of the `(resource_id, day)` cell.
    pub fn occupies(&self, resource_id: Ulid, day: NaiveDate) -> bool {
        self.resource_id == resource_id && self.span.contains_day(day)
    }
}

#[derive(Debug, Clone)]
pub struct ResourceState {
    pub id: Ulid,
    pub name: String,
    /// All events of this resource, sorted by `span.start`.
    pub events: Vec<CalendarEvent>,
}

impl ResourceState {
    pub fn new(id: Ulid, name: String) -> Self {
        Self {
            id,
            name,
            events: Vec::new(),
        }
    }

    /// Insert event maintaining sort order by span.start.
    pub fn insert_event(&mut self, event: CalendarEvent) {
        let pos = self
            .events
            .partition_point(|e| e.span.start <= event.span.start);
        self.events.insert(pos, event);
    }

    pub fn remove_event(&mut self, id: Ulid) -> Option<CalendarEvent> {
        let pos = self.events.iter().position(|e| e.id == id)?;
        Some(self.events.remove(pos))
    }

    /// Replace-by-id. Returns the previous version.
    pub fn replace_event(&mut self, event: CalendarEvent) -> Option<CalendarEvent> {
        let previous = self.remove_event(event.id);
        self.insert_event(event);
        previous
    }

    pub fn get_event(&self, id: Ulid) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Events covering `day`. Binary search skips everything starting after it.
    pub fn events_on(&self, day: NaiveDate) -> impl Iterator<Item = &CalendarEvent> {
        let right_bound = self.events.partition_point(|e| e.span.start <= day);
        self.events[..right_bound]
            .iter()
            .filter(move |e| e.span.end >= day)
    }
}

/// Change log record. Flat, no nesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Change {
    ResourceCreated {
        id: Ulid,
        name: String,
    },
    ResourceRenamed {
        id: Ulid,
        name: String,
    },
    ResourceDeleted {
        id: Ulid,
    },
    EventCreated {
        event: CalendarEvent,
    },
    /// Replace-by-id. `previous_resource_id` differs from `event.resource_id`
    /// when the event moved rows.
    EventUpdated {
        previous_resource_id: Ulid,
        event: CalendarEvent,
    },
    EventDeleted {
        id: Ulid,
        resource_id: Ulid,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceInfo {
    pub id: Ulid,
    pub name: String,
    pub event_count: usize,
}

/// Where a dragged event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub resource_id: Ulid,
    pub start_date: NaiveDate,
    /// Horizontal drag distance; converted to a time shift.
    #[serde(default)]
    pub drag_px: Option<Px>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn event_on(resource_id: Ulid, start: u32, end: u32) -> CalendarEvent {
        CalendarEvent {
            id: Ulid::new(),
            resource_id,
            title: "Shift".into(),
            span: DaySpan::new(d(start), d(end)),
            start_time: None,
            end_time: None,
            color: None,
            top: None,
        }
    }

    #[test]
    fn day_span_basics() {
        let s = DaySpan::new(d(4), d(6));
        assert_eq!(s.day_count(), 3);
        assert!(s.contains_day(d(4)));
        assert!(s.contains_day(d(6))); // closed
        assert!(!s.contains_day(d(7)));
        assert_eq!(DaySpan::single(d(9)).day_count(), 1);
    }

    #[test]
    fn day_span_overlap() {
        let a = DaySpan::new(d(1), d(3));
        let b = DaySpan::new(d(3), d(5));
        let c = DaySpan::new(d(4), d(5));
        assert!(a.overlaps(&b)); // sharing a day counts
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn day_span_moved_keeps_length() {
        let s = DaySpan::new(d(30), d(31));
        let moved = s.moved_to(NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()).unwrap();
        assert_eq!(moved.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(s.moved_to(NaiveDate::MAX).is_none());
    }

    #[test]
    fn draft_span_defaults_and_rejects_reversed() {
        let rid = Ulid::new();
        let draft = EventDraft::new(rid, "Standup", d(5));
        assert_eq!(draft.span(), Some(DaySpan::single(d(5))));
        assert_eq!(draft.clone().ending(d(7)).span(), Some(DaySpan::new(d(5), d(7))));
        assert_eq!(draft.ending(d(4)).span(), None);
    }

    #[test]
    fn event_ordering() {
        let rid = Ulid::new();
        let mut rs = ResourceState::new(rid, "Room".into());
        rs.insert_event(event_on(rid, 20, 20));
        rs.insert_event(event_on(rid, 2, 3));
        rs.insert_event(event_on(rid, 10, 12));
        let starts: Vec<_> = rs.events.iter().map(|e| e.span.start).collect();
        assert_eq!(starts, vec![d(2), d(10), d(20)]);
    }

    #[test]
    fn replace_moves_to_sorted_position() {
        let rid = Ulid::new();
        let mut rs = ResourceState::new(rid, "Room".into());
        let first = event_on(rid, 1, 1);
        rs.insert_event(first.clone());
        rs.insert_event(event_on(rid, 5, 5));

        let mut later = first.clone();
        later.span = DaySpan::single(d(9));
        let previous = rs.replace_event(later).unwrap();
        assert_eq!(previous.span.start, d(1));
        assert_eq!(rs.events.len(), 2);
        assert_eq!(rs.events[1].id, first.id);
    }

    #[test]
    fn event_remove() {
        let rid = Ulid::new();
        let mut rs = ResourceState::new(rid, "Room".into());
        let ev = event_on(rid, 1, 1);
        let id = ev.id;
        rs.insert_event(ev);
        assert!(rs.remove_event(id).is_some());
        assert!(rs.events.is_empty());
        assert!(rs.remove_event(id).is_none());
    }

    #[test]
    fn events_on_includes_multi_day_spans() {
        let rid = Ulid::new();
        let mut rs = ResourceState::new(rid, "Room".into());
        rs.insert_event(event_on(rid, 1, 2)); // past
        rs.insert_event(event_on(rid, 3, 8)); // spans the query day
        rs.insert_event(event_on(rid, 5, 5)); // on the day
        rs.insert_event(event_on(rid, 6, 9)); // future
        let hits: Vec<_> = rs.events_on(d(5)).map(|e| e.span).collect();
        assert_eq!(hits, vec![DaySpan::new(d(3), d(8)), DaySpan::single(d(5))]);
    }

    #[test]
    fn events_on_empty_resource() {
        let rs = ResourceState::new(Ulid::new(), "Room".into());
        assert_eq!(rs.events_on(d(1)).count(), 0);
    }

    #[test]
    fn occupies_checks_resource_and_day() {
        let rid = Ulid::new();
        let ev = event_on(rid, 3, 4);
        assert!(ev.occupies(rid, d(4)));
        assert!(!ev.occupies(rid, d(5)));
        assert!(!ev.occupies(Ulid::new(), d(3)));
    }
}
