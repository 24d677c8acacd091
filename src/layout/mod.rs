//! Vertical layout of events inside timeline cells.
//!
//! Everything here is pure: functions borrow events, return placements and
//! never keep state between calls. Only the vertical axis is computed; bar
//! widths for multi-day events are left to the renderer.

mod cell;
mod config;
mod error;
mod grid;
mod height;
mod position;

pub use cell::{layout_cell, CellLayout, Placement};
pub use config::{
    LayoutConfig, DEFAULT_CELL_PADDING, DEFAULT_EVENT_HEIGHT, DEFAULT_EVENT_SPACING,
    DEFAULT_MIN_ROW_HEIGHT,
};
pub use error::LayoutError;
pub use grid::{layout_grid, GridLayout, RowLayout};
pub use height::{compute_cell_height, row_height};
pub use position::find_available_position;

use crate::model::{CalendarEvent, Px};

/// Anything that may occupy a slot in a cell.
pub trait Slotted {
    /// Assigned offset, or `None` while unplaced.
    fn top(&self) -> Option<Px>;
}

impl Slotted for Px {
    fn top(&self) -> Option<Px> {
        Some(*self)
    }
}

impl Slotted for Option<Px> {
    fn top(&self) -> Option<Px> {
        *self
    }
}

impl Slotted for CalendarEvent {
    fn top(&self) -> Option<Px> {
        self.top
    }
}

impl Slotted for Placement {
    fn top(&self) -> Option<Px> {
        Some(self.top)
    }
}

impl<T: Slotted + ?Sized> Slotted for &T {
    fn top(&self) -> Option<Px> {
        (**self).top()
    }
}
