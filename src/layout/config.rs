use serde::Serialize;

use crate::model::Px;

use super::position::find_available_position;
use super::{LayoutError, Slotted};

pub const DEFAULT_EVENT_HEIGHT: Px = 36.0;
pub const DEFAULT_EVENT_SPACING: Px = 8.0;
pub const DEFAULT_CELL_PADDING: Px = 4.0;
pub const DEFAULT_MIN_ROW_HEIGHT: Px = 60.0;

/// Grid-wide slot geometry. Validated once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutConfig {
    event_height: Px,
    event_spacing: Px,
    cell_padding: Px,
    min_row_height: Px,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            event_height: DEFAULT_EVENT_HEIGHT,
            event_spacing: DEFAULT_EVENT_SPACING,
            cell_padding: DEFAULT_CELL_PADDING,
            min_row_height: DEFAULT_MIN_ROW_HEIGHT,
        }
    }
}

impl LayoutConfig {
    pub fn new(
        event_height: Px,
        event_spacing: Px,
        cell_padding: Px,
        min_row_height: Px,
    ) -> Result<Self, LayoutError> {
        validate_slot(event_height, cell_padding)?;
        if !event_spacing.is_finite() || event_spacing < 0.0 {
            return Err(LayoutError::InvalidConfig("event spacing must be finite and non-negative"));
        }
        if !min_row_height.is_finite() || min_row_height < 0.0 {
            return Err(LayoutError::InvalidConfig("minimum row height must be finite and non-negative"));
        }
        Ok(Self {
            event_height,
            event_spacing,
            cell_padding,
            min_row_height,
        })
    }

    pub fn event_height(&self) -> Px {
        self.event_height
    }

    pub fn event_spacing(&self) -> Px {
        self.event_spacing
    }

    pub fn cell_padding(&self) -> Px {
        self.cell_padding
    }

    pub fn min_row_height(&self) -> Px {
        self.min_row_height
    }

    /// Lowest free slot among `existing` using this geometry.
    pub fn find_available_position<T: Slotted>(&self, existing: &[T]) -> Result<Px, LayoutError> {
        find_available_position(existing, self.event_height, self.cell_padding)
    }
}

pub(super) fn validate_slot(event_height: Px, padding: Px) -> Result<(), LayoutError> {
    if !event_height.is_finite() || event_height <= 0.0 {
        return Err(LayoutError::InvalidConfig("event height must be finite and positive"));
    }
    if !padding.is_finite() || padding < 0.0 {
        return Err(LayoutError::InvalidConfig("padding must be finite and non-negative"));
    }
    Ok(())
}
