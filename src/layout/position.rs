use crate::model::Px;

use super::config::validate_slot;
use super::{LayoutError, Slotted};

/// First-fit slot search inside one cell.
///
/// Occupied slots are `[top, top + event_height)`, scanned bottom-up from
/// `padding`. The first gap that fits a whole slot wins, so a cell that lost
/// an event reuses the hole instead of growing. Unplaced entries are ignored.
pub fn find_available_position<T: Slotted>(
    existing: &[T],
    event_height: Px,
    padding: Px,
) -> Result<Px, LayoutError> {
    validate_slot(event_height, padding)?;

    let mut occupied: Vec<Px> = Vec::with_capacity(existing.len());
    for top in existing.iter().filter_map(|e| e.top()) {
        if !top.is_finite() || top < 0.0 {
            return Err(LayoutError::InvalidOffset(top));
        }
        occupied.push(top);
    }
    occupied.sort_by(|a, b| a.total_cmp(b));

    let mut position = padding;
    for start in occupied {
        if start >= position + event_height {
            return Ok(position);
        }
        // Never move backwards past a slot already cleared.
        position = position.max(start + event_height + padding);
    }
    Ok(position)
}
