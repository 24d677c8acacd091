use crate::model::Px;

use super::LayoutConfig;

/// Height needed to stack every event of a cell without clipping.
///
/// `max(min_row_height, 2 * padding + count * (event_height + spacing))`.
pub fn compute_cell_height<T>(events_in_cell: &[T], config: &LayoutConfig) -> Px {
    let count = events_in_cell.len() as Px;
    let stacked = 2.0 * config.cell_padding() + count * (config.event_height() + config.event_spacing());
    stacked.max(config.min_row_height())
}

/// Every cell of a resource row renders at the tallest cell's height.
pub fn row_height(cell_heights: impl IntoIterator<Item = Px>, config: &LayoutConfig) -> Px {
    cell_heights
        .into_iter()
        .fold(config.min_row_height(), Px::max)
}
