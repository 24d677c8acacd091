use chrono::NaiveDate;
use serde::Serialize;
use ulid::Ulid;

use crate::model::{Px, ResourceState};

use super::{layout_cell, row_height, CellLayout, LayoutConfig, LayoutError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowLayout {
    pub resource_id: Ulid,
    pub name: String,
    /// Shared by every cell of the row.
    pub height: Px,
    pub cells: Vec<CellLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLayout {
    pub days: Vec<NaiveDate>,
    pub rows: Vec<RowLayout>,
}

impl GridLayout {
    pub fn row(&self, resource_id: Ulid) -> Option<&RowLayout> {
        self.rows.iter().find(|r| r.resource_id == resource_id)
    }

    pub fn cell(&self, resource_id: Ulid, day: NaiveDate) -> Option<&CellLayout> {
        self.row(resource_id)?.cells.iter().find(|c| c.day == day)
    }
}

/// Lay out every (resource, day) cell. Rows keep the order of `resources`.
pub fn layout_grid(
    resources: &[ResourceState],
    days: &[NaiveDate],
    config: &LayoutConfig,
) -> Result<GridLayout, LayoutError> {
    let mut rows = Vec::with_capacity(resources.len());
    for rs in resources {
        let mut cells = days
            .iter()
            .map(|&day| layout_cell(day, rs.events_on(day), config))
            .collect::<Result<Vec<_>, _>>()?;
        let height = row_height(cells.iter().map(|c| c.height), config);
        for cell in &mut cells {
            cell.height = height;
        }
        rows.push(RowLayout {
            resource_id: rs.id,
            name: rs.name.clone(),
            height,
            cells,
        });
    }
    Ok(GridLayout {
        days: days.to_vec(),
        rows,
    })
}
