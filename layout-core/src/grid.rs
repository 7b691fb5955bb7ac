//! Occupancy map over the fixed-size layout grid.
//!
//! The map is derived state: it is rebuilt from the section list whenever the
//! list changes and is never persisted.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};
use crate::section::{GridPosition, GridSize, Section, SectionId};

/// Grid extent in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl GridDimensions {
    /// Create grid dimensions.
    #[must_use]
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Whether a footprint at `position` stays inside the grid.
    ///
    /// A footprint whose far edge overflows `usize` is outside.
    #[must_use]
    pub const fn contains(self, position: GridPosition, size: GridSize) -> bool {
        if !size.is_valid() {
            return false;
        }
        match (
            position.row.checked_add(size.row_span),
            position.col.checked_add(size.col_span),
        ) {
            (Some(bottom), Some(right)) => bottom <= self.rows && right <= self.cols,
            _ => false,
        }
    }

    /// Whether a footprint of this size fits the grid anywhere.
    #[must_use]
    pub const fn fits(self, size: GridSize) -> bool {
        size.is_valid() && size.row_span <= self.rows && size.col_span <= self.cols
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.rows * self.cols
    }
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self::new(12, 4)
    }
}

/// A single grid cell as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
    /// Whether a section covers this cell.
    pub occupied: bool,
    /// The covering section, if any.
    pub occupant: Option<SectionId>,
}

/// A cell claimed by more than one footprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellConflict {
    /// Conflicting cell.
    pub position: GridPosition,
    /// Section that kept the cell.
    pub owner: SectionId,
    /// Section whose footprint also covers it.
    pub intruder: SectionId,
}

/// Row-major occupancy map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyMap {
    dims: GridDimensions,
    cells: Vec<Option<SectionId>>,
    conflicts: Vec<CellConflict>,
}

impl OccupancyMap {
    /// An empty map.
    #[must_use]
    pub fn empty(dims: GridDimensions) -> Self {
        Self {
            dims,
            cells: vec![None; dims.cell_count()],
            conflicts: Vec::new(),
        }
    }

    /// Mark every cell covered by a section with the section's id.
    ///
    /// When two footprints share a cell the earlier section keeps it and the
    /// clash is recorded in [`OccupancyMap::conflicts`].
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::MalformedSection`] if a section has a zero span
    /// or a footprint extending past the grid.
    pub fn rebuild(dims: GridDimensions, sections: &[Section]) -> LayoutResult<Self> {
        let mut map = Self::empty(dims);
        for section in sections {
            if !section.size.is_valid() {
                return Err(LayoutError::MalformedSection {
                    id: section.id.clone(),
                    reason: format!("span {} must be at least 1x1", section.size),
                });
            }
            if !dims.contains(section.position, section.size) {
                return Err(LayoutError::MalformedSection {
                    id: section.id.clone(),
                    reason: format!(
                        "footprint {} at {} leaves the {}x{} grid",
                        section.size, section.position, dims.rows, dims.cols
                    ),
                });
            }
            map.claim(section);
        }
        Ok(map)
    }

    fn claim(&mut self, section: &Section) {
        let GridPosition { row, col } = section.position;
        for r in row..row + section.size.row_span {
            for c in col..col + section.size.col_span {
                let index = r * self.dims.cols + c;
                match &self.cells[index] {
                    Some(owner) if *owner != section.id => {
                        self.conflicts.push(CellConflict {
                            position: GridPosition::new(r, c),
                            owner: owner.clone(),
                            intruder: section.id.clone(),
                        });
                    }
                    Some(_) => {}
                    None => self.cells[index] = Some(section.id.clone()),
                }
            }
        }
    }

    /// Grid extent.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    /// The section covering a cell. `None` when free or out of bounds.
    #[must_use]
    pub fn occupant(&self, row: usize, col: usize) -> Option<&SectionId> {
        if row >= self.dims.rows || col >= self.dims.cols {
            return None;
        }
        self.cells[row * self.dims.cols + col].as_ref()
    }

    /// Whether a cell is covered.
    #[must_use]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.occupant(row, col).is_some()
    }

    /// Describe a cell. `None` when out of bounds.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<GridCell> {
        if row >= self.dims.rows || col >= self.dims.cols {
            return None;
        }
        let occupant = self.occupant(row, col).cloned();
        Some(GridCell {
            row,
            col,
            occupied: occupant.is_some(),
            occupant,
        })
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.cells.iter().enumerate().map(|(index, occupant)| GridCell {
            row: index / self.dims.cols,
            col: index % self.dims.cols,
            occupied: occupant.is_some(),
            occupant: occupant.clone(),
        })
    }

    /// Number of covered cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Cells claimed by more than one section during the last rebuild.
    #[must_use]
    pub fn conflicts(&self) -> &[CellConflict] {
        &self.conflicts
    }

    /// Whether every covered cell has exactly one owner.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.conflicts.is_empty()
    }
}
