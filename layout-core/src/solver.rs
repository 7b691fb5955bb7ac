//! Placement feasibility and nearest-free-slot search.
//!
//! The search is deterministic: identical occupancy and arguments always
//! yield the same cell, which the reconciler relies on for idempotence.

use crate::error::{LayoutError, LayoutResult};
use crate::grid::{GridDimensions, OccupancyMap};
use crate::section::{GridPosition, GridSize, SectionId};

/// Reject footprints that cannot fit the grid anywhere.
///
/// # Errors
///
/// Returns [`LayoutError::BoundsViolation`] if either span is zero or larger
/// than the grid.
pub fn check_fits(dims: GridDimensions, size: GridSize) -> LayoutResult<()> {
    if dims.fits(size) {
        Ok(())
    } else {
        Err(LayoutError::BoundsViolation {
            size,
            rows: dims.rows,
            cols: dims.cols,
        })
    }
}

/// Pure queries over one occupancy map.
#[derive(Debug, Clone, Copy)]
pub struct PlacementSolver<'a> {
    map: &'a OccupancyMap,
}

impl<'a> PlacementSolver<'a> {
    /// Create a solver over an occupancy map.
    #[must_use]
    pub const fn new(map: &'a OccupancyMap) -> Self {
        Self { map }
    }

    /// Whether a footprint fits at `(row, col)`.
    ///
    /// Cells owned by `exclude` count as free so a section can be tested
    /// against its own previous footprint.
    #[must_use]
    pub fn can_place(
        &self,
        row: usize,
        col: usize,
        size: GridSize,
        exclude: Option<&SectionId>,
    ) -> bool {
        let dims = self.map.dimensions();
        if !dims.contains(GridPosition::new(row, col), size) {
            return false;
        }
        for r in row..row + size.row_span {
            for c in col..col + size.col_span {
                if let Some(owner) = self.map.occupant(r, c) {
                    if Some(owner) != exclude {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Find the closest cell where the footprint fits.
    ///
    /// A target that already fits is returned unchanged. Otherwise the target
    /// is clamped into the grid and, if that still collides, an expanding
    /// square around it is scanned in row-major order; the first feasible cell
    /// at the smallest radius wins. Returns `None` when the grid has no room.
    #[must_use]
    pub fn find_nearest_free(
        &self,
        target_row: usize,
        target_col: usize,
        size: GridSize,
        exclude: Option<&SectionId>,
    ) -> Option<GridPosition> {
        let dims = self.map.dimensions();
        if !dims.fits(size) {
            return None;
        }
        if self.can_place(target_row, target_col, size, exclude) {
            return Some(GridPosition::new(target_row, target_col));
        }

        let max_row = dims.rows - size.row_span;
        let max_col = dims.cols - size.col_span;
        let row = target_row.min(max_row);
        let col = target_col.min(max_col);
        if self.can_place(row, col, size, exclude) {
            return Some(GridPosition::new(row, col));
        }

        for radius in 1..=dims.rows.max(dims.cols) {
            let row_lo = row.saturating_sub(radius);
            let row_hi = (row + radius).min(max_row);
            let col_lo = col.saturating_sub(radius);
            let col_hi = (col + radius).min(max_col);
            for r in row_lo..=row_hi {
                for c in col_lo..=col_hi {
                    if self.can_place(r, c, size, exclude) {
                        tracing::trace!(
                            "Placed {size} at ({r}, {c}), radius {radius} from target \
                             ({target_row}, {target_col})"
                        );
                        return Some(GridPosition::new(r, c));
                    }
                }
            }
        }
        None
    }

    /// Like [`PlacementSolver::find_nearest_free`] but reports why nothing was found.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::BoundsViolation`] if the footprint is larger than
    /// the grid, or [`LayoutError::PlacementExhausted`] if no free slot exists.
    pub fn place(
        &self,
        target: GridPosition,
        size: GridSize,
        exclude: Option<&SectionId>,
    ) -> LayoutResult<GridPosition> {
        check_fits(self.map.dimensions(), size)?;
        self.find_nearest_free(target.row, target.col, size, exclude)
            .ok_or(LayoutError::PlacementExhausted { size, target })
    }
}
