//! Pointer-driven drag state machine.
//!
//! ```text
//!            pointer_down (editable)
//!   Idle ───────────────────────────▶ Dragging
//!    ▲                                  │  pointer_move: snap via solver
//!    └──────── pointer_up / blur ◀──────┘
//! ```
//!
//! Moves update the dragged section's position only; the occupancy map stays
//! stale until release. That is safe because every solver query excludes the
//! dragged section.

use serde::Serialize;

use crate::config::CellSize;
use crate::error::{LayoutError, LayoutResult};
use crate::grid::OccupancyMap;
use crate::section::{GridPosition, Section, SectionId};
use crate::solver::PlacementSolver;

/// An in-progress drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// Section being dragged.
    pub section_id: SectionId,
    /// Pointer X minus the section's pixel origin at pointer-down.
    pub offset_x: f32,
    /// Pointer Y minus the section's pixel origin at pointer-down.
    pub offset_y: f32,
    /// Position at pointer-down.
    pub origin: GridPosition,
    /// Last snapped position.
    pub current: GridPosition,
}

/// Drag controller state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// A section follows the pointer.
    Dragging(DragSession),
}

/// Result of a finished drag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragOutcome {
    /// Section that was dragged.
    pub section_id: SectionId,
    /// Position at pointer-down.
    pub from: GridPosition,
    /// Committed position.
    pub to: GridPosition,
}

impl DragOutcome {
    /// Whether the section ended up somewhere else.
    #[must_use]
    pub fn moved(&self) -> bool {
        self.from != self.to
    }
}

/// Turns pointer events into snapped grid placements.
#[derive(Debug, Clone)]
pub struct DragController {
    cell: CellSize,
    state: DragState,
}

impl DragController {
    /// Create an idle controller.
    #[must_use]
    pub fn new(cell: CellSize) -> Self {
        Self {
            cell,
            state: DragState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &DragState {
        &self.state
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Section currently being dragged.
    #[must_use]
    pub fn active_section(&self) -> Option<&SectionId> {
        match &self.state {
            DragState::Dragging(session) => Some(&session.section_id),
            DragState::Idle => None,
        }
    }

    /// Pixel origin of a grid cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // grid indices are tiny
    pub fn pixel_origin(&self, position: GridPosition) -> (f32, f32) {
        (
            position.col as f32 * self.cell.width,
            position.row as f32 * self.cell.height,
        )
    }

    /// Grid cell under a pixel position, saturating at zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn cell_at(&self, x: f32, y: f32) -> GridPosition {
        let col = (x / self.cell.width).floor().max(0.0);
        let row = (y / self.cell.height).floor().max(0.0);
        GridPosition::new(row as usize, col as usize)
    }

    /// Start dragging `section` from pointer `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NotEditable`] for structural sections and
    /// [`LayoutError::DragInProgress`] if another drag has not been released.
    pub fn pointer_down(&mut self, section: &Section, x: f32, y: f32) -> LayoutResult<()> {
        if let DragState::Dragging(session) = &self.state {
            return Err(LayoutError::DragInProgress(session.section_id.clone()));
        }
        if !section.editable {
            return Err(LayoutError::NotEditable(section.id.clone()));
        }
        let (origin_x, origin_y) = self.pixel_origin(section.position);
        self.state = DragState::Dragging(DragSession {
            section_id: section.id.clone(),
            offset_x: x - origin_x,
            offset_y: y - origin_y,
            origin: section.position,
            current: section.position,
        });
        tracing::debug!("Drag started for section {} at {}", section.id, section.position);
        Ok(())
    }

    /// Follow the pointer to `(x, y)`.
    ///
    /// Snaps the dragged section to the nearest free cell and returns it.
    /// Returns `None` when idle or when no cell is free; the section then
    /// keeps its last snapped position.
    pub fn pointer_move(
        &mut self,
        x: f32,
        y: f32,
        sections: &mut [Section],
        occupancy: &OccupancyMap,
    ) -> Option<GridPosition> {
        let DragState::Dragging(session) = &mut self.state else {
            return None;
        };
        let section = sections.iter_mut().find(|s| s.id == session.section_id)?;
        let col = ((x - session.offset_x) / self.cell.width).floor().max(0.0);
        let row = ((y - session.offset_y) / self.cell.height).floor().max(0.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (row, col) = (row as usize, col as usize);

        let snapped = PlacementSolver::new(occupancy).find_nearest_free(
            row,
            col,
            section.size,
            Some(&session.section_id),
        )?;
        section.position = snapped;
        session.current = snapped;
        Some(snapped)
    }

    /// Release the pointer, committing the last snapped position.
    pub fn pointer_up(&mut self) -> Option<DragOutcome> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => {
                tracing::debug!(
                    "Drag finished for section {}: {} -> {}",
                    session.section_id,
                    session.origin,
                    session.current
                );
                Some(DragOutcome {
                    section_id: session.section_id,
                    from: session.origin,
                    to: session.current,
                })
            }
            DragState::Idle => None,
        }
    }

    /// Focus loss: finalizes exactly like [`DragController::pointer_up`].
    pub fn blur(&mut self) -> Option<DragOutcome> {
        self.pointer_up()
    }

    /// Forget a drag whose section disappeared.
    pub fn forget(&mut self, id: &SectionId) {
        if self.active_section() == Some(id) {
            self.state = DragState::Idle;
        }
    }
}
