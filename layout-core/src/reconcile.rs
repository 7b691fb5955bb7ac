//! Synchronises generated sections with the live catalog.
//!
//! ## Modes
//!
//! ```text
//! no editable sections      -> Initial: drop and regenerate every structural section
//! >= 1 editable section     -> Steady:  prune stale, add missing, never move custom content
//! ```
//!
//! Placement goes through [`PlacementSolver`], so the same catalog and
//! section list always produce the same result.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::catalog::{CatalogSnapshot, Category, CategoryId};
use crate::error::LayoutResult;
use crate::grid::{GridDimensions, OccupancyMap};
use crate::layout::LayoutType;
use crate::section::{GridPosition, GridSize, Section, SectionId, SectionKind};
use crate::solver::PlacementSolver;

/// Which reconciliation policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    /// Nothing user-authored yet; regenerate the whole structure.
    Initial,
    /// User content exists; only add and prune.
    Steady,
}

impl ReconcileMode {
    /// Derive the mode from the current section list.
    #[must_use]
    pub fn detect(sections: &[Section]) -> Self {
        if sections.iter().any(|s| s.editable) {
            Self::Steady
        } else {
            Self::Initial
        }
    }

    /// Whether the layout already holds user content.
    #[must_use]
    pub const fn initialized(self) -> bool {
        matches!(self, Self::Steady)
    }
}

/// What a reconciliation pass changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Policy that was applied.
    pub mode: ReconcileMode,
    /// Structural sections that did not exist before.
    pub added: Vec<SectionId>,
    /// Structural sections that no longer exist.
    pub pruned: Vec<SectionId>,
    /// Categories that could not be placed for lack of room.
    pub unplaced: Vec<CategoryId>,
}

impl ReconcileReport {
    /// Whether the pass changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.pruned.is_empty()
    }
}

/// Keeps structural sections in line with the catalog.
#[derive(Debug, Clone, Copy)]
pub struct SectionReconciler {
    dims: GridDimensions,
}

impl SectionReconciler {
    /// Create a reconciler for a grid.
    #[must_use]
    pub const fn new(dims: GridDimensions) -> Self {
        Self { dims }
    }

    /// Header footprint: one row across the grid.
    #[must_use]
    pub const fn header_size(&self) -> GridSize {
        GridSize::new(1, self.dims.cols)
    }

    /// Items footprint for a category with `item_count` items.
    #[must_use]
    pub fn items_size(
        &self,
        layout_type: LayoutType,
        columns: usize,
        item_count: usize,
    ) -> GridSize {
        let rows = match layout_type {
            LayoutType::Grid => item_count.div_ceil(columns.max(1)),
            LayoutType::List => item_count,
        };
        GridSize::new(rows.clamp(1, self.dims.rows), self.dims.cols)
    }

    /// Reconcile `sections` against `snapshot` in place.
    ///
    /// Returns the report and the rebuilt occupancy map.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LayoutError::MalformedSection`] if an existing section
    /// does not fit the grid; callers normalise sections beforehand.
    pub fn reconcile(
        &self,
        sections: &mut Vec<Section>,
        snapshot: &CatalogSnapshot,
        layout_type: LayoutType,
        columns: usize,
    ) -> LayoutResult<(ReconcileReport, OccupancyMap)> {
        let mode = ReconcileMode::detect(sections);
        let before: BTreeSet<SectionId> = sections
            .iter()
            .filter(|s| !s.editable)
            .map(|s| s.id.clone())
            .collect();

        match mode {
            ReconcileMode::Initial => sections.retain(|s| s.editable),
            ReconcileMode::Steady => {
                // First header and first items section per category win.
                let mut seen: HashSet<(CategoryId, SectionKind)> = HashSet::new();
                sections.retain(|s| {
                    if s.editable {
                        return true;
                    }
                    let Some(category_id) = s
                        .category_id
                        .as_ref()
                        .filter(|id| snapshot.contains(id))
                    else {
                        tracing::debug!("Pruning stale structural section {}", s.id);
                        return false;
                    };
                    if s.kind.is_structural() && !seen.insert((category_id.clone(), s.kind)) {
                        tracing::debug!(
                            "Pruning duplicate {} section {} of category {category_id}",
                            s.kind.as_str(),
                            s.id
                        );
                        return false;
                    }
                    true
                });
            }
        }

        self.refresh_existing(sections, snapshot, layout_type, columns)?;

        let mut map = OccupancyMap::rebuild(self.dims, sections)?;
        let mut unplaced = Vec::new();
        for category in snapshot.categories() {
            let item_count = snapshot.item_count(&category.id);
            let items_size = self.items_size(layout_type, columns, item_count);
            if !self.ensure_category(sections, &mut map, category, items_size)? {
                tracing::warn!(
                    "No room for category '{}' ({}) on the {}x{} grid",
                    category.name,
                    category.id,
                    self.dims.rows,
                    self.dims.cols
                );
                unplaced.push(category.id.clone());
            }
        }

        let after: BTreeSet<SectionId> = sections
            .iter()
            .filter(|s| !s.editable)
            .map(|s| s.id.clone())
            .collect();
        let report = ReconcileReport {
            mode,
            added: after.difference(&before).cloned().collect(),
            pruned: before.difference(&after).cloned().collect(),
            unplaced,
        };
        tracing::debug!(
            "Reconciled {:?}: {} added, {} pruned, {} unplaced",
            report.mode,
            report.added.len(),
            report.pruned.len(),
            report.unplaced.len()
        );
        Ok((report, map))
    }

    /// Refresh header text and item footprints of surviving structural sections.
    ///
    /// Positions never change; an items section only grows or shrinks when
    /// the new footprint fits where it already is.
    fn refresh_existing(
        &self,
        sections: &mut [Section],
        snapshot: &CatalogSnapshot,
        layout_type: LayoutType,
        columns: usize,
    ) -> LayoutResult<()> {
        for section in sections.iter_mut().filter(|s| s.kind == SectionKind::Category) {
            let Some(category) = section
                .category_id
                .as_ref()
                .and_then(|id| snapshot.category(id))
            else {
                continue;
            };
            if section.title.as_deref() != Some(category.name.as_str()) {
                section.title = Some(category.name.clone());
            }
            if let Some(content) = section.content.as_mut() {
                if content.text != category.name {
                    content.text.clone_from(&category.name);
                }
            }
        }

        let map = OccupancyMap::rebuild(self.dims, sections)?;
        let solver = PlacementSolver::new(&map);
        let mut resized = Vec::new();
        for section in sections.iter().filter(|s| s.kind == SectionKind::Items && !s.editable) {
            let Some(category_id) = section.category_id.as_ref() else {
                continue;
            };
            let wanted = self.items_size(layout_type, columns, snapshot.item_count(category_id));
            if wanted != section.size
                && solver.can_place(
                    section.position.row,
                    section.position.col,
                    wanted,
                    Some(&section.id),
                )
            {
                resized.push((section.id.clone(), wanted));
            }
        }
        // Resizes are checked against the pre-resize map; apply one at a time
        // so two growing sections cannot claim the same free rows.
        for (id, wanted) in resized {
            let map = OccupancyMap::rebuild(self.dims, sections)?;
            let solver = PlacementSolver::new(&map);
            if let Some(section) = sections.iter_mut().find(|s| s.id == id) {
                if solver.can_place(section.position.row, section.position.col, wanted, Some(&id)) {
                    section.size = wanted;
                }
            }
        }
        Ok(())
    }

    /// Make sure a category has a header and an items section.
    ///
    /// Returns `false` when the category could not be placed; any header
    /// added during this call is withdrawn again.
    fn ensure_category(
        &self,
        sections: &mut Vec<Section>,
        map: &mut OccupancyMap,
        category: &Category,
        items_size: GridSize,
    ) -> LayoutResult<bool> {
        let owned_by = |s: &Section, kind: SectionKind| {
            !s.editable && s.kind == kind && s.category_id.as_ref() == Some(&category.id)
        };
        let existing_header = sections
            .iter()
            .find(|s| owned_by(s, SectionKind::Category))
            .cloned();
        let has_items = sections.iter().any(|s| owned_by(s, SectionKind::Items));
        if existing_header.is_some() && has_items {
            return Ok(true);
        }

        let header_size = self.header_size();
        let mut added_header = None;
        let (header_pos, header_span) = if let Some(header) = existing_header {
            (header.position, header.size)
        } else {
            let Some(pos) = PlacementSolver::new(map).find_nearest_free(0, 0, header_size, None)
            else {
                return Ok(false);
            };
            let header = Section::category_header(&category.id, &category.name)
                .at(pos)
                .with_size(header_size);
            added_header = Some(header.id.clone());
            sections.push(header);
            *map = OccupancyMap::rebuild(self.dims, sections)?;
            (pos, header_size)
        };

        if !has_items {
            let target = GridPosition::new(header_pos.row + header_span.row_span, header_pos.col);
            let found = PlacementSolver::new(map).find_nearest_free(
                target.row,
                target.col,
                items_size,
                None,
            );
            let Some(pos) = found else {
                if let Some(header_id) = added_header {
                    sections.retain(|s| s.editable || s.id != header_id);
                    *map = OccupancyMap::rebuild(self.dims, sections)?;
                }
                return Ok(false);
            };
            sections.push(
                Section::category_items(&category.id)
                    .at(pos)
                    .with_size(items_size),
            );
            *map = OccupancyMap::rebuild(self.dims, sections)?;
        }
        Ok(true)
    }
}
