//! The layout engine: one designer session over one menu layout.
//!
//! The engine exclusively owns the in-memory [`LayoutConfig`] while the
//! session is open. Every mutation goes through the same commit path:
//! rebuild occupancy, bump the version, schedule a debounced save.

use crate::catalog::{CatalogProvider, CatalogSnapshot};
use crate::config::EngineConfig;
use crate::drag::{DragController, DragOutcome, DragState};
use crate::error::{LayoutError, LayoutResult};
use crate::grid::{GridDimensions, OccupancyMap};
use crate::layout::{LayoutConfig, LayoutType};
use crate::persistence::{DebouncedSaver, LayoutStore};
use crate::reconcile::{ReconcileReport, SectionReconciler};
use crate::render::RenderModel;
use crate::section::{GridPosition, GridSize, Section, SectionContent, SectionId, SectionKind};
use crate::solver::PlacementSolver;
use crate::theme::{StyleTokens, ThemeApplier};

/// A designer session over one menu layout.
#[derive(Debug)]
pub struct LayoutEngine<S> {
    config: EngineConfig,
    layout: LayoutConfig,
    occupancy: OccupancyMap,
    drag: DragController,
    saver: DebouncedSaver<S>,
    catalog: CatalogSnapshot,
}

impl<S: LayoutStore> LayoutEngine<S> {
    /// Start a session over an in-memory layout.
    ///
    /// Sections that leave the grid or overlap earlier sections are moved to
    /// the nearest free slot, or dropped when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidConfig`] if `config` is unusable.
    pub fn new(layout: LayoutConfig, store: S, config: EngineConfig) -> LayoutResult<Self> {
        config.validate()?;
        let mut layout = layout;
        layout.sections = normalize(config.grid, std::mem::take(&mut layout.sections))?;
        let occupancy = OccupancyMap::rebuild(config.grid, &layout.sections)?;
        Ok(Self {
            drag: DragController::new(config.cell),
            saver: DebouncedSaver::new(store, config.save_debounce()),
            config,
            layout,
            occupancy,
            catalog: CatalogSnapshot::default(),
        })
    }

    /// Load a menu's layout from `store`, or start an empty one on first visit.
    ///
    /// Reconciliation against the catalog is a separate step.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Persistence`] if the store cannot be read and
    /// [`LayoutError::InvalidConfig`] if `config` is unusable.
    pub async fn open(store: S, menu_key: &str, config: EngineConfig) -> LayoutResult<Self> {
        let layout = match store.load(menu_key).await? {
            Some(mut layout) => {
                if layout.menu_key != menu_key {
                    tracing::warn!(
                        "Stored layout for {menu_key} claims menu {}; using {menu_key}",
                        layout.menu_key
                    );
                    layout.menu_key = menu_key.to_string();
                }
                tracing::debug!(
                    "Loaded layout {menu_key} v{} with {} sections",
                    layout.version,
                    layout.sections.len()
                );
                layout
            }
            None => {
                tracing::info!("No stored layout for {menu_key}, starting empty");
                LayoutConfig::new(menu_key)
            }
        };
        Self::new(layout, store, config)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The current layout.
    #[must_use]
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Sections in order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.layout.sections
    }

    /// Look up a section.
    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.layout.section(id)
    }

    /// Occupancy as of the last commit.
    #[must_use]
    pub fn occupancy(&self) -> &OccupancyMap {
        &self.occupancy
    }

    /// Engine settings.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Grid extent.
    #[must_use]
    pub fn grid(&self) -> GridDimensions {
        self.config.grid
    }

    /// Drag state machine.
    #[must_use]
    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    /// Last catalog snapshot the layout was reconciled against.
    #[must_use]
    pub fn catalog(&self) -> &CatalogSnapshot {
        &self.catalog
    }

    /// Placement queries over the current occupancy.
    #[must_use]
    pub fn solver(&self) -> PlacementSolver<'_> {
        PlacementSolver::new(&self.occupancy)
    }

    // -----------------------------------------------------------------------
    // Catalog reconciliation
    // -----------------------------------------------------------------------

    /// Bring structural sections in line with `snapshot`.
    ///
    /// A drag still in progress is finalized first.
    ///
    /// # Errors
    ///
    /// Returns an error only if the section list is internally malformed.
    pub fn reconcile(&mut self, snapshot: CatalogSnapshot) -> LayoutResult<ReconcileReport> {
        if self.drag.is_dragging() {
            self.pointer_up()?;
        }
        let reconciler = SectionReconciler::new(self.config.grid);
        let mut sections = self.layout.sections.clone();
        let (report, occupancy) = reconciler.reconcile(
            &mut sections,
            &snapshot,
            self.layout.layout_type,
            self.layout.effective_columns(),
        )?;

        // Generated sections pick up the current theme.
        for section in sections.iter_mut().filter(|s| report.added.contains(&s.id)) {
            *section = ThemeApplier::apply(std::slice::from_ref(section), &self.layout.theme)
                .remove(0);
        }

        let changed = sections != self.layout.sections;
        self.layout.sections = sections;
        self.occupancy = occupancy;
        self.catalog = snapshot;
        if changed {
            self.commit()?;
        }
        Ok(report)
    }

    /// Fetch a fresh catalog snapshot and reconcile against it.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Persistence`] if the catalog cannot be read.
    pub async fn refresh_catalog(
        &mut self,
        provider: &dyn CatalogProvider,
    ) -> LayoutResult<ReconcileReport> {
        let snapshot = provider.snapshot(&self.layout.menu_key).await?;
        self.reconcile(snapshot)
    }

    // -----------------------------------------------------------------------
    // Section editing
    // -----------------------------------------------------------------------

    /// Add a user-authored section as close to `target` as possible.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidKind`] for structural kinds,
    /// [`LayoutError::BoundsViolation`] if `size` cannot fit the grid, and
    /// [`LayoutError::PlacementExhausted`] if there is no room.
    pub fn add_section(
        &mut self,
        kind: SectionKind,
        target: GridPosition,
        size: GridSize,
        content: SectionContent,
    ) -> LayoutResult<SectionId> {
        if kind.is_structural() {
            return Err(LayoutError::InvalidKind(format!(
                "{} sections are generated from the catalog",
                kind.as_str()
            )));
        }
        let position = self.solver().place(target, size, None)?;
        let section = Section::custom(kind, content).at(position).with_size(size);
        let id = section.id.clone();
        tracing::debug!("Adding {} section {id} at {position}", kind.as_str());
        self.layout.sections.push(section);
        self.commit()?;
        Ok(id)
    }

    /// Replace the visual content of a custom section.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::SectionNotFound`] or [`LayoutError::NotEditable`].
    pub fn update_content(&mut self, id: &SectionId, content: SectionContent) -> LayoutResult<()> {
        self.editable_mut(id)?.content = Some(content);
        self.commit()
    }

    /// Set or clear the designer label of a custom section.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::SectionNotFound`] or [`LayoutError::NotEditable`].
    pub fn set_title(&mut self, id: &SectionId, title: Option<String>) -> LayoutResult<()> {
        self.editable_mut(id)?.title = title;
        self.commit()
    }

    /// Move a custom section to the nearest free slot around `target`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::SectionNotFound`], [`LayoutError::NotEditable`]
    /// or [`LayoutError::PlacementExhausted`].
    pub fn move_section(
        &mut self,
        id: &SectionId,
        target: GridPosition,
    ) -> LayoutResult<GridPosition> {
        let size = self.editable_mut(id)?.size;
        let position = self.solver().place(target, size, Some(id))?;
        self.editable_mut(id)?.position = position;
        self.commit()?;
        Ok(position)
    }

    /// Change the footprint of a custom section.
    ///
    /// The section stays put when the new footprint fits there, otherwise it
    /// moves to the nearest slot that does.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::SectionNotFound`], [`LayoutError::NotEditable`],
    /// [`LayoutError::BoundsViolation`] or [`LayoutError::PlacementExhausted`].
    pub fn resize_section(&mut self, id: &SectionId, size: GridSize) -> LayoutResult<GridPosition> {
        let current = self.editable_mut(id)?.position;
        let position = self.solver().place(current, size, Some(id))?;
        let section = self.editable_mut(id)?;
        section.size = size;
        section.position = position;
        self.commit()?;
        Ok(position)
    }

    /// Remove a custom section.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::SectionNotFound`] or [`LayoutError::NotEditable`].
    pub fn delete_section(&mut self, id: &SectionId) -> LayoutResult<Section> {
        self.editable_mut(id)?;
        let index = self
            .layout
            .sections
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| LayoutError::SectionNotFound(id.clone()))?;
        let removed = self.layout.sections.remove(index);
        self.drag.forget(id);
        self.commit()?;
        Ok(removed)
    }

    /// Switch global style tokens and restyle every section.
    ///
    /// # Errors
    ///
    /// Returns an error only if the section list is internally malformed.
    pub fn set_theme(&mut self, tokens: StyleTokens) -> LayoutResult<()> {
        self.layout.sections = ThemeApplier::apply(&self.layout.sections, &tokens);
        self.layout.theme = tokens;
        self.commit()
    }

    /// Change how items are arranged.
    ///
    /// Structural footprints follow on the next reconciliation.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidConfig`] for zero columns.
    pub fn set_layout_type(&mut self, layout_type: LayoutType, columns: usize) -> LayoutResult<()> {
        if columns == 0 {
            return Err(LayoutError::InvalidConfig(
                "layout needs at least one column".to_string(),
            ));
        }
        self.layout.layout_type = layout_type;
        self.layout.columns = columns;
        self.commit()
    }

    // -----------------------------------------------------------------------
    // Drag
    // -----------------------------------------------------------------------

    /// Grab a custom section at pointer `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::SectionNotFound`], [`LayoutError::NotEditable`]
    /// or [`LayoutError::DragInProgress`].
    pub fn pointer_down(&mut self, id: &SectionId, x: f32, y: f32) -> LayoutResult<()> {
        let section = self
            .layout
            .section(id)
            .ok_or_else(|| LayoutError::SectionNotFound(id.clone()))?;
        self.drag.pointer_down(section, x, y)
    }

    /// Follow the pointer; returns the snapped cell if the section moved.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Option<GridPosition> {
        self.drag
            .pointer_move(x, y, &mut self.layout.sections, &self.occupancy)
    }

    /// Release the pointer and commit the last snapped position.
    ///
    /// # Errors
    ///
    /// Returns an error only if the section list is internally malformed.
    pub fn pointer_up(&mut self) -> LayoutResult<Option<DragOutcome>> {
        let outcome = self.drag.pointer_up();
        if outcome.as_ref().is_some_and(DragOutcome::moved) {
            self.commit()?;
        }
        Ok(outcome)
    }

    /// Focus lost; finalizes like [`LayoutEngine::pointer_up`].
    ///
    /// # Errors
    ///
    /// Returns an error only if the section list is internally malformed.
    pub fn blur(&mut self) -> LayoutResult<Option<DragOutcome>> {
        self.pointer_up()
    }

    // -----------------------------------------------------------------------
    // Projections
    // -----------------------------------------------------------------------

    /// Sections annotated with resolved catalog items.
    #[must_use]
    pub fn render_model(&self) -> RenderModel {
        RenderModel::build(&self.layout, self.config.grid, &self.catalog)
    }

    /// Deep copy of the layout under another menu key.
    #[must_use]
    pub fn duplicate(&self, menu_key: &str) -> LayoutConfig {
        self.layout.duplicate(menu_key)
    }

    /// Duplicate the layout and write the copy straight to the store.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Persistence`] if the copy cannot be saved.
    pub async fn save_duplicate(&self, menu_key: &str) -> LayoutResult<LayoutConfig> {
        let copy = self.duplicate(menu_key);
        self.saver.store().save(&copy).await?;
        tracing::info!("Duplicated layout {} into {menu_key}", self.layout.menu_key);
        Ok(copy)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Whether edits are waiting to be saved.
    #[must_use]
    pub fn has_pending_save(&self) -> bool {
        self.saver.has_pending()
    }

    /// Save if the debounce window has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Persistence`]; the in-memory layout is kept and
    /// the save stays pending.
    pub async fn flush_due(&mut self) -> LayoutResult<bool> {
        Ok(self.saver.flush_due().await?)
    }

    /// Save now, ignoring the debounce window.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Persistence`]; the in-memory layout is kept and
    /// the save stays pending.
    pub async fn flush(&mut self) -> LayoutResult<bool> {
        Ok(self.saver.flush().await?)
    }

    /// Drop unsaved edits from the save queue (closing without saving).
    pub fn discard_pending(&mut self) -> bool {
        self.saver.discard()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn editable_mut(&mut self, id: &SectionId) -> LayoutResult<&mut Section> {
        let section = self
            .layout
            .section_mut(id)
            .ok_or_else(|| LayoutError::SectionNotFound(id.clone()))?;
        if !section.editable {
            return Err(LayoutError::NotEditable(id.clone()));
        }
        Ok(section)
    }

    fn commit(&mut self) -> LayoutResult<()> {
        self.occupancy = OccupancyMap::rebuild(self.config.grid, &self.layout.sections)?;
        debug_assert!(self.occupancy.is_consistent(), "overlapping sections committed");
        self.layout.version += 1;
        self.saver.schedule(&self.layout);
        Ok(())
    }
}

/// Fit loaded sections onto the grid in order, relocating or dropping offenders.
fn normalize(dims: GridDimensions, sections: Vec<Section>) -> LayoutResult<Vec<Section>> {
    let mut accepted: Vec<Section> = Vec::with_capacity(sections.len());
    let mut map = OccupancyMap::empty(dims);
    for mut section in sections {
        let clamped = GridSize::new(
            section.size.row_span.clamp(1, dims.rows),
            section.size.col_span.clamp(1, dims.cols),
        );
        if clamped != section.size {
            tracing::warn!(
                "Section {} footprint {} clamped to {clamped}",
                section.id,
                section.size
            );
            section.size = clamped;
        }
        let solver = PlacementSolver::new(&map);
        match solver.find_nearest_free(
            section.position.row,
            section.position.col,
            section.size,
            None,
        ) {
            Some(position) => {
                if position != section.position {
                    tracing::warn!(
                        "Section {} moved from {} to {position} to resolve overlap",
                        section.id,
                        section.position
                    );
                    section.position = position;
                }
                accepted.push(section);
                map = OccupancyMap::rebuild(dims, &accepted)?;
            }
            None => {
                tracing::warn!("Dropping section {}: no room on the grid", section.id);
            }
        }
    }
    Ok(accepted)
}
