//! The per-menu layout configuration owned by a designer session.

use serde::{Deserialize, Serialize};

use crate::section::{Section, SectionId};
use crate::theme::StyleTokens;

/// How the renderer arranges items inside item sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutType {
    /// One item per row.
    List,
    /// Items in a `columns`-wide grid.
    #[default]
    Grid,
}

/// Default number of item columns for grid layouts.
pub const DEFAULT_COLUMNS: usize = 2;

/// A menu's complete layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Item arrangement.
    pub layout_type: LayoutType,
    /// Item columns for grid layouts, at least 1.
    pub columns: usize,
    /// Global style tokens.
    pub theme: StyleTokens,
    /// Sections in insertion order.
    pub sections: Vec<Section>,
    /// Menu this layout belongs to.
    pub menu_key: String,
    /// Monotonic save version.
    pub version: u64,
}

impl LayoutConfig {
    /// Create the empty layout used on first visit to a menu.
    #[must_use]
    pub fn new(menu_key: impl Into<String>) -> Self {
        Self {
            layout_type: LayoutType::default(),
            columns: DEFAULT_COLUMNS,
            theme: StyleTokens::default(),
            sections: Vec::new(),
            menu_key: menu_key.into(),
            version: 0,
        }
    }

    /// Deep copy under a new menu key, starting a fresh version history.
    #[must_use]
    pub fn duplicate(&self, menu_key: impl Into<String>) -> Self {
        Self {
            menu_key: menu_key.into(),
            version: 0,
            ..self.clone()
        }
    }

    /// Look up a section.
    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    /// Look up a section mutably.
    pub fn section_mut(&mut self, id: &SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| &s.id == id)
    }

    /// User-authored sections.
    pub fn custom_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.editable)
    }

    /// Reconciler-owned sections.
    pub fn structural_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| !s.editable)
    }

    /// Item columns clamped to at least one.
    #[must_use]
    pub fn effective_columns(&self) -> usize {
        self.columns.max(1)
    }
}
