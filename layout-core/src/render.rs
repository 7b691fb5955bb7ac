//! Read-only projection consumed by the card/grid and mobile-preview renderers.

use serde::Serialize;

use crate::catalog::{CatalogItem, CatalogSnapshot};
use crate::grid::GridDimensions;
use crate::layout::{LayoutConfig, LayoutType};
use crate::section::{Section, SectionKind};
use crate::theme::StyleTokens;

/// A section with its catalog data resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSection {
    /// The section as stored.
    #[serde(flatten)]
    pub section: Section,
    /// Name of the linked category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// Available items of the linked category, for item sections.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<CatalogItem>,
}

/// Everything a renderer needs to draw a layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderModel {
    /// Menu being rendered.
    pub menu_key: String,
    /// Item arrangement.
    pub layout_type: LayoutType,
    /// Item columns.
    pub columns: usize,
    /// Style tokens.
    pub theme: StyleTokens,
    /// Grid extent.
    pub grid: GridDimensions,
    /// Layout version the model was built from.
    pub version: u64,
    /// Sections in row-major order of their top-left cell.
    pub sections: Vec<RenderSection>,
}

impl RenderModel {
    /// Project a layout against a catalog snapshot.
    #[must_use]
    pub fn build(layout: &LayoutConfig, grid: GridDimensions, catalog: &CatalogSnapshot) -> Self {
        let mut sections: Vec<RenderSection> = layout
            .sections
            .iter()
            .map(|section| {
                let category = section
                    .category_id
                    .as_ref()
                    .and_then(|id| catalog.category(id));
                let items = match (section.kind, category) {
                    (SectionKind::Items, Some(category)) => catalog
                        .items_in(&category.id)
                        .filter(|item| item.available)
                        .cloned()
                        .collect(),
                    _ => Vec::new(),
                };
                RenderSection {
                    section: section.clone(),
                    category_name: category.map(|c| c.name.clone()),
                    items,
                }
            })
            .collect();
        sections.sort_by_key(|s| (s.section.position.row, s.section.position.col));

        Self {
            menu_key: layout.menu_key.clone(),
            layout_type: layout.layout_type,
            columns: layout.columns,
            theme: layout.theme.clone(),
            grid,
            version: layout.version,
            sections,
        }
    }
}
