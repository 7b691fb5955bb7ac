//! # Menu Layout Core
//!
//! Grid placement engine behind the menu designer. Sections of a menu page
//! live on a fixed grid; the engine keeps them inside the grid, never lets
//! two of them share a cell, derives category sections from the catalog and
//! persists the result.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                LayoutEngine                 │
//! ├─────────────────────────────────────────────┤
//! │  Grid             │  Catalog                │
//! │  - OccupancyMap   │  - SectionReconciler    │
//! │  - PlacementSolver│  - CatalogProvider      │
//! │  - DragController │  - RenderModel          │
//! ├─────────────────────────────────────────────┤
//! │  Style            │  Persistence            │
//! │  - StyleTokens    │  - LayoutDocument       │
//! │  - ThemeApplier   │  - LayoutStore          │
//! │                   │  - DebouncedSaver       │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod drag;
pub mod engine;
pub mod error;
pub mod grid;
pub mod layout;
pub mod persistence;
pub mod reconcile;
pub mod render;
pub mod section;
pub mod solver;
pub mod theme;

pub use catalog::{
    CatalogItem, CatalogProvider, CatalogSnapshot, Category, CategoryId, MemoryCatalog,
};
pub use config::{CellSize, EngineConfig};
pub use drag::{DragController, DragOutcome, DragSession, DragState};
pub use engine::LayoutEngine;
pub use error::{LayoutError, LayoutResult, PersistenceError, PersistenceResult};
pub use grid::{CellConflict, GridCell, GridDimensions, OccupancyMap};
pub use layout::{LayoutConfig, LayoutType, DEFAULT_COLUMNS};
pub use persistence::{
    DebouncedSaver, FileLayoutStore, LayoutDocument, LayoutStore, MemoryLayoutStore,
};
pub use reconcile::{ReconcileMode, ReconcileReport, SectionReconciler};
pub use render::{RenderModel, RenderSection};
pub use section::{
    GridPosition, GridSize, Section, SectionContent, SectionId, SectionKind, TextAlignment,
};
pub use solver::{check_fits, PlacementSolver};
pub use theme::{StyleTokens, ThemeApplier};

/// Layout core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
