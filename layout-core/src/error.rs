//! Error types for layout operations.

use thiserror::Error;

use crate::section::{GridPosition, GridSize, SectionId};

/// Result type for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors that can occur in layout operations.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Footprint is larger than the grid and cannot be placed anywhere.
    #[error("Footprint {size} does not fit a {rows}x{cols} grid")]
    BoundsViolation {
        /// Requested footprint.
        size: GridSize,
        /// Grid rows.
        rows: usize,
        /// Grid columns.
        cols: usize,
    },

    /// No free cell exists for the footprint.
    #[error("No free slot for {size} near {target}")]
    PlacementExhausted {
        /// Requested footprint.
        size: GridSize,
        /// Where the search started.
        target: GridPosition,
    },

    /// A section handed to the grid model has an invalid footprint.
    #[error("Malformed section {id}: {reason}")]
    MalformedSection {
        /// Offending section.
        id: SectionId,
        /// What is wrong with it.
        reason: String,
    },

    /// Section not found in the layout.
    #[error("Section not found: {0}")]
    SectionNotFound(SectionId),

    /// Structural sections are owned by the reconciler.
    #[error("Section is not editable: {0}")]
    NotEditable(SectionId),

    /// A drag is already in progress.
    #[error("Drag already in progress for section {0}")]
    DragInProgress(SectionId),

    /// The operation does not accept this section kind.
    #[error("Invalid section kind: {0}")]
    InvalidKind(String),

    /// Invalid engine configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Persisting or loading the layout failed.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Errors raised by layout stores.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The stored document is not a layout at all.
    #[error("Malformed layout document: {0}")]
    MalformedConfig(String),

    /// No layout stored under this menu key.
    #[error("Layout not found: {0}")]
    NotFound(String),

    /// Another session saved a newer version first.
    #[error("Version conflict for {menu_key}: stored {stored}, attempted {attempted}")]
    VersionConflict {
        /// Menu whose save was rejected.
        menu_key: String,
        /// Version currently in the store.
        stored: u64,
        /// Version carried by the rejected save.
        attempted: u64,
    },
}

impl PersistenceError {
    /// Whether retrying the same save could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
