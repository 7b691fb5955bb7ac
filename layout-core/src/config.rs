//! Engine configuration: grid extent, cell pixel size, save debounce.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};
use crate::grid::GridDimensions;

/// Pixel size of one grid cell, used to snap pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    /// Cell width in pixels.
    pub width: f32,
    /// Cell height in pixels.
    pub height: f32,
}

impl Default for CellSize {
    fn default() -> Self {
        Self {
            width: 120.0,
            height: 80.0,
        }
    }
}

/// Settings shared by every designer session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grid extent.
    pub grid: GridDimensions,
    /// Pixel size of one cell.
    pub cell: CellSize,
    /// Quiet period before a pending save is written, in milliseconds.
    pub save_debounce_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid: GridDimensions::default(),
            cell: CellSize::default(),
            save_debounce_ms: 750,
        }
    }
}

impl EngineConfig {
    /// Trailing debounce window.
    #[must_use]
    pub const fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    /// Check the configuration for values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidConfig`] for an empty grid or a
    /// non-positive cell size.
    pub fn validate(&self) -> LayoutResult<()> {
        if self.grid.rows == 0 || self.grid.cols == 0 {
            return Err(LayoutError::InvalidConfig(format!(
                "grid must have at least one row and column, got {}x{}",
                self.grid.rows, self.grid.cols
            )));
        }
        if !(self.cell.width > 0.0 && self.cell.height > 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "cell size must be positive, got {}x{}",
                self.cell.width, self.cell.height
            )));
        }
        Ok(())
    }
}
