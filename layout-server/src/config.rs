//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use layout_core::{CellSize, EngineConfig, GridDimensions, LayoutResult};

/// Default port for the designer server.
pub const DEFAULT_PORT: u16 = 9474;

/// Command-line arguments for menu-designer.
#[derive(Debug, Clone, Parser)]
#[command(name = "menu-designer")]
#[command(about = "Menu layout designer server")]
#[command(version)]
pub struct CliArgs {
    /// Port to listen on (localhost only)
    #[arg(long, env = "MENU_DESIGNER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory for layout documents and catalog files
    #[arg(long, env = "MENU_DESIGNER_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Grid rows
    #[arg(long, env = "MENU_DESIGNER_GRID_ROWS", default_value_t = 12)]
    pub grid_rows: usize,

    /// Grid columns
    #[arg(long, env = "MENU_DESIGNER_GRID_COLS", default_value_t = 4)]
    pub grid_cols: usize,

    /// Cell width in pixels
    #[arg(long, env = "MENU_DESIGNER_CELL_WIDTH", default_value_t = 120.0)]
    pub cell_width: f32,

    /// Cell height in pixels
    #[arg(long, env = "MENU_DESIGNER_CELL_HEIGHT", default_value_t = 80.0)]
    pub cell_height: f32,

    /// Quiet period before edits are saved, in milliseconds
    #[arg(long, env = "MENU_DESIGNER_SAVE_DEBOUNCE_MS", default_value_t = 750)]
    pub save_debounce_ms: u64,

    /// How often the background flusher looks for due saves, in milliseconds
    #[arg(long, env = "MENU_DESIGNER_FLUSH_INTERVAL_MS", default_value_t = 250)]
    pub flush_interval_ms: u64,
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port.
    pub port: u16,
    /// Data directory.
    pub data_dir: PathBuf,
    /// Engine settings for every session.
    pub engine: EngineConfig,
    /// Background flusher period.
    pub flush_interval: Duration,
}

impl ServerConfig {
    /// Build and validate a configuration from parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns [`layout_core::LayoutError::InvalidConfig`] for an unusable grid,
    /// cell size or flush interval.
    pub fn from_args(args: CliArgs) -> LayoutResult<Self> {
        let engine = EngineConfig {
            grid: GridDimensions::new(args.grid_rows, args.grid_cols),
            cell: CellSize {
                width: args.cell_width,
                height: args.cell_height,
            },
            save_debounce_ms: args.save_debounce_ms,
        };
        engine.validate()?;
        if args.flush_interval_ms == 0 {
            return Err(layout_core::LayoutError::InvalidConfig(
                "flush interval must be positive".to_string(),
            ));
        }
        Ok(Self {
            port: args.port,
            data_dir: args.data_dir,
            engine,
            flush_interval: Duration::from_millis(args.flush_interval_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["menu-designer"]);
        let config = ServerConfig::from_args(args).expect("valid");
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.flush_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_overrides() {
        let args = CliArgs::parse_from([
            "menu-designer",
            "--port",
            "8099",
            "--grid-rows",
            "20",
            "--grid-cols",
            "6",
            "--save-debounce-ms",
            "100",
        ]);
        let config = ServerConfig::from_args(args).expect("valid");
        assert_eq!(config.port, 8099);
        assert_eq!(config.engine.grid, GridDimensions::new(20, 6));
        assert_eq!(config.engine.save_debounce_ms, 100);
    }

    #[test]
    fn test_rejects_empty_grid() {
        let args = CliArgs::parse_from(["menu-designer", "--grid-cols", "0"]);
        assert!(ServerConfig::from_args(args).is_err());
    }
}
