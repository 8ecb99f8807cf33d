//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use schedviz_core::{Palette, Point, UniformGraph};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Geometry of the task row the intervals are drawn on.
    #[serde(default)]
    pub graph: GraphConfig,
    /// Interval colors.
    #[serde(default)]
    pub colors: Palette,
}

/// Geometry of a task graph row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Number of time columns.
    pub bin_count: usize,
    /// Pixels per column.
    pub bin_width: i32,
    /// Pixels per task row.
    pub row_height: i32,
    pub origin_x: i32,
    /// Baseline of the task row.
    pub origin_y: i32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            bin_count: 100,
            bin_width: 4,
            row_height: 40,
            origin_x: 0,
            origin_y: 40,
        }
    }
}

impl GraphConfig {
    pub const fn graph(&self) -> UniformGraph {
        UniformGraph::new(
            Point::new(self.origin_x, self.origin_y),
            self.bin_width,
            self.row_height,
            self.bin_count,
        )
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (SCHEDVIZ_GRAPH__BIN_COUNT, ...)
        figment = figment.merge(Env::prefixed("SCHEDVIZ_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for schedviz.
///
/// On Linux: `~/.config/schedviz`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("schedviz"))
}
