use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::inspect::DEFAULT_PREVIEW_ROWS;
use crate::data::loader::{LoaderOptions, DEFAULT_MAX_UPLOAD_BYTES};
use crate::data::FileFormat;

/// Environment variable naming an optional JSON settings file.
pub const CONFIG_ENV: &str = "DATA_SWEEPER_CONFIG";

/// User-tunable settings. Every field has a default, so a settings file
/// only needs the keys it changes:
///
/// ```json
/// { "preview_rows": 10, "default_export": "xlsx" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweeperConfig {
    /// Rows shown in the preview grid.
    pub preview_rows: usize,
    /// Uploads above this size are rejected before parsing.
    pub max_upload_bytes: usize,
    /// Preselected conversion target. `None` picks the format the file
    /// was not loaded in.
    pub default_export: Option<FileFormat>,
    /// Height of the chart area in points.
    pub chart_height: f32,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            default_export: None,
            chart_height: 280.0,
        }
    }
}

impl SweeperConfig {
    /// Read settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Settings from the file named by [`CONFIG_ENV`], or defaults when the
    /// variable is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let config = Self::from_file(Path::new(&path))?;
                log::info!("Loaded settings from {}", Path::new(&path).display());
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            max_upload_bytes: self.max_upload_bytes,
        }
    }

    /// Conversion target preselected for a file loaded as `source`.
    pub fn export_target(&self, source: FileFormat) -> FileFormat {
        self.default_export.unwrap_or(source.alternate())
    }
}
