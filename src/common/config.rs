use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout_engine::EngineSettings;
use crate::layout_engine::grid::{self, MAX_GRID_DIMENSION, dp_to_px};
use crate::layout_engine::gesture::DEFAULT_RESIZE_HANDLE_SIZE;
use crate::model::{Insets, PixelSize};
use crate::sys::canvas::FixedCanvas;

fn home_dir() -> PathBuf { dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")) }

pub fn data_dir() -> PathBuf { home_dir().join(".homegrid") }
pub fn config_file() -> PathBuf { home_dir().join(".homegrid.toml") }

pub const LAYOUT_FILE: &str = "layout.ron";
pub const PROVIDERS_FILE: &str = "providers.ron";

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub grid: GridSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub interaction: InteractionSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct GridSettings {
    #[serde(default = "default_columns")]
    pub columns: u32,
    #[serde(default = "default_rows")]
    pub rows: u32,
    /// Padding inside the safe area, in dp.
    #[serde(default = "default_padding_dp")]
    pub padding_dp: f64,
    /// Constant cell size in px. Insets and padding are ignored when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_size: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct DisplaySettings {
    /// px per dp for provider minimum sizes.
    #[serde(default = "default_density")]
    pub density: f64,
    /// px per dp for the grid padding.
    #[serde(default = "default_padding_scale")]
    pub padding_scale: f64,
    #[serde(default = "default_canvas_width")]
    pub canvas_width: f64,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: f64,
    #[serde(default)]
    pub insets: Insets,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct InteractionSettings {
    /// Side of the bottom-right resize handle, in px. On widgets smaller
    /// than twice this size the handle shrinks to half the widget.
    #[serde(default = "default_resize_handle_size")]
    pub resize_handle_size: f64,
    #[serde(default = "no")]
    pub start_in_edit_mode: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct StorageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            rows: default_rows(),
            padding_dp: default_padding_dp(),
            cell_size: None,
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            density: default_density(),
            padding_scale: default_padding_scale(),
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            insets: Insets::ZERO,
        }
    }
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            resize_handle_size: default_resize_handle_size(),
            start_in_edit_mode: no(),
        }
    }
}

impl GridSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !(1..=MAX_GRID_DIMENSION).contains(&self.columns) {
            issues.push(format!(
                "grid.columns must be between 1 and {MAX_GRID_DIMENSION}, got {}",
                self.columns
            ));
        }
        if !(1..=MAX_GRID_DIMENSION).contains(&self.rows) {
            issues.push(format!(
                "grid.rows must be between 1 and {MAX_GRID_DIMENSION}, got {}",
                self.rows
            ));
        }
        if !(self.padding_dp >= 0.0) {
            issues.push(format!("grid.padding_dp must be non-negative, got {}", self.padding_dp));
        }
        if let Some(cell) = self.cell_size {
            if !(cell > 0.0) {
                issues.push(format!("grid.cell_size must be positive, got {cell}"));
            }
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.columns == 0 {
            self.columns = default_columns();
            fixes += 1;
        } else if self.columns > MAX_GRID_DIMENSION {
            self.columns = MAX_GRID_DIMENSION;
            fixes += 1;
        }
        if self.rows == 0 {
            self.rows = default_rows();
            fixes += 1;
        } else if self.rows > MAX_GRID_DIMENSION {
            self.rows = MAX_GRID_DIMENSION;
            fixes += 1;
        }
        if !(self.padding_dp >= 0.0) {
            self.padding_dp = default_padding_dp();
            fixes += 1;
        }
        if self.cell_size.is_some_and(|cell| !(cell > 0.0)) {
            self.cell_size = None;
            fixes += 1;
        }

        fixes
    }
}

impl DisplaySettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !(self.density > 0.0) {
            issues.push(format!("display.density must be positive, got {}", self.density));
        }
        if !(self.padding_scale > 0.0) {
            issues.push(format!(
                "display.padding_scale must be positive, got {}",
                self.padding_scale
            ));
        }
        if !(self.canvas_width > 0.0) || !(self.canvas_height > 0.0) {
            issues.push(format!(
                "display canvas must be positive, got {}x{}",
                self.canvas_width, self.canvas_height
            ));
        }
        let insets = self.insets;
        if [insets.top, insets.left, insets.bottom, insets.right].iter().any(|v| !(*v >= 0.0)) {
            issues.push(format!("display.insets must be non-negative, got {insets:?}"));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if !(self.density > 0.0) {
            self.density = default_density();
            fixes += 1;
        }
        if !(self.padding_scale > 0.0) {
            self.padding_scale = default_padding_scale();
            fixes += 1;
        }
        if !(self.canvas_width > 0.0) {
            self.canvas_width = default_canvas_width();
            fixes += 1;
        }
        if !(self.canvas_height > 0.0) {
            self.canvas_height = default_canvas_height();
            fixes += 1;
        }
        for edge in [
            &mut self.insets.top,
            &mut self.insets.left,
            &mut self.insets.bottom,
            &mut self.insets.right,
        ] {
            if !(*edge >= 0.0) {
                *edge = 0.0;
                fixes += 1;
            }
        }

        fixes
    }
}

impl InteractionSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !(self.resize_handle_size > 0.0) {
            issues.push(format!(
                "interaction.resize_handle_size must be positive, got {}",
                self.resize_handle_size
            ));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        if self.resize_handle_size > 0.0 {
            return 0;
        }
        self.resize_handle_size = default_resize_handle_size();
        1
    }
}

fn no() -> bool { false }

fn default_columns() -> u32 { grid::DEFAULT_COLUMNS }

fn default_rows() -> u32 { grid::DEFAULT_ROWS }

fn default_padding_dp() -> f64 { grid::DEFAULT_PADDING_DP }

fn default_density() -> f64 { 1.0 }

fn default_padding_scale() -> f64 { grid::DEFAULT_PADDING_SCALE }

fn default_canvas_width() -> f64 { 1080.0 }

fn default_canvas_height() -> f64 { 2340.0 }

fn default_resize_handle_size() -> f64 { DEFAULT_RESIZE_HANDLE_SIZE }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// Reads `path` if it exists, otherwise the built-in defaults.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Self::default() }
    }

    pub fn default() -> anyhow::Result<Config> {
        Self::parse(include_str!("../../homegrid.default.toml"))
    }

    /// Save the current config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        issues.extend(self.grid.validate());
        issues.extend(self.display.validate());
        issues.extend(self.interaction.validate());

        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        self.grid.auto_fix_values()
            + self.display.auto_fix_values()
            + self.interaction.auto_fix_values()
    }

    pub fn data_dir(&self) -> PathBuf { self.storage.data_dir.clone().unwrap_or_else(data_dir) }

    pub fn layout_file(&self) -> PathBuf { self.data_dir().join(LAYOUT_FILE) }

    pub fn providers_file(&self) -> PathBuf { self.data_dir().join(PROVIDERS_FILE) }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            columns: self.grid.columns,
            rows: self.grid.rows,
            padding: dp_to_px(self.grid.padding_dp, self.display.padding_scale),
            fixed_cell_size: self.grid.cell_size,
            resize_handle_size: self.interaction.resize_handle_size,
        }
    }

    pub fn canvas(&self) -> FixedCanvas {
        FixedCanvas::new(
            PixelSize::new(self.display.canvas_width, self.display.canvas_height),
            self.display.insets,
        )
    }

    fn parse(buf: &str) -> anyhow::Result<Config> { Ok(toml::from_str(buf)?) }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default().unwrap();
        assert!(config.validate().is_empty());
        assert_eq!(config.grid, GridSettings::default());
        assert_eq!(config.display.insets, Insets::new(63.0, 0.0, 126.0, 0.0));
    }

    #[test]
    fn engine_settings_convert_padding() {
        let settings = Config::default().unwrap().engine_settings();
        assert_eq!(settings, EngineSettings {
            padding: 24.0,
            ..EngineSettings::default()
        });
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = Config::parse("[grid]\ncolumns = 4\n").unwrap();
        assert_eq!(config.grid.columns, 4);
        assert_eq!(config.grid.rows, 10);
        assert_eq!(config.interaction, InteractionSettings::default());
        assert_eq!(config.storage.data_dir, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::parse("[grid]\ncolums = 4\n").is_err());
    }

    #[test]
    fn invalid_values_are_reported_and_fixed() {
        let mut config = Config::parse(
            r#"
            [grid]
            columns = 0
            padding_dp = -4.0
            cell_size = 0.0

            [display]
            density = 0.0

            [display.insets]
            top = -1.0

            [interaction]
            resize_handle_size = -80.0
            "#,
        )
        .unwrap();
        assert_eq!(config.validate().len(), 6);

        assert_eq!(config.auto_fix_values(), 6);
        assert!(config.validate().is_empty());
        assert_eq!(config.grid.columns, 5);
        assert_eq!(config.grid.cell_size, None);
        assert_eq!(config.display.insets.top, 0.0);
    }

    #[test]
    fn oversized_grid_is_capped() {
        let mut config = Config::parse("[grid]\ncolumns = 4000000000\nrows = 500\n").unwrap();
        assert_eq!(config.validate().len(), 2);
        assert_eq!(config.auto_fix_values(), 2);
        assert_eq!((config.grid.columns, config.grid.rows), (100, 100));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("homegrid.toml");
        let mut config = Config::default().unwrap();
        config.grid.cell_size = Some(120.0);
        config.storage.data_dir = Some(dir.path().join("data"));
        config.save(&path).unwrap();

        let read = Config::read(&path).unwrap();
        assert_eq!(read, config);
        assert_eq!(read.layout_file(), dir.path().join("data").join(LAYOUT_FILE));
    }

    #[test]
    fn read_or_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::read_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default().unwrap());
    }
}
