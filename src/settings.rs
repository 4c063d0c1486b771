use crate::diagram::model::{Color, DrawMode, StrokeStyle, DEFAULT_STROKE_WIDTH};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for the chart tool, stored as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSettings {
    /// Folder holding one JSON file per chart. Falls back to the platform
    /// data directory when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Folder with `<view>.png` silhouettes. The built-in outlines are used
    /// when unset.
    #[serde(default)]
    pub asset_dir: Option<PathBuf>,
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
    #[serde(default)]
    pub default_mode: DrawMode,
    #[serde(default = "default_color")]
    pub default_color: Color,
    #[serde(default = "default_width")]
    pub default_width: f32,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_canvas_width() -> u32 {
    300
}

fn default_canvas_height() -> u32 {
    600
}

fn default_color() -> Color {
    Color::RED
}

fn default_width() -> f32 {
    DEFAULT_STROKE_WIDTH
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            asset_dir: None,
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            default_mode: DrawMode::default(),
            default_color: default_color(),
            default_width: default_width(),
            debug_logging: false,
            log_file: None,
        }
    }
}

impl ChartSettings {
    pub fn sanitize(&mut self) {
        self.canvas_width = self.canvas_width.max(1);
        self.canvas_height = self.canvas_height.max(1);
        if !self.default_width.is_finite() || self.default_width <= 0.0 {
            self.default_width = default_width();
        }
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle::new(self.default_mode, self.default_color, self.default_width)
    }

    /// The chart folder, either configured or under the platform data directory.
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs_next::data_dir().map(|dir| dir.join("body-chart").join("charts")))
    }
}
