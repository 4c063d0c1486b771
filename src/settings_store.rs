use crate::settings::ChartSettings;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "body_chart_settings.json";

pub fn default_settings_path() -> Result<PathBuf> {
    let config_dir =
        dirs_next::config_dir().ok_or_else(|| anyhow!("no platform config directory"))?;
    Ok(config_dir.join("body-chart").join(SETTINGS_FILE_NAME))
}

/// A missing or blank file yields the defaults.
pub fn load_from_path(settings_path: &Path) -> Result<ChartSettings> {
    if !settings_path.exists() {
        return Ok(ChartSettings::default());
    }

    let content = std::fs::read_to_string(settings_path)
        .with_context(|| format!("read settings file {}", settings_path.display()))?;

    if content.trim().is_empty() {
        return Ok(ChartSettings::default());
    }

    let mut loaded: ChartSettings = serde_json::from_str(&content)
        .with_context(|| format!("deserialize settings file {}", settings_path.display()))?;
    loaded.sanitize();
    Ok(loaded)
}

pub fn save_to_path(settings_path: &Path, settings: &ChartSettings) -> Result<()> {
    if let Some(parent) = settings_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create settings parent folder {}", parent.display()))?;
    }

    let mut sanitized = settings.clone();
    sanitized.sanitize();
    let json = serde_json::to_string_pretty(&sanitized).context("serialize settings")?;
    std::fs::write(settings_path, json)
        .with_context(|| format!("write settings file {}", settings_path.display()))
}
