use crate::chart::model::{BodyChart, ChartId};
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key-value document store holding whole charts. No filtering or ordering
/// is pushed down; callers sort and filter the results of [`list_all`].
///
/// [`list_all`]: ChartStore::list_all
pub trait ChartStore: Send + Sync {
    fn put(&self, id: &ChartId, chart: &BodyChart) -> Result<()>;
    fn get(&self, id: &ChartId) -> Result<Option<BodyChart>>;
    /// Returns `false` when no chart was stored under `id`.
    fn delete(&self, id: &ChartId) -> Result<bool>;
    fn list_all(&self) -> Result<Vec<BodyChart>>;
}

pub const CHART_FILE_EXTENSION: &str = "json";

/// One pretty-printed JSON file per chart inside a directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chart_path(&self, id: &ChartId) -> PathBuf {
        self.dir.join(format!("{id}.{CHART_FILE_EXTENSION}"))
    }

    fn read_chart(path: &Path) -> Result<BodyChart> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("read chart file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("deserialize chart file {}", path.display()))
    }
}

impl ChartStore for JsonDirStore {
    fn put(&self, id: &ChartId, chart: &BodyChart) -> Result<()> {
        if chart.id.as_ref() != Some(id) {
            return Err(anyhow!("chart id does not match storage key {id}"));
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create chart folder {}", self.dir.display()))?;

        let path = self.chart_path(id);
        let tmp = path.with_extension(format!("{CHART_FILE_EXTENSION}.tmp"));
        let json = serde_json::to_string_pretty(chart).context("serialize chart")?;
        fs::write(&tmp, json).with_context(|| format!("write chart file {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("move chart file into place {}", path.display()))
    }

    fn get(&self, id: &ChartId) -> Result<Option<BodyChart>> {
        let path = self.chart_path(id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_chart(&path).map(Some)
    }

    fn delete(&self, id: &ChartId) -> Result<bool> {
        let path = self.chart_path(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .with_context(|| format!("remove chart file {}", path.display()))?;
        Ok(true)
    }

    fn list_all(&self) -> Result<Vec<BodyChart>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("list chart folder {}", self.dir.display()))?;

        let mut charts = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("list chart folder {}", self.dir.display()))?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(CHART_FILE_EXTENSION) {
                continue;
            }
            match Self::read_chart(&path) {
                Ok(chart) => charts.push(chart),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %format!("{err:#}"), "skipping unreadable chart file");
                }
            }
        }
        Ok(charts)
    }
}

/// Store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    charts: Mutex<HashMap<ChartId, BodyChart>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<ChartId, BodyChart>>> {
        self.charts
            .lock()
            .map_err(|_| anyhow!("memory chart store lock poisoned"))
    }
}

impl ChartStore for MemoryStore {
    fn put(&self, id: &ChartId, chart: &BodyChart) -> Result<()> {
        self.lock()?.insert(*id, chart.clone());
        Ok(())
    }

    fn get(&self, id: &ChartId) -> Result<Option<BodyChart>> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn delete(&self, id: &ChartId) -> Result<bool> {
        Ok(self.lock()?.remove(id).is_some())
    }

    fn list_all(&self) -> Result<Vec<BodyChart>> {
        Ok(self.lock()?.values().cloned().collect())
    }
}
