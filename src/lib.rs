//! Multi-view body diagram annotation: per-view drawing with isolated
//! undo/redo history, PNG snapshots and chart persistence.

pub mod chart;
pub mod diagram;
pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_store;

pub use chart::{BodyChart, ChartId, ChartService, ChartStore, JsonDirStore, MemoryStore};
pub use diagram::{EditingSession, ViewId, ViewRegistry};
pub use error::{ChartError, ChartResult};
pub use settings::ChartSettings;
