use crate::diagram::model::ViewId;

/// A view identifier that is not part of the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view: {name}")]
pub struct UnknownViewError {
    pub name: String,
}

impl UnknownViewError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A stored snapshot that cannot be turned back into a raster.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to decode raster snapshot: {reason}")]
pub struct RasterDecodeError {
    pub reason: String,
}

impl RasterDecodeError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to encode raster snapshot: {0}")]
pub struct RasterEncodeError(#[from] pub image::ImageError);

/// The chart store rejected an operation.
#[derive(Debug, thiserror::Error)]
#[error("chart store {operation} failed: {detail}")]
pub struct PersistenceError {
    pub operation: &'static str,
    detail: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl PersistenceError {
    pub fn new(operation: &'static str, err: anyhow::Error) -> Self {
        Self {
            operation,
            detail: format!("{err:#}"),
            source: err.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error(transparent)]
    UnknownView(#[from] UnknownViewError),
    #[error("view {view}: {source}")]
    RasterDecode {
        view: ViewId,
        #[source]
        source: RasterDecodeError,
    },
    #[error(transparent)]
    RasterEncode(#[from] RasterEncodeError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("invalid chart: {0}")]
    InvalidChart(String),
}

impl ChartError {
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

pub type ChartResult<T> = Result<T, ChartError>;
