pub mod history;
pub mod input;
pub mod model;
pub mod render;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod views;

pub use history::{HistoryManager, HistoryState, ViewHistory};
pub use model::{Color, DrawMode, Point, Stroke, StrokeStyle, ViewId};
pub use session::EditingSession;
pub use snapshot::Snapshot;
pub use views::{BaseImageRef, ViewRegistry};
