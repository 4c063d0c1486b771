pub mod model;
pub mod service;
pub mod store;

pub use model::{BodyChart, ChartId};
pub use service::ChartService;
pub use store::{ChartStore, JsonDirStore, MemoryStore};
