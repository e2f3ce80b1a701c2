pub mod collision;
pub mod engine;
mod error;
pub mod gesture;
pub mod grid;

pub use collision::{CollisionIndex, CollisionOracle, rects_overlap};
pub use engine::{
    CommitOutcome, EngineSettings, LoadReport, PlacementEngine, PointerResponse, WidgetFrame,
};
pub use error::{PlacementError, StoreError};
pub use gesture::PointerEvent;
pub use grid::{GridSpec, compute_grid_spec, grid_points};
