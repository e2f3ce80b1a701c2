use std::path::PathBuf;

use thiserror::Error;

use crate::model::WidgetId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("Could not serialize store: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("Unknown widget {0}")]
    UnknownWidget(WidgetId),
    #[error("Widget {0} is already placed")]
    AlreadyPlaced(WidgetId),
    #[error("Content provider for widget {0} is unavailable")]
    ContentUnavailable(WidgetId),
    #[error("No free row for widget {0}")]
    NoRoom(WidgetId),
    #[error("Layout store failed: {0}")]
    Store(#[from] StoreError),
}
