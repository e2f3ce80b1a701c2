pub mod rect;
pub mod widget;

pub use rect::{CellRect, Insets, PixelPoint, PixelRect, PixelSize, WidgetId};
pub use widget::{GestureKind, GestureState, Widget};
