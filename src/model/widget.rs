use serde::Serialize;
use strum::Display;

use super::rect::{CellRect, PixelPoint, PixelRect, WidgetId};

/// In-flight pointer interaction on a single widget.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    /// Moving the widget.
    Dragging {
        /// Pixel rect at pointer-down, restored on a rejected commit.
        start: PixelRect,
        /// Unsnapped rect following the pointer.
        live: PixelRect,
        /// Pointer position of the previous event.
        last_pointer: PixelPoint,
    },
    /// Resizing from the bottom-right handle.
    Resizing {
        start: PixelRect,
        live: PixelRect,
        last_pointer: PixelPoint,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GestureKind {
    Idle,
    Dragging,
    Resizing,
}

impl GestureState {
    #[inline]
    pub fn is_idle(&self) -> bool { matches!(self, GestureState::Idle) }

    #[inline]
    pub fn is_drag(&self) -> bool { matches!(self, GestureState::Dragging { .. }) }

    #[inline]
    pub fn is_resize(&self) -> bool { matches!(self, GestureState::Resizing { .. }) }

    pub fn kind(&self) -> GestureKind {
        match self {
            GestureState::Idle => GestureKind::Idle,
            GestureState::Dragging { .. } => GestureKind::Dragging,
            GestureState::Resizing { .. } => GestureKind::Resizing,
        }
    }

    pub fn start_rect(&self) -> Option<PixelRect> {
        match self {
            GestureState::Idle => None,
            GestureState::Dragging { start, .. } | GestureState::Resizing { start, .. } => {
                Some(*start)
            }
        }
    }

    pub fn live_rect(&self) -> Option<PixelRect> {
        match self {
            GestureState::Idle => None,
            GestureState::Dragging { live, .. } | GestureState::Resizing { live, .. } => {
                Some(*live)
            }
        }
    }
}

/// A widget in the engine's in-memory mirror of the layout store.
#[derive(Clone, Debug, PartialEq)]
pub struct Widget {
    pub id: WidgetId,
    /// Last committed placement.
    pub rect: CellRect,
    pub gesture: GestureState,
}

impl Widget {
    pub fn new(id: WidgetId, rect: CellRect) -> Self {
        Self { id, rect, gesture: GestureState::Idle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_has_no_rects() {
        let state = GestureState::default();
        assert!(state.is_idle());
        assert_eq!(state.kind(), GestureKind::Idle);
        assert!(state.start_rect().is_none());
        assert!(state.live_rect().is_none());
    }

    #[test]
    fn resizing_exposes_start_and_live() {
        let start = PixelRect::new(0.0, 0.0, 80.0, 80.0);
        let live = PixelRect::new(0.0, 0.0, 130.0, 95.0);
        let state = GestureState::Resizing {
            start,
            live,
            last_pointer: PixelPoint::new(130.0, 95.0),
        };

        assert!(state.is_resize());
        assert!(!state.is_drag());
        assert_eq!(state.start_rect(), Some(start));
        assert_eq!(state.live_rect(), Some(live));
        assert_eq!(state.kind().to_string(), "resizing");
    }

    #[test]
    fn new_widget_starts_idle() {
        let widget = Widget::new(WidgetId::new(7), CellRect::new(0, 0, 1, 1));
        assert!(widget.gesture.is_idle());
    }
}
