//! Pointer gestures on a single widget.
//!
//! Moves and resizes follow the pointer in raw pixels; snapping only happens
//! when the gesture ends (see [`super::PlacementEngine`]).

use serde::{Deserialize, Serialize};

use crate::model::{GestureKind, GestureState, PixelPoint, PixelRect, PixelSize};

pub const DEFAULT_RESIZE_HANDLE_SIZE: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up,
    Cancel,
}

impl PointerEvent {
    pub fn down(point: PixelPoint) -> Self { PointerEvent::Down { x: point.x, y: point.y } }

    pub fn moved(point: PixelPoint) -> Self { PointerEvent::Move { x: point.x, y: point.y } }
}

/// Side of the handle square on `rect`. It never covers more than half the
/// rect on either axis, so every widget keeps a drag area.
fn handle_side(rect: &PixelRect, handle_size: f64) -> f64 {
    handle_size.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0)
}

/// The square resize handle anchored at the rect's bottom-right corner.
pub fn resize_handle(rect: &PixelRect, handle_size: f64) -> PixelRect {
    let side = handle_side(rect, handle_size);
    PixelRect::new(rect.right() - side, rect.bottom() - side, side, side)
}

/// A pointer-down inside the handle square resizes; anywhere else drags.
pub fn classify_pointer_down(rect: &PixelRect, point: PixelPoint, handle_size: f64) -> GestureKind {
    let side = handle_side(rect, handle_size);
    if point.x >= rect.right() - side && point.y >= rect.bottom() - side {
        GestureKind::Resizing
    } else {
        GestureKind::Dragging
    }
}

pub fn begin_gesture(rect: PixelRect, point: PixelPoint, handle_size: f64) -> GestureState {
    match classify_pointer_down(&rect, point, handle_size) {
        GestureKind::Resizing => GestureState::Resizing {
            start: rect,
            live: rect,
            last_pointer: point,
        },
        _ => GestureState::Dragging {
            start: rect,
            live: rect,
            last_pointer: point,
        },
    }
}

/// Applies a pointer move to an in-flight gesture.
///
/// Drags keep the whole rect on the canvas. Resizes keep at least one cell
/// on each axis and do not grow past the canvas edge.
pub fn apply_move(
    state: GestureState,
    point: PixelPoint,
    canvas: PixelSize,
    cell: PixelSize,
) -> GestureState {
    match state {
        GestureState::Idle => GestureState::Idle,
        GestureState::Dragging { start, live, last_pointer } => {
            let dx = point.x - last_pointer.x;
            let dy = point.y - last_pointer.y;
            let max_x = (canvas.width - live.width).max(0.0);
            let max_y = (canvas.height - live.height).max(0.0);
            let live = PixelRect::new(
                (live.x + dx).clamp(0.0, max_x),
                (live.y + dy).clamp(0.0, max_y),
                live.width,
                live.height,
            );
            GestureState::Dragging { start, live, last_pointer: point }
        }
        GestureState::Resizing { start, live, last_pointer } => {
            let dx = point.x - last_pointer.x;
            let dy = point.y - last_pointer.y;
            let max_width = (canvas.width - live.x).max(cell.width);
            let max_height = (canvas.height - live.y).max(cell.height);
            let live = PixelRect::new(
                live.x,
                live.y,
                (live.width + dx).clamp(cell.width, max_width),
                (live.height + dy).clamp(cell.height, max_height),
            );
            GestureState::Resizing { start, live, last_pointer: point }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const CANVAS: PixelSize = PixelSize::new(200.0, 400.0);
    const CELL: PixelSize = PixelSize::new(40.0, 40.0);

    #[test]
    fn handle_region_selects_resize() {
        let rect = PixelRect::new(0.0, 0.0, 160.0, 160.0);
        assert_eq!(
            classify_pointer_down(&rect, PixelPoint::new(150.0, 150.0), 80.0),
            GestureKind::Resizing
        );
        assert_eq!(
            classify_pointer_down(&rect, PixelPoint::new(80.0, 80.0), 80.0),
            GestureKind::Resizing
        );
        assert_eq!(
            classify_pointer_down(&rect, PixelPoint::new(79.0, 150.0), 80.0),
            GestureKind::Dragging
        );
        assert_eq!(
            classify_pointer_down(&rect, PixelPoint::new(10.0, 10.0), 80.0),
            GestureKind::Dragging
        );
    }

    #[test]
    fn handle_shrinks_on_small_rects() {
        let rect = PixelRect::new(40.0, 40.0, 40.0, 120.0);
        assert_eq!(resize_handle(&rect, 80.0), PixelRect::new(60.0, 140.0, 20.0, 20.0));

        let big = PixelRect::new(0.0, 0.0, 400.0, 400.0);
        assert_eq!(resize_handle(&big, 80.0), PixelRect::new(320.0, 320.0, 80.0, 80.0));
    }

    #[test]
    fn rects_smaller_than_the_handle_keep_a_drag_area() {
        let rect = PixelRect::new(0.0, 0.0, 80.0, 80.0);
        assert_eq!(
            classify_pointer_down(&rect, PixelPoint::new(10.0, 10.0), 80.0),
            GestureKind::Dragging
        );
        assert_eq!(
            classify_pointer_down(&rect, PixelPoint::new(39.0, 70.0), 80.0),
            GestureKind::Dragging
        );
        assert_eq!(
            classify_pointer_down(&rect, PixelPoint::new(40.0, 40.0), 80.0),
            GestureKind::Resizing
        );
    }

    #[test]
    fn drag_follows_raw_deltas_without_snapping() {
        let rect = PixelRect::new(0.0, 0.0, 80.0, 80.0);
        let state = begin_gesture(rect, PixelPoint::new(10.0, 10.0), 80.0);
        assert!(state.is_drag());

        let state = apply_move(state, PixelPoint::new(23.0, 41.0), CANVAS, CELL);
        assert_eq!(state.live_rect(), Some(PixelRect::new(13.0, 31.0, 80.0, 80.0)));
        assert_eq!(state.start_rect(), Some(rect));
    }

    #[test]
    fn drag_is_clamped_to_canvas() {
        let rect = PixelRect::new(40.0, 40.0, 80.0, 80.0);
        let state = begin_gesture(rect, PixelPoint::new(50.0, 50.0), 80.0);
        let state = apply_move(state, PixelPoint::new(-500.0, 900.0), CANVAS, CELL);
        assert_eq!(state.live_rect(), Some(PixelRect::new(0.0, 320.0, 80.0, 80.0)));

        // Moving back starts from the clamped rect, not from the raw pointer.
        let state = apply_move(state, PixelPoint::new(-490.0, 890.0), CANVAS, CELL);
        assert_eq!(state.live_rect(), Some(PixelRect::new(10.0, 310.0, 80.0, 80.0)));
    }

    #[test]
    fn resize_keeps_one_cell_minimum_and_canvas_edge() {
        let rect = PixelRect::new(40.0, 40.0, 80.0, 80.0);
        let state = begin_gesture(rect, PixelPoint::new(110.0, 110.0), 80.0);
        assert!(state.is_resize());

        let shrunk = apply_move(state, PixelPoint::new(0.0, 0.0), CANVAS, CELL);
        assert_eq!(shrunk.live_rect(), Some(PixelRect::new(40.0, 40.0, 40.0, 40.0)));

        let grown = apply_move(state, PixelPoint::new(1000.0, 1000.0), CANVAS, CELL);
        assert_eq!(grown.live_rect(), Some(PixelRect::new(40.0, 40.0, 160.0, 360.0)));
    }

    #[test]
    fn idle_ignores_moves() {
        let state = apply_move(GestureState::Idle, PixelPoint::new(5.0, 5.0), CANVAS, CELL);
        assert!(state.is_idle());
    }

    #[test]
    fn events_decode_from_tagged_json() {
        let down: PointerEvent = serde_json::from_str(r#"{"type":"down","x":1.0,"y":2.0}"#).unwrap();
        assert_eq!(down, PointerEvent::down(PixelPoint::new(1.0, 2.0)));
        let cancel: PointerEvent = serde_json::from_str(r#"{"type":"cancel"}"#).unwrap();
        assert_eq!(cancel, PointerEvent::Cancel);
    }
}
