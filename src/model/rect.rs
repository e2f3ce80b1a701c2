use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a placed widget, allocated by the widget host.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(u32);

impl WidgetId {
    pub const fn new(id: u32) -> WidgetId { WidgetId(id) }

    pub fn get(&self) -> u32 { self.0 }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for WidgetId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { s.trim().parse().map(WidgetId) }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

impl PixelSize {
    pub const fn new(width: f64, height: f64) -> Self { Self { width, height } }
}

/// Space reserved by system bars on each edge of the canvas.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Insets {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub right: f64,
}

impl Insets {
    pub const ZERO: Insets = Insets { top: 0.0, left: 0.0, bottom: 0.0, right: 0.0 };

    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self { top, left, bottom, right }
    }

    pub fn top_left(&self) -> PixelPoint { PixelPoint::new(self.left, self.top) }

    pub fn horizontal(&self) -> f64 { self.left + self.right }

    pub fn vertical(&self) -> f64 { self.top + self.bottom }
}

/// Axis-aligned rectangle in canvas pixels. Never persisted.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> f64 { self.x }

    pub fn top(&self) -> f64 { self.y }

    pub fn right(&self) -> f64 { self.x + self.width }

    pub fn bottom(&self) -> f64 { self.y + self.height }

    /// Half-open containment: the right and bottom edges belong to the neighbour.
    pub fn contains(&self, point: PixelPoint) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }
}

/// A widget's durable placement in grid cells.
///
/// Values read back from storage may violate the positivity rules; call
/// [`CellRect::sanitized`] before using them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    pub cell_x: i32,
    pub cell_y: i32,
    pub cell_width: i32,
    pub cell_height: i32,
}

impl CellRect {
    pub const fn new(cell_x: i32, cell_y: i32, cell_width: i32, cell_height: i32) -> Self {
        Self { cell_x, cell_y, cell_width, cell_height }
    }

    pub fn right(&self) -> i32 { self.cell_x + self.cell_width }

    pub fn bottom(&self) -> i32 { self.cell_y + self.cell_height }

    pub fn is_valid(&self) -> bool {
        self.cell_x >= 0 && self.cell_y >= 0 && self.cell_width >= 1 && self.cell_height >= 1
    }

    /// Clamps position to be non-negative and size to at least one cell.
    pub fn sanitized(self) -> CellRect {
        CellRect {
            cell_x: self.cell_x.max(0),
            cell_y: self.cell_y.max(0),
            cell_width: self.cell_width.max(1),
            cell_height: self.cell_height.max(1),
        }
    }

    /// Shrinks (and only if unavoidable, shifts) the rect so it fits a
    /// `columns` x `rows` grid. Size is sacrificed before position.
    pub fn fit_within(self, columns: i32, rows: i32) -> CellRect {
        let rect = self.sanitized();
        let (cell_x, cell_width) = fit_axis(rect.cell_x, rect.cell_width, columns.max(1));
        let (cell_y, cell_height) = fit_axis(rect.cell_y, rect.cell_height, rows.max(1));
        CellRect { cell_x, cell_y, cell_width, cell_height }
    }

    pub fn fits_within(&self, columns: i32, rows: i32) -> bool {
        self.is_valid() && self.right() <= columns && self.bottom() <= rows
    }
}

impl fmt::Display for CellRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{},{},{},{}}}",
            self.cell_x, self.cell_y, self.cell_width, self.cell_height
        )
    }
}

fn fit_axis(start: i32, span: i32, count: i32) -> (i32, i32) {
    let start = start.min(count - 1);
    let span = span.min(count - start).max(1);
    (start, span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widget_id_parses_and_displays() {
        let id: WidgetId = " 42 ".parse().unwrap();
        assert_eq!(id, WidgetId::new(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<WidgetId>().is_err());
        assert!("-3".parse::<WidgetId>().is_err());
    }

    #[test]
    fn pixel_rect_edges_and_containment() {
        let r = PixelRect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
        assert!(r.contains(PixelPoint::new(10.0, 20.0)));
        assert!(r.contains(PixelPoint::new(39.9, 59.9)));
        assert!(!r.contains(PixelPoint::new(40.0, 30.0)));
        assert!(!r.contains(PixelPoint::new(20.0, 60.0)));
    }

    #[test]
    fn sanitized_clamps_malformed_records() {
        let r = CellRect::new(-2, 3, 0, -5).sanitized();
        assert_eq!(r, CellRect::new(0, 3, 1, 1));
        assert!(r.is_valid());
    }

    #[test]
    fn fit_within_caps_size_before_moving() {
        assert_eq!(CellRect::new(0, 0, 8, 9).fit_within(5, 10), CellRect::new(0, 0, 5, 9));
        assert_eq!(CellRect::new(3, 8, 4, 4).fit_within(5, 10), CellRect::new(3, 8, 2, 2));
        assert_eq!(CellRect::new(7, 12, 2, 2).fit_within(5, 10), CellRect::new(4, 9, 1, 1));
    }

    #[test]
    fn fits_within_checks_far_edges() {
        assert!(CellRect::new(3, 8, 2, 2).fits_within(5, 10));
        assert!(!CellRect::new(4, 8, 2, 2).fits_within(5, 10));
        assert!(!CellRect::new(0, 0, 0, 1).fits_within(5, 10));
    }
}
