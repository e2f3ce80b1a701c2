//! Logical grid geometry.
//!
//! Everything here is pure: the grid is recomputed from the canvas size and
//! insets whenever either changes and is never persisted.

use serde::Serialize;

use crate::model::{CellRect, Insets, PixelPoint, PixelRect, PixelSize};

/// Slack added before flooring a cell index so that a pixel coordinate
/// produced by [`cell_to_pixel`] maps back to the same cell despite rounding.
pub const CELL_EPSILON: f64 = 1e-6;

/// The launcher's dp to px conversion for layout constants (`72 / 96`).
pub const DEFAULT_PADDING_SCALE: f64 = 72.0 / 96.0;

pub const DEFAULT_COLUMNS: u32 = 5;
pub const DEFAULT_ROWS: u32 = 10;
pub const DEFAULT_PADDING_DP: f64 = 32.0;
/// Upper bound on columns and rows. Larger requests are clamped.
pub const MAX_GRID_DIMENSION: u32 = 100;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct GridSpec {
    /// Full canvas the grid was computed from.
    pub canvas: PixelSize,
    /// Top-left of the usable area after insets and padding.
    pub origin: PixelPoint,
    /// Usable width and height, never negative.
    pub extent: PixelSize,
    pub columns: u32,
    pub rows: u32,
    /// Cell size, at least one pixel on each axis.
    pub cell: PixelSize,
}

pub fn dp_to_px(dp: f64, scale: f64) -> f64 { (dp * scale).trunc() }

/// Computes the inset-aware grid for a canvas.
pub fn compute_grid_spec(
    canvas: PixelSize,
    insets: Insets,
    padding: f64,
    columns: u32,
    rows: u32,
) -> GridSpec {
    let columns = columns.clamp(1, MAX_GRID_DIMENSION);
    let rows = rows.clamp(1, MAX_GRID_DIMENSION);
    let corner = insets.top_left();
    let origin = PixelPoint::new(corner.x + padding, corner.y + padding);
    let extent = PixelSize::new(
        (canvas.width - insets.horizontal() - 2.0 * padding).max(0.0),
        (canvas.height - insets.vertical() - 2.0 * padding).max(0.0),
    );
    let cell = PixelSize::new(
        (extent.width / columns as f64).max(1.0),
        (extent.height / rows as f64).max(1.0),
    );
    GridSpec { canvas, origin, extent, columns, rows, cell }
}

impl GridSpec {
    /// Fixed-pixel grid anchored at the canvas corner: no insets, no padding,
    /// constant cell size.
    pub fn fixed(canvas: PixelSize, cell_size: f64, columns: u32, rows: u32) -> GridSpec {
        let columns = columns.clamp(1, MAX_GRID_DIMENSION);
        let rows = rows.clamp(1, MAX_GRID_DIMENSION);
        let cell = cell_size.max(1.0);
        GridSpec {
            canvas,
            origin: PixelPoint::new(0.0, 0.0),
            extent: PixelSize::new(cell * columns as f64, cell * rows as f64),
            columns,
            rows,
            cell: PixelSize::new(cell, cell),
        }
    }

    pub fn columns_i32(&self) -> i32 { self.columns.min(i32::MAX as u32) as i32 }

    pub fn rows_i32(&self) -> i32 { self.rows.min(i32::MAX as u32) as i32 }

    pub fn cell_to_pixel_rect(&self, rect: CellRect) -> PixelRect {
        PixelRect::new(
            cell_to_pixel(rect.cell_x, self.origin.x, self.cell.width),
            cell_to_pixel(rect.cell_y, self.origin.y, self.cell.height),
            rect.cell_width as f64 * self.cell.width,
            rect.cell_height as f64 * self.cell.height,
        )
    }

    /// Cell rect for a grid-aligned pixel rect. Position floors, size rounds.
    pub fn pixel_to_cell_rect(&self, rect: PixelRect) -> CellRect {
        CellRect::new(
            pixel_to_cell(rect.x, self.origin.x, self.cell.width),
            pixel_to_cell(rect.y, self.origin.y, self.cell.height),
            size_to_cells(rect.width, self.cell.width),
            size_to_cells(rect.height, self.cell.height),
        )
    }

    /// Snaps position (floor) and then size (nearest) on both axes.
    pub fn snap_rect(&self, rect: PixelRect) -> PixelRect {
        PixelRect::new(
            snap_position(rect.x, self.origin.x, self.cell.width, self.extent.width),
            snap_position(rect.y, self.origin.y, self.cell.height, self.extent.height),
            snap_size(rect.width, self.cell.width),
            snap_size(rect.height, self.cell.height),
        )
    }

    /// Cells needed to hold `size` pixels, rounding up.
    pub fn cells_for_min_size(&self, size: PixelSize) -> (i32, i32) {
        (
            cells_to_cover(size.width, self.cell.width),
            cells_to_cover(size.height, self.cell.height),
        )
    }
}

/// Which cell a pixel belongs to along one axis. Floors, never negative.
pub fn pixel_to_cell(pixel: f64, axis_origin: f64, cell_size: f64) -> i32 {
    let index = ((pixel - axis_origin) / cell_size + CELL_EPSILON).floor();
    if index.is_nan() {
        return 0;
    }
    index.clamp(0.0, i32::MAX as f64) as i32
}

pub fn cell_to_pixel(cell_index: i32, axis_origin: f64, cell_size: f64) -> f64 {
    axis_origin + cell_index as f64 * cell_size
}

/// Snaps down to the nearest grid line at or before `pixel`, kept within
/// `[axis_origin, axis_origin + extent]`.
pub fn snap_position(pixel: f64, axis_origin: f64, cell_size: f64, extent: f64) -> f64 {
    let last_line = pixel_to_cell(axis_origin + extent.max(0.0), axis_origin, cell_size);
    let index = pixel_to_cell(pixel, axis_origin, cell_size).min(last_line);
    cell_to_pixel(index, axis_origin, cell_size)
}

/// Whole cells nearest to `pixel_size` (half rounds up), at least one.
pub fn size_to_cells(pixel_size: f64, cell_size: f64) -> i32 {
    let cells = (pixel_size / cell_size + 0.5 + CELL_EPSILON).floor();
    if cells.is_nan() {
        return 1;
    }
    cells.clamp(1.0, i32::MAX as f64) as i32
}

pub fn snap_size(pixel_size: f64, cell_size: f64) -> f64 {
    size_to_cells(pixel_size, cell_size) as f64 * cell_size
}

fn cells_to_cover(pixel_size: f64, cell_size: f64) -> i32 {
    let cells = (pixel_size / cell_size - CELL_EPSILON).ceil();
    if cells.is_nan() {
        return 1;
    }
    cells.clamp(1.0, i32::MAX as f64) as i32
}

/// Cell corner points drawn as the edit-mode overlay, row by row.
pub fn grid_points(spec: &GridSpec) -> Vec<PixelPoint> {
    let lines = |count: u32| (count as usize).saturating_add(1);
    let mut points = Vec::with_capacity(lines(spec.columns).saturating_mul(lines(spec.rows)));
    for row in 0..=spec.rows_i32() {
        let y = cell_to_pixel(row, spec.origin.y, spec.cell.height);
        for column in 0..=spec.columns_i32() {
            points.push(PixelPoint::new(
                cell_to_pixel(column, spec.origin.x, spec.cell.width),
                y,
            ));
        }
    }
    points
}
