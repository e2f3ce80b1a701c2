use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

use super::collision::{CollisionIndex, CollisionOracle, rects_overlap};
use super::error::{PlacementError, StoreError};
use super::gesture::{self, DEFAULT_RESIZE_HANDLE_SIZE, PointerEvent};
use super::grid::{self, GridSpec};
use crate::model::{
    CellRect, GestureKind, Insets, PixelPoint, PixelRect, PixelSize, Widget, WidgetId,
};
use crate::sys::canvas::CanvasProvider;
use crate::sys::host::WidgetHostAdapter;
use crate::sys::store::{CommitSink, LayoutStore};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub columns: u32,
    pub rows: u32,
    /// Padding inside the insets, in pixels.
    pub padding: f64,
    /// Constant cell size. When set the grid starts at the canvas corner and
    /// insets and padding are ignored.
    pub fixed_cell_size: Option<f64>,
    pub resize_handle_size: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            columns: grid::DEFAULT_COLUMNS,
            rows: grid::DEFAULT_ROWS,
            padding: grid::dp_to_px(grid::DEFAULT_PADDING_DP, grid::DEFAULT_PADDING_SCALE),
            fixed_cell_size: None,
            resize_handle_size: DEFAULT_RESIZE_HANDLE_SIZE,
        }
    }
}

impl EngineSettings {
    pub fn grid_for(&self, canvas: PixelSize, insets: Insets) -> GridSpec {
        match self.fixed_cell_size {
            Some(cell) => GridSpec::fixed(canvas, cell, self.columns, self.rows),
            None => grid::compute_grid_spec(canvas, insets, self.padding, self.columns, self.rows),
        }
    }
}

/// How a gesture (or a new placement) ended.
#[derive(Debug)]
pub enum CommitOutcome {
    /// Accepted and written to the store.
    Committed { id: WidgetId, rect: CellRect },
    /// Accepted for this session, but the store write failed.
    Unsaved {
        id: WidgetId,
        rect: CellRect,
        error: StoreError,
    },
    /// Rejected because of an overlap; the widget is back at `rect`, its
    /// pixel rect from before the gesture.
    Reverted { id: WidgetId, rect: PixelRect },
}

impl CommitOutcome {
    pub fn id(&self) -> WidgetId {
        match self {
            CommitOutcome::Committed { id, .. }
            | CommitOutcome::Unsaved { id, .. }
            | CommitOutcome::Reverted { id, .. } => *id,
        }
    }

    /// The new committed placement, if the gesture was accepted.
    pub fn accepted_rect(&self) -> Option<CellRect> {
        match self {
            CommitOutcome::Committed { rect, .. } | CommitOutcome::Unsaved { rect, .. } => Some(*rect),
            CommitOutcome::Reverted { .. } => None,
        }
    }

    #[inline]
    pub fn is_reverted(&self) -> bool { matches!(self, CommitOutcome::Reverted { .. }) }
}

#[derive(Debug)]
pub enum PointerResponse {
    /// Not in edit mode; the event belongs to the widget's content.
    Forward,
    Handled,
    /// The event ended a gesture.
    Finished(CommitOutcome),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Widgets now in the layout, in ID order.
    pub loaded: Vec<WidgetId>,
    /// Widgets that had no stored placement.
    pub placed_by_default: Vec<WidgetId>,
    /// Stored placements that were out of range and got clamped.
    pub clamped: Vec<WidgetId>,
    /// Stored placements that overlapped an earlier widget and were moved.
    pub relocated: Vec<WidgetId>,
    /// Widgets whose content provider could not be resolved.
    pub dropped: Vec<WidgetId>,
    /// Widgets left out for lack of a free row. Their stored entries are kept.
    pub skipped: Vec<WidgetId>,
}

/// What the host needs to draw one widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetFrame {
    pub id: WidgetId,
    pub rect: PixelRect,
    pub cell: CellRect,
    pub gesture: GestureKind,
    pub edit_mode: bool,
    /// Resize handle square, present in edit mode.
    pub handle: Option<PixelRect>,
}

/// Places widgets on the grid and arbitrates drag and resize gestures.
///
/// The engine keeps an in-memory mirror of the layout store, rebuilt by
/// [`PlacementEngine::load`]. Every accepted placement is written through
/// to the store; a failed write keeps the in-memory placement.
pub struct PlacementEngine<S, H, O = CollisionIndex> {
    store: S,
    host: H,
    oracle: O,
    settings: EngineSettings,
    grid: GridSpec,
    widgets: BTreeMap<WidgetId, Widget>,
    /// Widgets with unresolvable content, removed from the store on the next
    /// successful write.
    stale: BTreeSet<WidgetId>,
    /// Stored widgets left out of this session for lack of room.
    skipped: BTreeSet<WidgetId>,
    edit_mode: bool,
}

impl<S: LayoutStore, H: WidgetHostAdapter> PlacementEngine<S, H> {
    pub fn new(store: S, host: H, settings: EngineSettings, canvas: &impl CanvasProvider) -> Self {
        Self::with_oracle(store, host, CollisionIndex, settings, canvas)
    }
}

impl<S: LayoutStore, H: WidgetHostAdapter, O: CollisionOracle> PlacementEngine<S, H, O> {
    pub fn with_oracle(
        store: S,
        host: H,
        oracle: O,
        settings: EngineSettings,
        canvas: &impl CanvasProvider,
    ) -> Self {
        let grid = settings.grid_for(canvas.current_canvas_size(), canvas.current_insets());
        Self {
            store,
            host,
            oracle,
            settings,
            grid,
            widgets: BTreeMap::new(),
            stale: BTreeSet::new(),
            skipped: BTreeSet::new(),
            edit_mode: false,
        }
    }

    pub fn grid(&self) -> &GridSpec { &self.grid }

    pub fn settings(&self) -> &EngineSettings { &self.settings }

    pub fn store(&self) -> &S { &self.store }

    pub fn store_mut(&mut self) -> &mut S { &mut self.store }

    pub fn host(&self) -> &H { &self.host }

    pub fn host_mut(&mut self) -> &mut H { &mut self.host }

    pub fn widget(&self, id: WidgetId) -> Option<&Widget> { self.widgets.get(&id) }

    pub fn widgets(&self) -> impl Iterator<Item = &Widget> { self.widgets.values() }

    pub fn is_edit_mode(&self) -> bool { self.edit_mode }

    /// Widgets waiting to be removed from the store.
    pub fn pending_cleanup(&self) -> &BTreeSet<WidgetId> { &self.stale }

    /// Stored widgets that did not fit at load. They stay in the store until
    /// removed.
    pub fn skipped(&self) -> &BTreeSet<WidgetId> { &self.skipped }

    /// Recomputes the grid from the canvas. Returns whether it changed.
    pub fn refresh_grid(&mut self, canvas: &impl CanvasProvider) -> bool {
        let grid = self
            .settings
            .grid_for(canvas.current_canvas_size(), canvas.current_insets());
        if grid == self.grid {
            return false;
        }
        debug!(?grid, "grid changed");
        self.grid = grid;
        true
    }

    /// Rebuilds the in-memory layout from the store.
    #[instrument(skip(self), level = "debug")]
    pub fn load(&mut self) -> Result<LoadReport, StoreError> {
        self.widgets.clear();
        self.stale.clear();
        self.skipped.clear();
        let mut report = LoadReport::default();
        let (columns, rows) = (self.grid.columns_i32(), self.grid.rows_i32());

        for id in self.store.list_widget_ids()? {
            if self.host.resolve_content(id).is_none() {
                warn!(%id, "content provider unavailable; dropping widget");
                self.stale.insert(id);
                report.dropped.push(id);
                continue;
            }

            let stored = self.store.load_rect(id)?;
            let rect = match stored {
                Some(raw) => {
                    let rect = raw.fit_within(columns, rows);
                    if rect != raw {
                        warn!(%id, stored = %raw, clamped = %rect, "clamped stored placement");
                        report.clamped.push(id);
                    }
                    if self.collides(id, &self.grid.cell_to_pixel_rect(rect)) {
                        match self.find_free_row(id, rect.cell_x, rect.cell_width, rect.cell_height)
                        {
                            Some(moved) => {
                                warn!(%id, from = %rect, to = %moved, "stored placement overlaps; relocated");
                                report.relocated.push(id);
                                moved
                            }
                            None => {
                                warn!(%id, %rect, "stored placement overlaps and no row is free; skipping");
                                self.skipped.insert(id);
                                report.skipped.push(id);
                                continue;
                            }
                        }
                    } else {
                        rect
                    }
                }
                None => match self.default_placement(id) {
                    Some(rect) => {
                        report.placed_by_default.push(id);
                        rect
                    }
                    None => {
                        warn!(%id, "no room for default placement; skipping");
                        self.skipped.insert(id);
                        report.skipped.push(id);
                        continue;
                    }
                },
            };

            self.widgets.insert(id, Widget::new(id, rect));
            report.loaded.push(id);
            if stored != Some(rect) {
                self.persist(id, rect);
            }
        }

        info!(
            loaded = report.loaded.len(),
            dropped = report.dropped.len(),
            skipped = report.skipped.len(),
            "layout loaded"
        );
        Ok(report)
    }

    /// Adds a freshly bound widget at its default placement.
    #[instrument(skip(self), level = "debug")]
    pub fn add_widget(&mut self, id: WidgetId) -> Result<CommitOutcome, PlacementError> {
        if self.widgets.contains_key(&id) {
            return Err(PlacementError::AlreadyPlaced(id));
        }
        if self.host.resolve_content(id).is_none() {
            return Err(PlacementError::ContentUnavailable(id));
        }
        let rect = self.default_placement(id).ok_or(PlacementError::NoRoom(id))?;
        self.store.register_widget(id)?;
        self.stale.remove(&id);
        self.skipped.remove(&id);
        self.widgets.insert(id, Widget::new(id, rect));
        info!(%id, %rect, "widget added");
        Ok(self.persist(id, rect))
    }

    pub fn remove_widget(&mut self, id: WidgetId) -> Result<(), PlacementError> {
        let placed = self.widgets.remove(&id).is_some();
        let stale = self.stale.remove(&id);
        let skipped = self.skipped.remove(&id);
        if !placed && !stale && !skipped {
            return Err(PlacementError::UnknownWidget(id));
        }
        info!(%id, "widget removed");
        self.store.remove_widget(id)?;
        Ok(())
    }

    /// Leaving edit mode ends every open gesture with commit-or-revert.
    pub fn set_edit_mode(&mut self, enabled: bool) -> Vec<CommitOutcome> {
        if self.edit_mode == enabled {
            return Vec::new();
        }
        self.edit_mode = enabled;
        info!(enabled, "edit mode changed");
        if enabled {
            return Vec::new();
        }
        let active: Vec<WidgetId> = self
            .widgets
            .values()
            .filter(|w| !w.gesture.is_idle())
            .map(|w| w.id)
            .collect();
        active.into_iter().filter_map(|id| self.finish_gesture(id)).collect()
    }

    pub fn toggle_edit_mode(&mut self) -> Vec<CommitOutcome> { self.set_edit_mode(!self.edit_mode) }

    /// Routes one pointer event for `id`.
    pub fn handle_pointer(
        &mut self,
        id: WidgetId,
        event: PointerEvent,
    ) -> Result<PointerResponse, PlacementError> {
        let edit_mode = self.edit_mode;
        let grid = self.grid;
        let handle_size = self.settings.resize_handle_size;
        let widget = self.widgets.get_mut(&id).ok_or(PlacementError::UnknownWidget(id))?;
        if !edit_mode {
            return Ok(PointerResponse::Forward);
        }
        trace!(%id, ?event, "pointer event");

        match event {
            PointerEvent::Down { x, y } => {
                if !widget.gesture.is_idle() {
                    trace!(%id, "pointer-down during an open gesture; ignoring");
                    return Ok(PointerResponse::Handled);
                }
                let rect = grid.cell_to_pixel_rect(widget.rect);
                widget.gesture = gesture::begin_gesture(rect, PixelPoint::new(x, y), handle_size);
                debug!(%id, kind = %widget.gesture.kind(), "gesture started");
                Ok(PointerResponse::Handled)
            }
            PointerEvent::Move { x, y } => {
                widget.gesture =
                    gesture::apply_move(widget.gesture, PixelPoint::new(x, y), grid.canvas, grid.cell);
                Ok(PointerResponse::Handled)
            }
            PointerEvent::Up | PointerEvent::Cancel => Ok(match self.finish_gesture(id) {
                Some(outcome) => PointerResponse::Finished(outcome),
                None => PointerResponse::Handled,
            }),
        }
    }

    /// Snaps a live rect to the grid and fits it inside the grid bounds:
    /// position first (floor), then size (nearest), then clamping, which
    /// shrinks size before it moves position.
    pub fn snap_candidate(&self, live: PixelRect) -> CellRect {
        let snapped = self.grid.snap_rect(live);
        self.grid
            .pixel_to_cell_rect(snapped)
            .fit_within(self.grid.columns_i32(), self.grid.rows_i32())
    }

    /// Where a new widget would go: first column, first row from the top
    /// where its minimum size fits without overlap.
    pub fn default_placement(&self, id: WidgetId) -> Option<CellRect> {
        let (width, height) = self.grid.cells_for_min_size(self.host.minimum_content_size(id));
        self.find_free_row(id, 0, width, height)
    }

    /// The rect the host should draw: the live rect mid-gesture, otherwise
    /// the committed one.
    pub fn pixel_rect(&self, id: WidgetId) -> Option<PixelRect> {
        let widget = self.widgets.get(&id)?;
        Some(
            widget
                .gesture
                .live_rect()
                .unwrap_or_else(|| self.grid.cell_to_pixel_rect(widget.rect)),
        )
    }

    /// Topmost widget under `point`.
    pub fn widget_at(&self, point: PixelPoint) -> Option<WidgetId> {
        self.widgets
            .keys()
            .rev()
            .copied()
            .find(|id| self.pixel_rect(*id).is_some_and(|rect| rect.contains(point)))
    }

    pub fn frames(&self) -> Vec<WidgetFrame> {
        self.widgets
            .values()
            .filter_map(|widget| {
                let rect = self.pixel_rect(widget.id)?;
                Some(WidgetFrame {
                    id: widget.id,
                    rect,
                    cell: widget.rect,
                    gesture: widget.gesture.kind(),
                    edit_mode: self.edit_mode,
                    handle: self
                        .edit_mode
                        .then(|| gesture::resize_handle(&rect, self.settings.resize_handle_size)),
                })
            })
            .collect()
    }

    /// Grid dots to draw while editing.
    pub fn overlay_points(&self) -> Option<Vec<PixelPoint>> {
        self.edit_mode.then(|| grid::grid_points(&self.grid))
    }

    /// Checks the committed layout against the bounds and no-overlap rules.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let (columns, rows) = (self.grid.columns_i32(), self.grid.rows_i32());
        for widget in self.widgets.values() {
            if !widget.rect.fits_within(columns, rows) {
                issues.push(format!(
                    "widget {} at {} does not fit the {}x{} grid",
                    widget.id, widget.rect, columns, rows
                ));
            }
        }
        let placed: Vec<(WidgetId, PixelRect)> = self
            .widgets
            .values()
            .map(|w| (w.id, self.grid.cell_to_pixel_rect(w.rect)))
            .collect();
        for (i, (a, a_rect)) in placed.iter().enumerate() {
            for (b, b_rect) in &placed[i + 1..] {
                if rects_overlap(a_rect, b_rect) {
                    issues.push(format!("widgets {a} and {b} overlap"));
                }
            }
        }
        issues
    }

    fn finish_gesture(&mut self, id: WidgetId) -> Option<CommitOutcome> {
        let widget = self.widgets.get_mut(&id)?;
        let state = std::mem::take(&mut widget.gesture);
        let (start, live) = (state.start_rect()?, state.live_rect()?);
        Some(self.commit_or_revert(id, start, live))
    }

    fn commit_or_revert(&mut self, id: WidgetId, start: PixelRect, live: PixelRect) -> CommitOutcome {
        let rect = self.snap_candidate(live);
        let candidate = self.grid.cell_to_pixel_rect(rect);
        if self.collides(id, &candidate) {
            debug!(%id, %rect, "placement overlaps another widget; reverting");
            return CommitOutcome::Reverted { id, rect: start };
        }
        if let Some(widget) = self.widgets.get_mut(&id) {
            widget.rect = rect;
        }
        debug!(%id, %rect, "placement accepted");
        self.persist(id, rect)
    }

    fn persist(&mut self, id: WidgetId, rect: CellRect) -> CommitOutcome {
        match self.store.commit(id, rect) {
            Ok(()) => {
                self.sweep_stale();
                CommitOutcome::Committed { id, rect }
            }
            Err(error) => {
                warn!(%id, %rect, %error, "could not persist placement; keeping it for this session");
                CommitOutcome::Unsaved { id, rect, error }
            }
        }
    }

    fn sweep_stale(&mut self) {
        for id in std::mem::take(&mut self.stale) {
            match self.store.remove_widget(id) {
                Ok(()) => debug!(%id, "removed stale widget from store"),
                Err(error) => {
                    warn!(%id, %error, "could not remove stale widget");
                    self.stale.insert(id);
                }
            }
        }
    }

    fn collides(&self, id: WidgetId, candidate: &PixelRect) -> bool {
        let mut others = self
            .widgets
            .values()
            .filter(|w| w.id != id)
            .map(|w| (w.id, self.grid.cell_to_pixel_rect(w.rect)));
        self.oracle.overlaps(candidate, id, &mut others)
    }

    /// Scans rows from the top for a spot `width` x `height` cells at
    /// column `cell_x`. Oversized requests are shrunk to the grid first.
    fn find_free_row(&self, id: WidgetId, cell_x: i32, width: i32, height: i32) -> Option<CellRect> {
        let (columns, rows) = (self.grid.columns_i32(), self.grid.rows_i32());
        let base = CellRect::new(cell_x, 0, width, height).fit_within(columns, rows);
        (0..=rows - base.cell_height)
            .map(|cell_y| CellRect { cell_y, ..base })
            .find(|rect| !self.collides(id, &self.grid.cell_to_pixel_rect(*rect)))
    }
}
