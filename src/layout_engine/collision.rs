use crate::model::{PixelRect, WidgetId};

/// Edges closer than this are treated as touching rather than overlapping.
pub const EDGE_EPSILON: f64 = 1e-6;

/// Strict overlap test; shared edges do not count.
pub fn rects_overlap(a: &PixelRect, b: &PixelRect) -> bool {
    !(a.right() <= b.left() + EDGE_EPSILON
        || a.left() >= b.right() - EDGE_EPSILON
        || a.bottom() <= b.top() + EDGE_EPSILON
        || a.top() >= b.bottom() - EDGE_EPSILON)
}

/// Answers whether a candidate placement would overlap another widget.
pub trait CollisionOracle {
    fn overlaps(
        &self,
        candidate: &PixelRect,
        excluding: WidgetId,
        placed: &mut dyn Iterator<Item = (WidgetId, PixelRect)>,
    ) -> bool;
}

/// Linear scan over every placed widget. Layouts hold tens of widgets, so
/// there is no spatial structure.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollisionIndex;

impl CollisionIndex {
    /// First widget (other than `excluding`) that `candidate` overlaps.
    pub fn first_overlap(
        candidate: &PixelRect,
        excluding: WidgetId,
        placed: impl IntoIterator<Item = (WidgetId, PixelRect)>,
    ) -> Option<WidgetId> {
        placed
            .into_iter()
            .filter(|(id, _)| *id != excluding)
            .find(|(_, rect)| rects_overlap(candidate, rect))
            .map(|(id, _)| id)
    }
}

impl CollisionOracle for CollisionIndex {
    fn overlaps(
        &self,
        candidate: &PixelRect,
        excluding: WidgetId,
        placed: &mut dyn Iterator<Item = (WidgetId, PixelRect)>,
    ) -> bool {
        Self::first_overlap(candidate, excluding, placed).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> PixelRect { PixelRect::new(x, y, w, h) }

    #[test]
    fn overlapping_rects_collide() {
        assert!(rects_overlap(&rect(0.0, 0.0, 80.0, 80.0), &rect(40.0, 40.0, 80.0, 80.0)));
        assert!(rects_overlap(&rect(40.0, 0.0, 80.0, 80.0), &rect(0.0, 0.0, 80.0, 80.0)));
        assert!(rects_overlap(&rect(10.0, 10.0, 5.0, 5.0), &rect(0.0, 0.0, 80.0, 80.0)));
    }

    #[test]
    fn touching_edges_do_not_collide() {
        let a = rect(0.0, 0.0, 80.0, 80.0);
        assert!(!rects_overlap(&a, &rect(80.0, 0.0, 80.0, 80.0)));
        assert!(!rects_overlap(&a, &rect(0.0, 80.0, 80.0, 80.0)));
        assert!(!rects_overlap(&rect(80.0, 0.0, 80.0, 80.0), &a));
        assert!(!rects_overlap(&a, &rect(80.0, 80.0, 10.0, 10.0)));
    }

    #[test]
    fn rounding_noise_on_shared_edges_is_ignored() {
        let cell = 206.4;
        let a = rect(24.0, 0.0, 3.0 * cell, 10.0);
        let b = rect(24.0 + 3.0 * cell - 1e-9, 0.0, cell, 10.0);
        assert!(!rects_overlap(&a, &b));
    }

    #[test]
    fn scan_skips_excluded_widget() {
        let candidate = rect(0.0, 0.0, 80.0, 80.0);
        let placed = vec![
            (WidgetId::new(1), rect(0.0, 0.0, 80.0, 80.0)),
            (WidgetId::new(2), rect(80.0, 0.0, 80.0, 80.0)),
        ];

        assert_eq!(
            CollisionIndex::first_overlap(&candidate, WidgetId::new(1), placed.clone()),
            None
        );
        assert_eq!(
            CollisionIndex::first_overlap(&candidate, WidgetId::new(3), placed.clone()),
            Some(WidgetId::new(1))
        );
        assert!(CollisionIndex.overlaps(&candidate, WidgetId::new(2), &mut placed.into_iter()));
    }
}
