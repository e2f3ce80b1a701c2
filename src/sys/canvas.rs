use crate::model::{Insets, PixelSize};

/// Supplies the drawing surface the grid is laid out on.
pub trait CanvasProvider {
    fn current_canvas_size(&self) -> PixelSize;

    fn current_insets(&self) -> Insets;
}

/// A canvas whose size and insets only change when told to.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FixedCanvas {
    pub size: PixelSize,
    pub insets: Insets,
}

impl FixedCanvas {
    pub fn new(size: PixelSize, insets: Insets) -> Self { Self { size, insets } }

    /// Quarter turn: width and height swap and the insets follow the edges.
    pub fn rotated(&self) -> Self {
        Self {
            size: PixelSize::new(self.size.height, self.size.width),
            insets: Insets::new(
                self.insets.right,
                self.insets.top,
                self.insets.left,
                self.insets.bottom,
            ),
        }
    }
}

impl CanvasProvider for FixedCanvas {
    fn current_canvas_size(&self) -> PixelSize { self.size }

    fn current_insets(&self) -> Insets { self.insets }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_swaps_axes() {
        let canvas = FixedCanvas::new(
            PixelSize::new(1080.0, 2340.0),
            Insets::new(63.0, 0.0, 126.0, 0.0),
        );
        let rotated = canvas.rotated();
        assert_eq!(rotated.current_canvas_size(), PixelSize::new(2340.0, 1080.0));
        assert_eq!(rotated.current_insets(), Insets::new(0.0, 63.0, 0.0, 126.0));
        assert_eq!(rotated.rotated().rotated().rotated(), canvas);
    }
}
