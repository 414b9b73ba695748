mod renderer;
mod surface;

pub use renderer::{FrameStats, Renderer};
pub use surface::{BlitParams, FrameBuffer, OutputSurface};

/// Rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl ScreenRect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.w as i32)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Overlapping area, or `None` when the rectangles do not overlap.
    pub fn intersect(&self, other: &ScreenRect) -> Option<ScreenRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if x >= right || y >= bottom {
            return None;
        }
        Some(ScreenRect::new(x, y, (right - x) as u32, (bottom - y) as u32))
    }

    pub fn contains_rect(&self, other: &ScreenRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Screen rectangles waiting to be repainted.
///
/// Rectangles covered by another pending one are dropped, so a full repaint
/// request collapses everything queued before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyRegion {
    rects: Vec<ScreenRect>,
}

impl DirtyRegion {
    pub fn add(&mut self, rect: ScreenRect) {
        if rect.is_empty() || self.rects.iter().any(|pending| pending.contains_rect(&rect)) {
            return;
        }
        self.rects.retain(|pending| !rect.contains_rect(pending));
        self.rects.push(rect);
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn rects(&self) -> &[ScreenRect] {
        &self.rects
    }

    pub fn take(&mut self) -> Vec<ScreenRect> {
        std::mem::take(&mut self.rects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_is_empty_for_touching_rects() {
        let a = ScreenRect::new(0, 0, 10, 10);
        assert_eq!(a.intersect(&ScreenRect::new(10, 0, 5, 5)), None);
        assert_eq!(
            a.intersect(&ScreenRect::new(-5, 4, 8, 20)),
            Some(ScreenRect::new(0, 4, 3, 6))
        );
    }

    #[test]
    fn covered_dirty_rects_collapse_into_their_cover() {
        let mut region = DirtyRegion::default();
        region.add(ScreenRect::new(2, 2, 4, 4));
        region.add(ScreenRect::new(3, 3, 1, 1));
        region.add(ScreenRect::new(20, 0, 2, 2));
        assert_eq!(region.rects().len(), 2);

        region.add(ScreenRect::new(0, 0, 100, 100));
        assert_eq!(region.take(), vec![ScreenRect::new(0, 0, 100, 100)]);
        assert!(region.is_empty());

        region.add(ScreenRect::new(0, 0, 0, 5));
        assert!(region.is_empty());
    }
}
