use serde::Deserialize;

/// Axis-aligned integer rectangle. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub(crate) const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub(crate) fn left(&self) -> i32 {
        self.x
    }

    pub(crate) fn right(&self) -> i32 {
        self.x + self.w
    }

    pub(crate) fn top(&self) -> i32 {
        self.y
    }

    pub(crate) fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub(crate) fn set_left(&mut self, left: i32) {
        self.x = left;
    }

    pub(crate) fn set_right(&mut self, right: i32) {
        self.x = right - self.w;
    }

    pub(crate) fn set_top(&mut self, top: i32) {
        self.y = top;
    }

    pub(crate) fn set_bottom(&mut self, bottom: i32) {
        self.y = bottom - self.h;
    }

    pub(crate) fn centre_x(&self) -> i32 {
        self.x + self.w / 2
    }

    pub(crate) fn centre_y(&self) -> i32 {
        self.y + self.h / 2
    }

    /// Strict overlap test; rectangles that only share an edge do not
    /// collide, and empty rectangles never collide.
    pub(crate) fn overlaps(&self, other: &Rect) -> bool {
        if self.w <= 0 || self.h <= 0 || other.w <= 0 || other.h <= 0 {
            return false;
        }
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Grows the rectangle by `dw` x `dh` while keeping its centre.
    pub(crate) fn inflate(&self, dw: i32, dh: i32) -> Rect {
        Rect::new(self.x - dw / 2, self.y - dh / 2, self.w + dw, self.h + dh)
    }
}
