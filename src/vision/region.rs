/// A pixel position in full-frame coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A rectangle in frame pixels. All zeros is the full-frame sentinel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const FULL: Region = Region {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a region relative to an anchor, saturating negative origins at 0.
    pub fn around(anchor: Point, dx: i32, dy: i32, width: u32, height: u32) -> Self {
        Self {
            x: (anchor.x + dx).max(0) as u32,
            y: (anchor.y + dy).max(0) as u32,
            width,
            height,
        }
    }

    pub fn is_full(&self) -> bool {
        *self == Region::FULL
    }

    /// Resolves the sentinel and clamps the rectangle into a `w`x`h` frame.
    pub fn resolve(&self, w: u32, h: u32) -> Region {
        if self.is_full() {
            return Region::new(0, 0, w, h);
        }
        let x = self.x.min(w);
        let y = self.y.min(h);
        Region {
            x,
            y,
            width: self.width.min(w - x),
            height: self.height.min(h - y),
        }
    }

    /// Moves the left edge right by `dx`, shrinking the width to keep the right edge.
    pub fn shifted_right(&self, dx: u32) -> Region {
        Region {
            x: self.x + dx,
            y: self.y,
            width: self.width.saturating_sub(dx),
            height: self.height,
        }
    }
}
