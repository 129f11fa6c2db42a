use super::region::Region;

/// Size all hard-coded offsets were measured at.
const REFERENCE_WIDTH: u32 = 1080;
const REFERENCE_HEIGHT: u32 = 1920;

/// Screen layout derived from the capture size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
}

impl ScreenGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 1600x2560 tablets use their own offsets, in either orientation.
    pub fn is_wide(&self) -> bool {
        matches!((self.width, self.height), (1600, 2560) | (2560, 1600))
    }

    pub fn top_half(&self) -> Region {
        Region::new(0, 0, self.width, self.height / 2)
    }

    pub fn bottom_half(&self) -> Region {
        Region::new(0, self.height / 2, self.width, self.height / 2)
    }

    pub fn middle(&self) -> Region {
        Region::new(0, self.height / 4, self.width, self.height / 2)
    }

    /// Right third of the upper two thirds, where stat-gain blocks appear.
    pub fn stat_gain_area(&self) -> Region {
        Region::new(
            self.width - self.width / 3,
            0,
            self.width / 3,
            self.height - self.height / 3,
        )
    }

    /// Scales a coordinate measured on a 1080-wide screen.
    pub fn rel(&self, px: i32) -> i32 {
        if self.width == REFERENCE_WIDTH {
            px
        } else {
            (f64::from(px) * f64::from(self.width) / f64::from(REFERENCE_WIDTH)) as i32
        }
    }

    /// Scales a vertical offset measured on a 1920-high screen.
    pub fn rel_y(&self, px: i32) -> i32 {
        if self.height == REFERENCE_HEIGHT {
            px
        } else {
            (f64::from(px) * f64::from(self.height) / f64::from(REFERENCE_HEIGHT)) as i32
        }
    }
}
