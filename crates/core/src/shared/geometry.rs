/// A point in frame pixel coordinates.
///
/// Carries the tracking seed: the center of the last confirmed face, or
/// the caller-supplied starting coordinates before the first detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned detection box in pixel coordinates.
///
/// The origin may be negative after eye-box expansion; consumers that
/// touch pixels clip to frame bounds first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FaceBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x as f64 + self.width as f64 / 2.0,
            y: self.y as f64 + self.height as f64 / 2.0,
        }
    }

    /// A box of this box's size whose center sits at `center`.
    ///
    /// The origin is rounded to whole pixels half-away-from-zero.
    pub fn recentered(&self, center: Point) -> FaceBox {
        FaceBox {
            x: (center.x - self.width as f64 / 2.0).round() as i32,
            y: (center.y - self.height as f64 / 2.0).round() as i32,
            width: self.width,
            height: self.height,
        }
    }

    /// Intersection with `[0, frame_width) x [0, frame_height)` as
    /// half-open pixel ranges `(x0..x1, y0..y1)`, empty ranges when the
    /// box lies entirely outside the frame.
    pub fn clipped_ranges(
        &self,
        frame_width: u32,
        frame_height: u32,
    ) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let x0 = self.x.clamp(0, frame_width as i32) as usize;
        let y0 = self.y.clamp(0, frame_height as i32) as usize;
        let x1 = self.x.saturating_add(self.width).clamp(0, frame_width as i32) as usize;
        let y1 = self
            .y
            .saturating_add(self.height)
            .clamp(0, frame_height as i32) as usize;
        (x0..x1.max(x0), y0..y1.max(y0))
    }
}
