use crate::shared::geometry::FaceBox;

/// Accepts or rejects a selected box by absolute pixel size.
///
/// Thresholds are derived once per session from the frame width and the
/// configured min/max fractions; per-frame validation is then two
/// integer comparisons. A missing box is always invalid.
#[derive(Clone, Copy, Debug)]
pub struct SizeValidator {
    min_pixels: i32,
    max_pixels: i32,
}

impl SizeValidator {
    pub fn from_frame_width(frame_width: u32, min_fraction: f64, max_fraction: f64) -> Self {
        Self {
            min_pixels: (frame_width as f64 * min_fraction).round() as i32,
            max_pixels: (frame_width as f64 * max_fraction).round() as i32,
        }
    }

    pub fn accepts(&self, candidate: Option<&FaceBox>) -> bool {
        let Some(b) = candidate else {
            return false;
        };
        let smaller = b.width.min(b.height);
        let larger = b.width.max(b.height);
        smaller >= self.min_pixels && larger <= self.max_pixels
    }
}
