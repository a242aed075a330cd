use crate::shared::frame::Frame;
use crate::shared::geometry::Point;

/// Supplies the initial tracking seed for a session.
///
/// The pipeline requests a seed for the first frame it will process and
/// waits for the answer; implementations may consult the caller, a
/// configuration value, or an interactive picker. No ambient state is
/// involved.
pub trait SeedProvider: Send {
    fn provide(&mut self, frame: &Frame) -> Result<Point, Box<dyn std::error::Error>>;
}

/// Seed provider that returns caller-supplied coordinates.
pub struct FixedSeedProvider {
    point: Point,
}

impl FixedSeedProvider {
    pub fn new(point: Point) -> Self {
        Self { point }
    }
}

impl SeedProvider for FixedSeedProvider {
    fn provide(&mut self, _frame: &Frame) -> Result<Point, Box<dyn std::error::Error>> {
        Ok(self.point)
    }
}
