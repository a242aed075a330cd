use crate::shared::geometry::{FaceBox, Point};

/// `count` evenly spaced points strictly between `from` and `to`.
///
/// Parameters are `k / (count + 1)` for `k = 1..=count`, so neither
/// endpoint is ever emitted and a single point lands at the midpoint.
pub fn interior_points(from: Point, to: Point, count: usize) -> Vec<Point> {
    let step = 1.0 / (count as f64 + 1.0);
    (1..=count)
        .map(|k| {
            let t = k as f64 * step;
            Point {
                x: from.x + (to.x - from.x) * t,
                y: from.y + (to.y - from.y) * t,
            }
        })
        .collect()
}

/// Boxes of `size`'s dimensions whose centers walk the straight line
/// from the prior seed to the newly confirmed center, one per buffered
/// frame.
pub fn boxes_along(from: Point, to: Point, size: FaceBox, count: usize) -> Vec<FaceBox> {
    interior_points(from, to, count)
        .into_iter()
        .map(|center| size.recentered(center))
        .collect()
}
