use ndarray::s;

use crate::redaction::domain::frame_redactor::FrameRedactor;
use crate::shared::frame::Frame;
use crate::shared::geometry::FaceBox;

/// Overwrites the region with opaque black: every sample inside the
/// box, across all channels, becomes zero.
///
/// The box is clipped to the frame first, so regions produced by
/// eye-box expansion or interpolation near an edge write only the
/// visible part. In-place, no allocation.
pub struct OpaqueBoxRedactor;

impl FrameRedactor for OpaqueBoxRedactor {
    fn redact(
        &self,
        frame: &mut Frame,
        region: &FaceBox,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (xs, ys) = region.clipped_ranges(frame.width(), frame.height());
        if xs.is_empty() || ys.is_empty() {
            return Ok(());
        }
        let mut view = frame.as_ndarray_mut();
        view.slice_mut(s![ys, xs, ..]).fill(0);
        Ok(())
    }
}
