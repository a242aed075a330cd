use crate::shared::frame::Frame;
use crate::shared::geometry::FaceBox;

/// Stamps a redaction over one region of a frame.
///
/// Implementations mutate the frame in place and must tolerate regions
/// that extend past the frame edges.
pub trait FrameRedactor: Send {
    fn redact(
        &self,
        frame: &mut Frame,
        region: &FaceBox,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
