use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Number of frames covering `seconds` of this stream, rounded to
    /// the nearest whole frame. Used for the detection-gap bound and
    /// the start offset.
    pub fn frames_spanning(&self, seconds: f64) -> usize {
        (seconds * self.fps).round().max(0.0) as usize
    }
}
