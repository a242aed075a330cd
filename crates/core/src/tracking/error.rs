use thiserror::Error;

use crate::tracking::config::ConfigError;

/// Fatal session errors. Everything else the detector can do (return
/// nothing, return candidates that miss the seed or fail the size
/// bounds) is an expected outcome handled by buffering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackingError {
    #[error(
        "tracking lost at frame {frame_index}: more than {max_gap_frames} consecutive frames \
         without a valid face detection near the seed"
    )]
    TrackingLost {
        /// Source index of the frame that overflowed the gap buffer.
        frame_index: usize,
        /// The configured buffer bound that was exceeded.
        max_gap_frames: usize,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
