use thiserror::Error;

pub const DEFAULT_SCALE: f64 = 1.05;
pub const DEFAULT_MIN_NEIGHBORS: i32 = 1;
pub const DEFAULT_TOLERANCE: f64 = 0.1;
pub const DEFAULT_MIN_SIZE_FRACTION: f64 = 0.03;
pub const DEFAULT_MAX_SIZE_FRACTION: f64 = 0.1;
pub const DEFAULT_MAX_GAP_SECONDS: f64 = 2.0;
pub const DEFAULT_START_OFFSET_SECONDS: f64 = 5.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("tolerance must be positive, got {0}")]
    NonPositiveTolerance(f64),
    #[error("detection scale must be greater than 1.0, got {0}")]
    ScaleTooSmall(f64),
    #[error("minimum neighbor count must be at least 1, got {0}")]
    TooFewNeighbors(i32),
    #[error("size bounds inverted or empty: min fraction {min} must be positive and below max fraction {max}")]
    SizeBoundsInverted { min: f64, max: f64 },
    #[error("maximum gap must be positive, got {0} seconds")]
    NonPositiveGap(f64),
    #[error("start offset must not be negative, got {0} seconds")]
    NegativeStartOffset(f64),
    #[error("seed ({x}, {y}) lies outside the frame ({width}x{height})")]
    SeedOutOfBounds {
        x: f64,
        y: f64,
        width: u32,
        height: u32,
    },
}

/// Per-session tracking parameters.
///
/// Validated as a whole before any frame is processed; a bad value is a
/// caller error, never a mid-stream surprise.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Detection pyramid step; closer to 1 scans more finely.
    pub scale: f64,
    /// Neighboring hits a cascade candidate needs to count at all.
    pub min_neighbors: i32,
    /// Maximum seed-normalized distance for accepting a candidate.
    pub tolerance: f64,
    /// Smallest acceptable box dimension, as a fraction of frame width.
    pub min_size_fraction: f64,
    /// Largest acceptable box dimension, as a fraction of frame width.
    pub max_size_fraction: f64,
    /// Longest tolerated run without a confirmed detection.
    pub max_gap_seconds: f64,
    /// Seconds of video dropped before tracking begins.
    pub start_offset_seconds: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            tolerance: DEFAULT_TOLERANCE,
            min_size_fraction: DEFAULT_MIN_SIZE_FRACTION,
            max_size_fraction: DEFAULT_MAX_SIZE_FRACTION,
            max_gap_seconds: DEFAULT_MAX_GAP_SECONDS,
            start_offset_seconds: DEFAULT_START_OFFSET_SECONDS,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tolerance <= 0.0 {
            return Err(ConfigError::NonPositiveTolerance(self.tolerance));
        }
        if self.scale <= 1.0 {
            return Err(ConfigError::ScaleTooSmall(self.scale));
        }
        if self.min_neighbors < 1 {
            return Err(ConfigError::TooFewNeighbors(self.min_neighbors));
        }
        if self.min_size_fraction <= 0.0 || self.min_size_fraction >= self.max_size_fraction {
            return Err(ConfigError::SizeBoundsInverted {
                min: self.min_size_fraction,
                max: self.max_size_fraction,
            });
        }
        if self.max_gap_seconds <= 0.0 {
            return Err(ConfigError::NonPositiveGap(self.max_gap_seconds));
        }
        if self.start_offset_seconds < 0.0 {
            return Err(ConfigError::NegativeStartOffset(self.start_offset_seconds));
        }
        Ok(())
    }
}
