use crate::detection::domain::candidate_selector::CandidateSelector;
use crate::detection::domain::cascade_detector::{CascadeDetector, ClassifierSet};
use crate::detection::domain::size_validator::SizeValidator;
use crate::redaction::domain::frame_redactor::FrameRedactor;
use crate::shared::frame::Frame;
use crate::shared::geometry::{FaceBox, Point};
use crate::shared::video_metadata::VideoMetadata;
use crate::tracking::config::{ConfigError, TrackerConfig};
use crate::tracking::error::TrackingError;
use crate::tracking::gap_buffer::GapBuffer;
use crate::tracking::interpolator;

/// Counters reported when a session ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Frames emitted with a redaction box (direct or interpolated).
    pub frames_emitted: usize,
    /// Subset of emitted frames whose box was interpolated.
    pub frames_interpolated: usize,
    /// Frames still buffered when the stream ended, dropped because no
    /// later detection exists to interpolate toward.
    pub frames_discarded: usize,
}

/// Tracks one face through one video.
///
/// Owns the only cross-frame state: the seed (last confirmed face
/// center) and the gap buffer. Frames go in one at a time in arrival
/// order; redacted frames come out through the sink, also in arrival
/// order. Strictly sequential; every frame's fate depends on the
/// buffer and seed left behind by its predecessors.
pub struct TrackingSession {
    seed: Point,
    buffer: GapBuffer,
    selector: CandidateSelector,
    validator: SizeValidator,
    classifiers: ClassifierSet,
    scale: f64,
    min_neighbors: i32,
    frames_emitted: usize,
    frames_interpolated: usize,
}

impl TrackingSession {
    /// Builds a session for one video. Configuration problems surface
    /// here, before any frame is processed.
    pub fn new(
        config: &TrackerConfig,
        metadata: &VideoMetadata,
        classifiers: ClassifierSet,
        seed: Point,
    ) -> Result<Self, TrackingError> {
        config.validate()?;
        if seed.x <= 0.0
            || seed.y <= 0.0
            || seed.x >= metadata.width as f64
            || seed.y >= metadata.height as f64
        {
            return Err(ConfigError::SeedOutOfBounds {
                x: seed.x,
                y: seed.y,
                width: metadata.width,
                height: metadata.height,
            }
            .into());
        }

        let max_gap_frames = metadata.frames_spanning(config.max_gap_seconds);
        Ok(Self {
            seed,
            buffer: GapBuffer::new(max_gap_frames),
            selector: CandidateSelector::new(config.tolerance),
            validator: SizeValidator::from_frame_width(
                metadata.width,
                config.min_size_fraction,
                config.max_size_fraction,
            ),
            classifiers,
            scale: config.scale,
            min_neighbors: config.min_neighbors,
            frames_emitted: 0,
            frames_interpolated: 0,
        })
    }

    pub fn seed(&self) -> Point {
        self.seed
    }

    /// Frames currently held for an unresolved gap.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Runs one frame through detect → select → validate and either
    /// buffers it or resolves the current gap and emits.
    ///
    /// Emitted frames are passed to `sink` strictly in arrival order. A
    /// `TrackingError::TrackingLost` return is terminal for the session.
    pub fn process(
        &mut self,
        frame: Frame,
        detector: &mut dyn CascadeDetector,
        redactor: &dyn FrameRedactor,
        sink: &mut dyn FnMut(Frame) -> Result<(), Box<dyn std::error::Error>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(err) = self.buffer.overflow_error() {
            return Err(err.into());
        }

        let gray = frame.to_gray();
        let candidate = self.selector.select(
            &gray,
            detector,
            &self.classifiers,
            self.seed,
            self.scale,
            self.min_neighbors,
        )?;

        if self.validator.accepts(candidate.as_ref()) {
            let face = candidate.expect("validator accepts only Some");
            self.resolve(frame, face, redactor, sink)
        } else {
            self.buffer.push(frame)?;
            Ok(())
        }
    }

    /// Ends the session, reporting totals. Any frames still buffered
    /// are dropped: without a closing detection there is nothing to
    /// interpolate toward, and guessing would redact blindly. The
    /// caller surfaces the discard count as a diagnostic.
    pub fn finish(mut self) -> SessionSummary {
        let discarded = self.buffer.drain().len();
        SessionSummary {
            frames_emitted: self.frames_emitted,
            frames_interpolated: self.frames_interpolated,
            frames_discarded: discarded,
        }
    }

    fn resolve(
        &mut self,
        mut frame: Frame,
        face: FaceBox,
        redactor: &dyn FrameRedactor,
        sink: &mut dyn FnMut(Frame) -> Result<(), Box<dyn std::error::Error>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        redactor.redact(&mut frame, &face)?;
        let confirmed = face.center();

        let pending = self.buffer.drain();
        if !pending.is_empty() {
            let count = pending.len();
            log::debug!("gap resolved at frame {}: interpolating {count} frame(s)", frame.index());
            let boxes = interpolator::boxes_along(self.seed, confirmed, face, count);
            for (mut buffered, interpolated) in pending.into_iter().zip(boxes) {
                redactor.redact(&mut buffered, &interpolated)?;
                self.frames_interpolated += 1;
                self.frames_emitted += 1;
                sink(buffered)?;
            }
        }

        self.seed = confirmed;
        self.frames_emitted += 1;
        sink(frame)?;
        Ok(())
    }
}
