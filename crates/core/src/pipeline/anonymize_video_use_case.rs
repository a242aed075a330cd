use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::detection::domain::cascade_detector::{CascadeDetector, ClassifierSet};
use crate::detection::domain::seed_provider::SeedProvider;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::redaction::domain::frame_redactor::FrameRedactor;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::tracking::config::TrackerConfig;
use crate::tracking::session::{SessionSummary, TrackingSession};
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Outcome of one anonymization run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnonymizeReport {
    /// Frames before the start offset, read and dropped.
    pub frames_skipped: usize,
    pub summary: SessionSummary,
    /// True when the run was stopped via the cancellation flag.
    pub cancelled: bool,
}

/// Orchestrates one video through seed → track → redact → encode.
///
/// Single-use: `execute` consumes the wired components. The loop is
/// strictly sequential (each frame's fate depends on the session state
/// its predecessors left behind), so the only concurrency story is
/// running separate use cases for separate videos.
pub struct AnonymizeVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    detector: Box<dyn CascadeDetector>,
    redactor: Box<dyn FrameRedactor>,
    seed_provider: Box<dyn SeedProvider>,
    classifiers: ClassifierSet,
    config: TrackerConfig,
    logger: Box<dyn PipelineLogger>,
    cancelled: Arc<AtomicBool>,
}

impl AnonymizeVideoUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        detector: Box<dyn CascadeDetector>,
        redactor: Box<dyn FrameRedactor>,
        seed_provider: Box<dyn SeedProvider>,
        classifiers: ClassifierSet,
        config: TrackerConfig,
        logger: Box<dyn PipelineLogger>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            reader,
            writer,
            detector,
            redactor,
            seed_provider,
            classifiers,
            config,
            logger,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    /// Runs the pipeline against an already-opened reader.
    ///
    /// `metadata` is what the reader reported from `open`. Configuration
    /// problems surface before the output file is touched.
    pub fn execute(
        self,
        metadata: &VideoMetadata,
        output_path: &Path,
    ) -> Result<AnonymizeReport, Box<dyn std::error::Error>> {
        let Self {
            mut reader,
            mut writer,
            mut detector,
            redactor,
            mut seed_provider,
            classifiers,
            config,
            mut logger,
            cancelled,
        } = self;

        config.validate()?;
        if metadata.fps <= 0.0 {
            return Err("input reports no frame rate; cannot bound the detection gap".into());
        }

        writer.open(output_path, metadata)?;

        let result = run_loop(
            reader.as_mut(),
            writer.as_mut(),
            detector.as_mut(),
            redactor.as_ref(),
            seed_provider.as_mut(),
            classifiers,
            &config,
            logger.as_mut(),
            &cancelled,
            metadata,
        );

        reader.close();
        let close_result = writer.close();

        let report = result?;
        close_result?;

        if report.summary.frames_discarded > 0 {
            let reason = if report.cancelled {
                "run cancelled"
            } else {
                "stream ended"
            };
            logger.warn(&format!(
                "{reason} during an unresolved detection gap: {} trailing frame(s) dropped from \
                 the output",
                report.summary.frames_discarded
            ));
        }
        logger.info(&format!(
            "emitted {} frame(s), {} interpolated, {} skipped before start offset",
            report.summary.frames_emitted, report.summary.frames_interpolated, report.frames_skipped
        ));

        Ok(report)
    }
}

#[allow(clippy::too_many_arguments)]
fn run_loop(
    reader: &mut dyn VideoReader,
    writer: &mut dyn VideoWriter,
    detector: &mut dyn CascadeDetector,
    redactor: &dyn FrameRedactor,
    seed_provider: &mut dyn SeedProvider,
    classifiers: ClassifierSet,
    config: &TrackerConfig,
    logger: &mut dyn PipelineLogger,
    cancelled: &AtomicBool,
    metadata: &VideoMetadata,
) -> Result<AnonymizeReport, Box<dyn std::error::Error>> {
    let start_frames = metadata.frames_spanning(config.start_offset_seconds);
    let expected = metadata.total_frames.saturating_sub(start_frames);

    let mut frames = reader.frames();

    // Drop everything before the start offset; the first retained frame
    // is the one the seed provider sees.
    let mut frames_skipped = 0usize;
    let mut first_frame: Option<Frame> = None;
    for result in &mut frames {
        let frame = result?;
        if frame.index() < start_frames {
            frames_skipped += 1;
            continue;
        }
        first_frame = Some(frame);
        break;
    }

    let Some(first_frame) = first_frame else {
        return Ok(AnonymizeReport {
            frames_skipped,
            summary: SessionSummary::default(),
            cancelled: false,
        });
    };

    let seed = seed_provider.provide(&first_frame)?;
    let mut session = TrackingSession::new(config, metadata, classifiers, seed)?;

    let mut emitted = 0usize;
    let mut was_cancelled = false;
    {
        let mut sink = |frame: Frame| -> Result<(), Box<dyn std::error::Error>> {
            writer.write(&frame)?;
            emitted += 1;
            logger.progress(emitted, expected);
            Ok(())
        };

        session.process(first_frame, detector, redactor, &mut sink)?;
        for result in frames {
            if cancelled.load(Ordering::Relaxed) {
                was_cancelled = true;
                break;
            }
            let frame = result?;
            session.process(frame, detector, redactor, &mut sink)?;
        }
    }

    Ok(AnonymizeReport {
        frames_skipped,
        summary: session.finish(),
        cancelled: was_cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::cascade_detector::{ClassifierKind, ClassifierSpec};
    use crate::detection::domain::seed_provider::FixedSeedProvider;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::redaction::infrastructure::opaque_box_redactor::OpaqueBoxRedactor;
    use crate::shared::frame::GrayFrame;
    use crate::shared::geometry::{FaceBox, Point};
    use crate::tracking::error::TrackingError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const W: u32 = 100;
    const H: u32 = 100;

    // --- Stubs ---

    struct StubReader {
        frames: Vec<Frame>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubReader {
        fn new(frames: Vec<Frame>) -> Self {
            Self {
                frames,
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Ok(metadata(self.frames.len(), 30.0))
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(self.frames.drain(..).map(Ok))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    struct StubWriter {
        written: Arc<Mutex<Vec<Frame>>>,
        opened: Arc<Mutex<bool>>,
    }

    impl StubWriter {
        fn new() -> Self {
            Self {
                written: Arc::new(Mutex::new(Vec::new())),
                opened: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoWriter for StubWriter {
        fn open(
            &mut self,
            _path: &Path,
            _metadata: &VideoMetadata,
        ) -> Result<(), Box<dyn std::error::Error>> {
            *self.opened.lock().unwrap() = true;
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.written.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
    }

    /// Detector scripted by processed-frame ordinal (one classifier in
    /// the set means one detect call per frame).
    struct ScriptedDetector {
        per_call: HashMap<usize, Vec<FaceBox>>,
        calls: usize,
    }

    impl ScriptedDetector {
        fn new(per_call: HashMap<usize, Vec<FaceBox>>) -> Self {
            Self {
                per_call,
                calls: 0,
            }
        }

        fn always(face: FaceBox, frames: usize) -> Self {
            Self::new((0..frames).map(|i| (i, vec![face])).collect())
        }
    }

    impl CascadeDetector for ScriptedDetector {
        fn detect(
            &mut self,
            _gray: &GrayFrame,
            _classifier: &str,
            _scale: f64,
            _min_neighbors: i32,
        ) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
            let hits = self.per_call.get(&self.calls).cloned().unwrap_or_default();
            self.calls += 1;
            Ok(hits)
        }
    }

    struct RecordingLogger {
        warnings: Arc<Mutex<Vec<String>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, _current: usize, _total: usize) {}
        fn info(&mut self, _message: &str) {}
        fn warn(&mut self, message: &str) {
            self.warnings.lock().unwrap().push(message.to_string());
        }
    }

    // --- Helpers ---

    fn metadata(total: usize, fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: W,
            height: H,
            fps,
            total_frames: total,
            codec: String::new(),
            source_path: None,
        }
    }

    fn make_frames(count: usize) -> Vec<Frame> {
        (0..count)
            .map(|i| Frame::new(vec![200u8; (W * H * 3) as usize], W, H, 3, i))
            .collect()
    }

    fn config_from_frame_zero() -> TrackerConfig {
        TrackerConfig {
            start_offset_seconds: 0.0,
            ..Default::default()
        }
    }

    /// 10x10 box centered on (50,50): passes both size bounds for a
    /// 100 px frame and sits exactly on the test seed.
    fn centered_face() -> FaceBox {
        FaceBox::new(45, 45, 10, 10)
    }

    fn build_use_case(
        frames: Vec<Frame>,
        detector: ScriptedDetector,
        config: TrackerConfig,
    ) -> (AnonymizeVideoUseCase, Arc<Mutex<Vec<Frame>>>) {
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let uc = AnonymizeVideoUseCase::new(
            Box::new(StubReader::new(frames)),
            Box::new(writer),
            Box::new(detector),
            Box::new(OpaqueBoxRedactor),
            Box::new(FixedSeedProvider::new(Point::new(50.0, 50.0))),
            single_classifier_set(),
            config,
            Box::new(NullPipelineLogger),
            None,
        );
        (uc, written)
    }

    fn single_classifier_set() -> ClassifierSet {
        ClassifierSet::new(vec![ClassifierSpec::new("face", ClassifierKind::Face)])
    }

    // --- Tests ---

    #[test]
    fn test_processes_all_frames_in_order() {
        let detector = ScriptedDetector::always(centered_face(), 5);
        let (uc, written) = build_use_case(make_frames(5), detector, config_from_frame_zero());

        let report = uc
            .execute(&metadata(5, 30.0), Path::new("/tmp/out.mp4"))
            .unwrap();

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 5);
        for (i, frame) in written.iter().enumerate() {
            assert_eq!(frame.index(), i);
        }
        assert_eq!(report.summary.frames_emitted, 5);
        assert_eq!(report.frames_skipped, 0);
    }

    #[test]
    fn test_emitted_frames_are_redacted() {
        let detector = ScriptedDetector::always(centered_face(), 1);
        let (uc, written) = build_use_case(make_frames(1), detector, config_from_frame_zero());

        uc.execute(&metadata(1, 30.0), Path::new("/tmp/out.mp4"))
            .unwrap();

        let written = written.lock().unwrap();
        let view = written[0].as_ndarray();
        for c in 0..3 {
            assert_eq!(view[[50, 50, c]], 0);
        }
        assert_eq!(view[[50, 60, 0]], 200);
    }

    #[test]
    fn test_start_offset_skips_leading_frames() {
        // 30 fps, 0.1 s offset -> 3 frames skipped.
        let config = TrackerConfig {
            start_offset_seconds: 0.1,
            ..Default::default()
        };
        // Detection succeeds on every processed frame (calls start at
        // the first retained frame).
        let detector = ScriptedDetector::always(centered_face(), 7);
        let (uc, written) = build_use_case(make_frames(10), detector, config);

        let report = uc
            .execute(&metadata(10, 30.0), Path::new("/tmp/out.mp4"))
            .unwrap();

        assert_eq!(report.frames_skipped, 3);
        let written = written.lock().unwrap();
        assert_eq!(written.len(), 7);
        assert_eq!(written[0].index(), 3);
    }

    #[test]
    fn test_gap_is_interpolated_and_order_preserved() {
        // Frames 0 and 4 detect; 1-3 are gap-filled. The second center
        // (52,50) stays within tolerance of the seed at (50,50).
        let detector = ScriptedDetector::new(HashMap::from([
            (0, vec![centered_face()]),
            (4, vec![FaceBox::new(47, 45, 10, 10)]),
        ]));
        let (uc, written) = build_use_case(make_frames(5), detector, config_from_frame_zero());

        let report = uc
            .execute(&metadata(5, 30.0), Path::new("/tmp/out.mp4"))
            .unwrap();

        assert_eq!(report.summary.frames_emitted, 5);
        assert_eq!(report.summary.frames_interpolated, 3);
        let written = written.lock().unwrap();
        let indices: Vec<usize> = written.iter().map(|f| f.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_trailing_gap_discards_frames_and_warns() {
        // Only frame 0 detects; 1 and 2 stay unresolved at stream end.
        let detector = ScriptedDetector::new(HashMap::from([(0, vec![centered_face()])]));
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let warnings = Arc::new(Mutex::new(Vec::new()));
        let uc = AnonymizeVideoUseCase::new(
            Box::new(StubReader::new(make_frames(3))),
            Box::new(writer),
            Box::new(detector),
            Box::new(OpaqueBoxRedactor),
            Box::new(FixedSeedProvider::new(Point::new(50.0, 50.0))),
            single_classifier_set(),
            config_from_frame_zero(),
            Box::new(RecordingLogger {
                warnings: warnings.clone(),
            }),
            None,
        );

        let report = uc
            .execute(&metadata(3, 30.0), Path::new("/tmp/out.mp4"))
            .unwrap();

        assert_eq!(report.summary.frames_discarded, 2);
        assert_eq!(written.lock().unwrap().len(), 1);
        let warnings = warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("2 trailing frame(s)"));
    }

    #[test]
    fn test_tracking_lost_propagates() {
        // No detections at all; 30 fps * 2 s bound = 60, so feed 61
        // undetectable frames after the seed frame.
        let detector = ScriptedDetector::new(HashMap::new());
        let (uc, _written) = build_use_case(make_frames(62), detector, config_from_frame_zero());

        let err = uc
            .execute(&metadata(62, 30.0), Path::new("/tmp/out.mp4"))
            .unwrap_err();
        let tracking = err.downcast_ref::<TrackingError>().unwrap();
        assert!(matches!(tracking, TrackingError::TrackingLost { .. }));
    }

    #[test]
    fn test_invalid_config_fails_before_output_opened() {
        let config = TrackerConfig {
            min_size_fraction: 0.5,
            max_size_fraction: 0.1,
            start_offset_seconds: 0.0,
            ..Default::default()
        };
        let writer = StubWriter::new();
        let opened = writer.opened.clone();
        let uc = AnonymizeVideoUseCase::new(
            Box::new(StubReader::new(make_frames(2))),
            Box::new(writer),
            Box::new(ScriptedDetector::new(HashMap::new())),
            Box::new(OpaqueBoxRedactor),
            Box::new(FixedSeedProvider::new(Point::new(50.0, 50.0))),
            single_classifier_set(),
            config,
            Box::new(NullPipelineLogger),
            None,
        );

        assert!(uc
            .execute(&metadata(2, 30.0), Path::new("/tmp/out.mp4"))
            .is_err());
        assert!(!*opened.lock().unwrap());
    }

    #[test]
    fn test_zero_fps_rejected() {
        let (uc, _) = build_use_case(
            make_frames(2),
            ScriptedDetector::new(HashMap::new()),
            config_from_frame_zero(),
        );
        assert!(uc
            .execute(&metadata(2, 0.0), Path::new("/tmp/out.mp4"))
            .is_err());
    }

    #[test]
    fn test_empty_video_reports_nothing_emitted() {
        let (uc, written) = build_use_case(
            Vec::new(),
            ScriptedDetector::new(HashMap::new()),
            config_from_frame_zero(),
        );
        let report = uc
            .execute(&metadata(0, 30.0), Path::new("/tmp/out.mp4"))
            .unwrap();
        assert_eq!(report.summary, SessionSummary::default());
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stream_shorter_than_offset_emits_nothing() {
        let config = TrackerConfig {
            start_offset_seconds: 1.0, // 30 frames at 30 fps
            ..Default::default()
        };
        let (uc, written) = build_use_case(make_frames(5), ScriptedDetector::new(HashMap::new()), config);
        let report = uc
            .execute(&metadata(5, 30.0), Path::new("/tmp/out.mp4"))
            .unwrap();
        assert_eq!(report.frames_skipped, 5);
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cancellation_stops_between_frames() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let detector = ScriptedDetector::always(centered_face(), 10);
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let uc = AnonymizeVideoUseCase::new(
            Box::new(StubReader::new(make_frames(10))),
            Box::new(writer),
            Box::new(detector),
            Box::new(OpaqueBoxRedactor),
            Box::new(FixedSeedProvider::new(Point::new(50.0, 50.0))),
            single_classifier_set(),
            config_from_frame_zero(),
            Box::new(NullPipelineLogger),
            Some(cancelled.clone()),
        );

        // Cancel before the run starts: only the first frame (processed
        // ahead of the flag check) goes through.
        cancelled.store(true, Ordering::Relaxed);
        let report = uc
            .execute(&metadata(10, 30.0), Path::new("/tmp/out.mp4"))
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(written.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_closes_reader_after_run() {
        let reader = StubReader::new(make_frames(2));
        let closed = reader.closed.clone();
        let uc = AnonymizeVideoUseCase::new(
            Box::new(reader),
            Box::new(StubWriter::new()),
            Box::new(ScriptedDetector::always(centered_face(), 2)),
            Box::new(OpaqueBoxRedactor),
            Box::new(FixedSeedProvider::new(Point::new(50.0, 50.0))),
            single_classifier_set(),
            config_from_frame_zero(),
            Box::new(NullPipelineLogger),
            None,
        );
        uc.execute(&metadata(2, 30.0), Path::new("/tmp/out.mp4"))
            .unwrap();
        assert!(*closed.lock().unwrap());
    }

    #[test]
    fn test_repeat_run_is_byte_identical() {
        let run = || {
            let detector = ScriptedDetector::new(HashMap::from([
                (0, vec![centered_face()]),
                (3, vec![FaceBox::new(47, 47, 10, 10)]),
            ]));
            let (uc, written) = build_use_case(make_frames(4), detector, config_from_frame_zero());
            uc.execute(&metadata(4, 30.0), Path::new("/tmp/out.mp4"))
                .unwrap();
            let frames = written.lock().unwrap();
            frames.iter().map(|f| f.data().to_vec()).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
