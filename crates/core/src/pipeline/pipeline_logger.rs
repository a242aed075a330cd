/// Observer for pipeline-level events.
///
/// Keeps the use case free of any particular output mechanism: the CLI
/// routes events through the `log` facade, tests and embedders can
/// capture or discard them.
pub trait PipelineLogger: Send {
    /// Frame-level progress: `current` frames emitted out of `total`
    /// expected (0 when the container does not report a count).
    fn progress(&mut self, current: usize, total: usize);

    /// Human-readable status message.
    fn info(&mut self, message: &str);

    /// Diagnostic for degraded-but-continuing situations, e.g. trailing
    /// frames dropped at stream end.
    fn warn(&mut self, message: &str);
}

/// Logger that discards every event. For tests and embedders with
/// their own progress reporting.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn info(&mut self, _message: &str) {}
    fn warn(&mut self, _message: &str) {}
}

/// Logger that routes events through the `log` facade, throttling
/// progress lines to every `throttle_frames` frames so long videos do
/// not flood the output.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
        }
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        let at_end = total > 0 && current == total;
        if current % self.throttle_frames == 0 || at_end {
            if total > 0 {
                let pct = current as f64 / total as f64 * 100.0;
                log::info!("anonymizing: {current}/{total} frames ({pct:.1}%)");
            } else {
                log::info!("anonymizing: {current} frames");
            }
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn warn(&mut self, message: &str) {
        log::warn!("{message}");
    }
}
