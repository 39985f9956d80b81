use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::ProgressBar;
use log::{info, warn};

use crate::detector::FeatureExtractor;
use crate::engine::{EngineConfig, KeyframeEngine};
use crate::error::{Result, SummarizeError};
use crate::frame_source::FrameSource;
use crate::io::KeyframeSink;
use crate::matcher::DescriptorMatcher;

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub engine: EngineConfig,
    /// Only frames with `index % frame_step == 0` are evaluated.
    pub frame_step: usize,
    /// Show a progress spinner while processing.
    pub progress: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            frame_step: 3,
            progress: false,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        if self.frame_step == 0 {
            return Err(SummarizeError::Config("frame step must be positive".into()));
        }
        Ok(())
    }
}

/// Totals accumulated over one stream run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub frames_seen: u64,
    pub frames_evaluated: u64,
    /// Indices of confirmed keyframes, in stream order.
    pub keyframes: Vec<u64>,
    /// Keyframes that were actually written; persistence failures leave the
    /// decision intact, so this can lag `keyframes.len()`.
    pub keyframes_saved: usize,
}

/// Drives the per-frame loop: acquisition, stride, feature extraction, the
/// decision engine, and keyframe persistence.
pub struct StreamController {
    source: Box<dyn FrameSource>,
    extractor: Box<dyn FeatureExtractor>,
    matcher: Box<dyn DescriptorMatcher>,
    sink: Box<dyn KeyframeSink>,
    engine: KeyframeEngine,
    frame_step: usize,
    progress: bool,
    cancel: Arc<AtomicBool>,
}

impl StreamController {
    pub fn new(
        config: StreamConfig,
        source: Box<dyn FrameSource>,
        extractor: Box<dyn FeatureExtractor>,
        matcher: Box<dyn DescriptorMatcher>,
        sink: Box<dyn KeyframeSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            extractor,
            matcher,
            sink,
            engine: KeyframeEngine::new(config.engine),
            frame_step: config.frame_step,
            progress: config.progress,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shared stop flag, checked once per frame boundary. Setting it lets
    /// the current frame finish and then ends the run cleanly.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn run(&mut self) -> Result<RunSummary> {
        let bar = if self.progress {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };

        let mut summary = RunSummary::default();
        let mut frame_index: u64 = 0;

        loop {
            if self.cancel.load(Ordering::SeqCst) {
                info!("stop requested, ending stream after {frame_index} frames");
                break;
            }
            let Some(image) = self.source.next_frame()? else {
                info!("no more frames to process");
                break;
            };

            if frame_index % self.frame_step as u64 == 0 {
                let gray = image.to_luma8();
                let features = self.extractor.detect(&gray, frame_index);
                let decision = self.engine.evaluate(features, self.matcher.as_ref());
                summary.frames_evaluated += 1;

                if decision.is_keyframe {
                    summary.keyframes.push(frame_index);
                    match self.sink.persist(&image, frame_index) {
                        Ok(path) => {
                            info!("saved {}", path.display());
                            summary.keyframes_saved += 1;
                        }
                        // The decision stands; only the write is lost.
                        Err(e) => warn!("failed to save keyframe {frame_index}: {e}"),
                    }
                }
            }

            frame_index += 1;
            summary.frames_seen = frame_index;
            bar.set_message(format!(
                "frame {} ({} keyframes)",
                frame_index,
                summary.keyframes.len()
            ));
            bar.tick();
        }

        bar.finish_and_clear();
        Ok(summary)
    }
}
