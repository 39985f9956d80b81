use log::debug;

use crate::baseline::MatchBaseline;
use crate::error::{Result, SummarizeError};
use crate::matcher::DescriptorMatcher;
use crate::scoring::count_good_matches;
use crate::types::FrameFeatures;

/// Phase of the decision machine.
///
/// The machine starts in `Warmup` and flips to `Steady` once enough frames
/// have been evaluated for the baseline to stabilize. The transition is
/// one-way and happens exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Warmup,
    Steady,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Relative deviation from the baseline average above which a frame
    /// becomes a candidate keyframe.
    pub sensitivity_threshold: f64,
    /// Relative deviation from the last committed keyframe above which a
    /// candidate is confirmed.
    pub noise_threshold: f64,
    /// Maximum normalized descriptor distance for a match to count as good.
    pub distance_threshold: f32,
    /// Baseline window length, in evaluated frames.
    pub window_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sensitivity_threshold: 0.4,
            noise_threshold: 0.8,
            distance_threshold: 0.2,
            window_len: 30,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sensitivity_threshold <= 0.0 {
            return Err(SummarizeError::Config(
                "sensitivity threshold must be positive".into(),
            ));
        }
        if self.noise_threshold <= 0.0 {
            return Err(SummarizeError::Config(
                "noise threshold must be positive".into(),
            ));
        }
        if self.distance_threshold <= 0.0 {
            return Err(SummarizeError::Config(
                "match distance threshold must be positive".into(),
            ));
        }
        if self.window_len == 0 {
            return Err(SummarizeError::Config(
                "baseline window length must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Outcome of one evaluated frame, with the intermediate statistics that
/// produced it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecision {
    pub frame_index: u64,
    pub is_keyframe: bool,
    pub candidate: bool,
    pub sensitivity_count: Option<usize>,
    pub baseline_average: Option<f64>,
    pub deviation: Option<f64>,
    pub noise_ratio: Option<f64>,
    pub suppressed_by_warmup: bool,
}

/// The adaptive keyframe decision machine.
///
/// Holds the three pieces of engine state that survive across frames: the
/// baseline window, the previous evaluated frame's features, and the
/// features of the last committed keyframe. The previous-frame state
/// advances on every evaluated step; the reference only advances when a
/// keyframe is confirmed.
pub struct KeyframeEngine {
    config: EngineConfig,
    baseline: MatchBaseline,
    phase: EnginePhase,
    evaluated_frames: u64,
    previous: Option<FrameFeatures>,
    reference: Option<FrameFeatures>,
}

impl KeyframeEngine {
    pub fn new(config: EngineConfig) -> Self {
        let baseline = MatchBaseline::with_capacity(config.window_len);
        Self {
            config,
            baseline,
            phase: EnginePhase::Warmup,
            evaluated_frames: 0,
            previous: None,
            reference: None,
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Features of the last committed keyframe.
    pub fn reference(&self) -> Option<&FrameFeatures> {
        self.reference.as_ref()
    }

    /// Features of the previous evaluated frame.
    pub fn previous_frame(&self) -> Option<&FrameFeatures> {
        self.previous.as_ref()
    }

    /// Evaluates one frame and decides whether it is a keyframe.
    ///
    /// The very first frame is always a keyframe and initializes both the
    /// previous-frame state and the reference. While warming up the full
    /// decision logic still runs (the reference advances on an internal
    /// confirmation) but the returned flag is forced false.
    pub fn evaluate(
        &mut self,
        frame: FrameFeatures,
        matcher: &dyn DescriptorMatcher,
    ) -> FrameDecision {
        self.evaluated_frames += 1;
        if self.phase == EnginePhase::Warmup
            && self.evaluated_frames >= self.config.window_len as u64
        {
            debug!(
                "baseline warmed up after {} evaluated frames",
                self.evaluated_frames
            );
            self.phase = EnginePhase::Steady;
        }

        let mut decision = FrameDecision {
            frame_index: frame.frame_index,
            ..Default::default()
        };

        let Some(previous) = self.previous.as_ref() else {
            // First frame ever: it defines both baselines and is a keyframe
            // regardless of phase.
            decision.is_keyframe = true;
            self.reference = Some(frame.clone());
            self.previous = Some(frame);
            return decision;
        };

        let mut confirmed = false;

        if !frame.is_empty() && !previous.is_empty() {
            let mut matches = matcher.match_descriptors(&frame.descriptors, &previous.descriptors);
            let sensitivity_count = count_good_matches(&mut matches, self.config.distance_threshold);
            let average = self.baseline.observe(sensitivity_count);
            let deviation = (average - sensitivity_count as f64).abs() / average;
            decision.sensitivity_count = Some(sensitivity_count);
            decision.baseline_average = Some(average);
            decision.deviation = Some(deviation);
            debug!(
                "frame {}: sensitivity {} (window {}, average {:.3}) deviation {:.3}",
                frame.frame_index,
                sensitivity_count,
                self.baseline.len(),
                average,
                deviation
            );

            if deviation > self.config.sensitivity_threshold {
                decision.candidate = true;
                debug!("frame {}: candidate keyframe", frame.frame_index);

                let reference_empty = self.reference.as_ref().is_none_or(|r| r.is_empty());
                if reference_empty {
                    // Nothing committed to compare against; the candidate
                    // stands.
                    confirmed = true;
                } else {
                    let reference = self.reference.as_ref().expect("reference is non-empty");
                    let mut matches =
                        matcher.match_descriptors(&frame.descriptors, &reference.descriptors);
                    let noise_count =
                        count_good_matches(&mut matches, self.config.distance_threshold);
                    let clamped = sensitivity_count.max(1);
                    let noise_ratio =
                        (clamped as f64 - noise_count as f64).abs() / clamped as f64;
                    decision.noise_ratio = Some(noise_ratio);
                    debug!(
                        "frame {}: noise count {} ratio {:.3}",
                        frame.frame_index, noise_count, noise_ratio
                    );
                    confirmed = noise_ratio > self.config.noise_threshold;
                }
            }
        } else {
            debug!(
                "frame {}: no descriptors to match ({} current, {} previous)",
                frame.frame_index,
                frame.len(),
                previous.len()
            );
        }

        if confirmed {
            self.reference = Some(frame.clone());
        }
        // The sensitivity baseline always compares consecutive evaluated
        // frames, keyframe or not.
        self.previous = Some(frame);

        decision.is_keyframe = confirmed;
        if confirmed && self.phase == EnginePhase::Warmup {
            decision.is_keyframe = false;
            decision.suppressed_by_warmup = true;
            debug!(
                "frame {}: confirmation suppressed during warmup",
                decision.frame_index
            );
        }
        decision
    }
}
