//! Adaptive keyframe extraction from video frame streams.
//!
//! A single-pass, causal classifier: every evaluated frame is scored by its
//! good feature matches against the previous evaluated frame, compared to a
//! rolling baseline to flag candidates, and confirmed against the last
//! committed keyframe to reject drift. Confirmed keyframes are written out
//! as still images.

pub mod baseline;
pub mod detector;
pub mod engine;
pub mod error;
pub mod frame_source;
pub mod io;
pub mod matcher;
pub mod scoring;
pub mod stream;
pub mod types;

pub use engine::{EngineConfig, EnginePhase, FrameDecision, KeyframeEngine};
pub use error::{Result, SummarizeError};
pub use stream::{RunSummary, StreamConfig, StreamController};
pub use types::{Descriptor, FeatureMatch, FrameFeatures, Keypoint};
