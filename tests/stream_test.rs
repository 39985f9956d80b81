use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use glam::Vec2;
use image::{DynamicImage, GrayImage};
use video_keyframe_summarizer::detector::FeatureExtractor;
use video_keyframe_summarizer::engine::EngineConfig;
use video_keyframe_summarizer::error::{Result, SummarizeError};
use video_keyframe_summarizer::frame_source::FrameSource;
use video_keyframe_summarizer::io::KeyframeSink;
use video_keyframe_summarizer::matcher::DescriptorMatcher;
use video_keyframe_summarizer::stream::{StreamConfig, StreamController};
use video_keyframe_summarizer::types::{Descriptor, FeatureMatch, FrameFeatures, Keypoint};

struct MockSource {
    remaining: usize,
}

impl FrameSource for MockSource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(DynamicImage::ImageLuma8(GrayImage::new(4, 4))))
    }
}

/// Returns a feature set whose size is scripted per frame index; frames
/// beyond the script are empty.
struct ScriptedExtractor {
    sizes: Vec<usize>,
}

impl FeatureExtractor for ScriptedExtractor {
    fn detect(&self, _image: &GrayImage, frame_index: u64) -> FrameFeatures {
        let count = self.sizes.get(frame_index as usize).copied().unwrap_or(0);
        FrameFeatures {
            frame_index,
            keypoints: (0..count)
                .map(|i| Keypoint {
                    position: Vec2::new(i as f32, 0.0),
                    score: 1.0,
                })
                .collect(),
            descriptors: (0..count).map(|i| [i as u8; 32]).collect(),
        }
    }
}

struct MinMatcher;

impl DescriptorMatcher for MinMatcher {
    fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<FeatureMatch> {
        let n = query.len().min(train.len());
        (0..n)
            .map(|i| FeatureMatch {
                query_idx: i,
                train_idx: i,
                distance: 0.0,
            })
            .collect()
    }
}

/// Records persisted frame indices; fails on the indices it is told to.
#[derive(Clone, Default)]
struct RecordingSink {
    persisted: Arc<Mutex<Vec<u64>>>,
    fail_on: Vec<u64>,
}

impl KeyframeSink for RecordingSink {
    fn persist(&mut self, _image: &DynamicImage, frame_index: u64) -> Result<PathBuf> {
        if self.fail_on.contains(&frame_index) {
            return Err(SummarizeError::Io(std::io::Error::other("disk full")));
        }
        self.persisted.lock().unwrap().push(frame_index);
        Ok(PathBuf::from(format!("key-frame-{frame_index:03}.jpg")))
    }
}

fn controller(
    frames: usize,
    sizes: Vec<usize>,
    frame_step: usize,
    window_len: usize,
    sink: RecordingSink,
) -> StreamController {
    let config = StreamConfig {
        engine: EngineConfig {
            window_len,
            ..Default::default()
        },
        frame_step,
        progress: false,
    };
    StreamController::new(
        config,
        Box::new(MockSource { remaining: frames }),
        Box::new(ScriptedExtractor { sizes }),
        Box::new(MinMatcher),
        Box::new(sink),
    )
    .unwrap()
}

#[test]
fn stride_bounds_evaluated_frames() {
    let sink = RecordingSink::default();
    let mut controller = controller(10, vec![10; 10], 3, 30, sink);
    let summary = controller.run().unwrap();

    assert_eq!(summary.frames_seen, 10);
    // Frames 0, 3, 6, 9.
    assert_eq!(summary.frames_evaluated, 4);
}

#[test]
fn first_frame_is_persisted() {
    let sink = RecordingSink::default();
    let persisted = Arc::clone(&sink.persisted);
    let mut controller = controller(6, vec![10; 6], 3, 30, sink);
    let summary = controller.run().unwrap();

    assert_eq!(summary.keyframes, vec![0]);
    assert_eq!(summary.keyframes_saved, 1);
    assert_eq!(*persisted.lock().unwrap(), vec![0]);
}

#[test]
fn persistence_failure_does_not_stop_the_stream() {
    // Blank frame 0 keeps the reference empty; the cut at frame 3 becomes
    // the second keyframe once the baseline is warm (W=2).
    let sizes = vec![0, 10, 10, 2, 2];
    let sink = RecordingSink {
        fail_on: vec![0],
        ..Default::default()
    };
    let persisted = Arc::clone(&sink.persisted);
    let mut controller = controller(5, sizes, 1, 2, sink);
    let summary = controller.run().unwrap();

    assert_eq!(summary.keyframes, vec![0, 3]);
    // Frame 0's write failed but the engine still advanced and the later
    // keyframe was saved.
    assert_eq!(summary.keyframes_saved, 1);
    assert_eq!(*persisted.lock().unwrap(), vec![3]);
}

#[test]
fn cancel_flag_stops_before_the_next_frame() {
    let sink = RecordingSink::default();
    let mut controller = controller(100, vec![10; 100], 1, 30, sink);
    controller.cancel_flag().store(true, Ordering::SeqCst);
    let summary = controller.run().unwrap();

    assert_eq!(summary.frames_seen, 0);
    assert!(summary.keyframes.is_empty());
}

#[test]
fn skipped_frames_are_not_eligible() {
    // The cut lands on frame 4, which stride 3 never evaluates.
    let mut sizes = vec![10; 12];
    sizes[4] = 2;
    let sink = RecordingSink::default();
    let mut controller = controller(12, sizes, 3, 2, sink);
    let summary = controller.run().unwrap();

    assert_eq!(summary.keyframes, vec![0]);
}
