use glam::Vec2;

/// A detected feature location with its corner score.
#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    pub position: Vec2,
    pub score: f32,
}

/// 256-bit binary descriptor, 32 bytes.
pub type Descriptor = [u8; 32];

/// One correspondence between a query and a train descriptor.
/// `distance` is normalized Hamming distance in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

/// Features extracted from one evaluated frame.
///
/// Becomes the engine's previous-frame state after every evaluated step,
/// and the reference state when the frame is committed as a keyframe.
#[derive(Debug, Clone, Default)]
pub struct FrameFeatures {
    pub frame_index: u64,
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FrameFeatures {
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }
}
