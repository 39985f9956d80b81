use image::GrayImage;
use imageproc::corners::corners_fast9;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use glam::Vec2;

use crate::types::{Descriptor, FrameFeatures, Keypoint};

/// Feature extraction capability: keypoints plus binary descriptors for one
/// decoded frame.
pub trait FeatureExtractor: Send + Sync {
    fn detect(&self, image: &GrayImage, frame_index: u64) -> FrameFeatures;
}

const DESCRIPTOR_PAIRS: usize = 256;
const PATCH_RADIUS: i64 = 15;
// Fixed seed so the sampling pattern is identical across runs and frames.
const PATTERN_SEED: u64 = 0x5EED_0B5E;

/// FAST-9 corner detection with BRIEF-style binary descriptors.
///
/// The 256 intensity-test pairs are drawn once from a seeded RNG inside a
/// 31x31 patch. Keypoints too close to the border for a full patch are
/// dropped, and the remainder is capped to the strongest corners.
pub struct FastBriefExtractor {
    fast_threshold: u8,
    max_features: usize,
    pattern: Vec<(i64, i64, i64, i64)>,
}

impl FastBriefExtractor {
    pub fn new(fast_threshold: u8, max_features: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(PATTERN_SEED);
        let pattern = (0..DESCRIPTOR_PAIRS)
            .map(|_| {
                (
                    rng.random_range(-PATCH_RADIUS..=PATCH_RADIUS),
                    rng.random_range(-PATCH_RADIUS..=PATCH_RADIUS),
                    rng.random_range(-PATCH_RADIUS..=PATCH_RADIUS),
                    rng.random_range(-PATCH_RADIUS..=PATCH_RADIUS),
                )
            })
            .collect();
        Self {
            fast_threshold,
            max_features,
            pattern,
        }
    }

    fn describe(&self, image: &GrayImage, keypoint: &Keypoint) -> Descriptor {
        let cx = keypoint.position.x as i64;
        let cy = keypoint.position.y as i64;
        let mut descriptor = [0u8; 32];
        for (i, &(dx1, dy1, dx2, dy2)) in self.pattern.iter().enumerate() {
            let a = image.get_pixel((cx + dx1) as u32, (cy + dy1) as u32).0[0];
            let b = image.get_pixel((cx + dx2) as u32, (cy + dy2) as u32).0[0];
            let bit = (a < b) as u8;
            descriptor[i / 8] |= bit << (i % 8);
        }
        descriptor
    }
}

impl Default for FastBriefExtractor {
    fn default() -> Self {
        Self::new(20, 500)
    }
}

impl FeatureExtractor for FastBriefExtractor {
    fn detect(&self, image: &GrayImage, frame_index: u64) -> FrameFeatures {
        let (width, height) = image.dimensions();
        if (width as i64) <= 2 * PATCH_RADIUS || (height as i64) <= 2 * PATCH_RADIUS {
            return FrameFeatures {
                frame_index,
                ..Default::default()
            };
        }

        let mut keypoints: Vec<Keypoint> = corners_fast9(image, self.fast_threshold)
            .into_iter()
            .filter(|c| {
                let x = c.x as i64;
                let y = c.y as i64;
                x >= PATCH_RADIUS
                    && y >= PATCH_RADIUS
                    && x < width as i64 - PATCH_RADIUS
                    && y < height as i64 - PATCH_RADIUS
            })
            .map(|c| Keypoint {
                position: Vec2::new(c.x as f32, c.y as f32),
                score: c.score,
            })
            .collect();

        keypoints.sort_by(|a, b| b.score.total_cmp(&a.score));
        keypoints.truncate(self.max_features);

        let descriptors = keypoints
            .par_iter()
            .map(|kp| self.describe(image, kp))
            .collect();

        FrameFeatures {
            frame_index,
            keypoints,
            descriptors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_image_has_no_keypoints() {
        let image = GrayImage::from_pixel(64, 64, image::Luma([128]));
        let features = FastBriefExtractor::default().detect(&image, 7);
        assert_eq!(features.frame_index, 7);
        assert!(features.is_empty());
        assert!(features.descriptors.is_empty());
    }

    #[test]
    fn high_contrast_corner_is_detected() {
        let mut image = GrayImage::from_pixel(64, 64, image::Luma([0]));
        for y in 24..40 {
            for x in 24..40 {
                image.put_pixel(x, y, image::Luma([255]));
            }
        }
        let features = FastBriefExtractor::default().detect(&image, 0);
        assert!(!features.is_empty());
        assert_eq!(features.keypoints.len(), features.descriptors.len());
    }

    #[test]
    fn pattern_is_deterministic() {
        let a = FastBriefExtractor::new(20, 100);
        let b = FastBriefExtractor::new(20, 100);
        assert_eq!(a.pattern, b.pattern);
    }

    #[test]
    fn tiny_image_is_degenerate() {
        let image = GrayImage::from_pixel(8, 8, image::Luma([0]));
        let features = FastBriefExtractor::default().detect(&image, 0);
        assert!(features.is_empty());
    }
}
