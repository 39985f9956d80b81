use std::path::PathBuf;

use glob::glob;
use image::{DynamicImage, ImageReader};
use log::warn;

use crate::error::{Result, SummarizeError};

/// Blocking frame acquisition. `Ok(None)` signals end of stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>>;
}

fn image_filter(entry: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = entry {
        for ext in &[".png", ".jpg", ".jpeg"] {
            if p.as_os_str().to_string_lossy().ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

/// Frame source over a directory of numbered still images, decoded lazily
/// one frame per call so long sequences never sit in memory at once.
pub struct ImageSequenceSource {
    paths: std::vec::IntoIter<PathBuf>,
}

impl ImageSequenceSource {
    pub fn open(root: &str) -> Result<Self> {
        let pattern = format!("{}/*", root.trim_end_matches('/'));
        let entries = glob(&pattern)
            .map_err(|e| SummarizeError::Source(format!("bad input pattern {pattern}: {e}")))?;
        let mut paths: Vec<PathBuf> = entries.filter_map(image_filter).collect();
        paths.sort();
        if paths.is_empty() {
            return Err(SummarizeError::Source(format!(
                "no image frames found under {root}"
            )));
        }
        Ok(Self {
            paths: paths.into_iter(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        // A frame that fails to decode is skipped rather than ending an
        // unattended run.
        for path in self.paths.by_ref() {
            let decoded = match ImageReader::open(&path) {
                Ok(reader) => reader.decode(),
                Err(e) => {
                    warn!("skipping {}: {e}", path.display());
                    continue;
                }
            };
            match decoded {
                Ok(image) => return Ok(Some(image)),
                Err(e) => warn!("skipping {}: {e}", path.display()),
            }
        }
        Ok(None)
    }
}
