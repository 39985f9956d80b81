use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::Serialize;

use crate::error::Result;

/// Durable storage for confirmed keyframes.
pub trait KeyframeSink {
    fn persist(&mut self, image: &DynamicImage, frame_index: u64) -> Result<PathBuf>;
}

/// Writes keyframes into a directory as `key-frame-NNN.<ext>`.
pub struct ImageDirSink {
    dir: PathBuf,
    extension: String,
}

impl ImageDirSink {
    /// Creates the output directory if it does not exist yet.
    pub fn create(dir: impl AsRef<Path>, extension: &str) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

}

impl KeyframeSink for ImageDirSink {
    fn persist(&mut self, image: &DynamicImage, frame_index: u64) -> Result<PathBuf> {
        let path = self
            .dir
            .join(format!("key-frame-{:03}.{}", frame_index, self.extension));
        // JPEG has no alpha channel; decoded PNG frames are often RGBA.
        if matches!(self.extension.as_str(), "jpg" | "jpeg") {
            DynamicImage::ImageRgb8(image.to_rgb8()).save(&path)?;
        } else {
            image.save(&path)?;
        }
        Ok(path)
    }
}

/// Run report written next to the keyframes after a stream completes.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub input: String,
    pub frame_step: usize,
    pub window_len: usize,
    pub sensitivity_threshold: f64,
    pub noise_threshold: f64,
    pub distance_threshold: f32,
    pub frames_seen: u64,
    pub frames_evaluated: u64,
    pub keyframes: Vec<u64>,
    pub keyframes_saved: usize,
}

pub fn write_report(output_path: impl AsRef<Path>, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(output_path, json)?;
    Ok(())
}
