use chrono::{DateTime, Local};
use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("no capture folder selected")]
    NoFolder,
    #[error("could not write snapshot: {0}")]
    Write(#[from] image::ImageError),
}

/// Writes raw frames as timestamped PNGs into the session's capture folder.
/// The folder is chosen once and kept for the rest of the session.
#[derive(Debug, Default)]
pub struct SnapshotWriter {
    folder: Option<PathBuf>,
}

impl SnapshotWriter {
    #[must_use]
    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn set_folder(&mut self, folder: PathBuf) {
        info!(folder = %folder.display(), "capture folder set");
        self.folder = Some(folder);
    }

    /// File names carry a second-resolution timestamp; two captures within
    /// the same second will collide.
    #[must_use]
    pub fn target_path(folder: &Path, timestamp: DateTime<Local>) -> PathBuf {
        folder.join(format!(
            "captured_photo_{}.png",
            timestamp.format("%Y%m%d%H%M%S")
        ))
    }

    /// Saves `frame` under the capture folder. The timestamp is a parameter
    /// so callers (and tests) control the clock.
    pub fn save(
        &self,
        frame: &RgbImage,
        timestamp: DateTime<Local>,
    ) -> Result<PathBuf, SnapshotError> {
        let folder = self.folder.as_deref().ok_or(SnapshotError::NoFolder)?;
        let path = Self::target_path(folder, timestamp);
        frame.save(&path)?;
        info!(path = %path.display(), "photo captured");
        Ok(path)
    }
}
