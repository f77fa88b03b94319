use std::collections::VecDeque;
use std::path::PathBuf;

use crate::{
    capture::image::ImageRef,
    error::{Result, ScanError},
};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "heif", "webp", "tif", "tiff", "bmp"];

/// Device capability that produces one image per call
pub trait CaptureSource {
    fn capture_image(&mut self) -> Result<ImageRef>;
}

/// Captures from image files already on disk, in the order given
pub struct FileCaptureSource {
    pending: VecDeque<PathBuf>,
}

impl FileCaptureSource {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            pending: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn is_image(path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl CaptureSource for FileCaptureSource {
    fn capture_image(&mut self) -> Result<ImageRef> {
        let path = self
            .pending
            .pop_front()
            .ok_or_else(|| ScanError::Capture("no more images to capture".to_string()))?;

        if !path.is_file() {
            return Err(ScanError::Capture(format!("{} is not a file", path.display())));
        }
        if !Self::is_image(&path) {
            return Err(ScanError::Capture(format!(
                "{} is not a supported image type",
                path.display()
            )));
        }

        Ok(ImageRef::File(path))
    }
}
