use crate::capture::image::{CapturedImage, ImageRef};
use tracing::debug;

/// In-memory, insertion-ordered collection of the images in the current batch
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    images: Vec<CapturedImage>,
    last_order: u32,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image, assigning it the next order value
    pub fn add(&mut self, local_ref: ImageRef) -> CapturedImage {
        self.last_order += 1;
        let image = CapturedImage::new(local_ref, self.last_order);
        debug!("Captured image #{}: {}", image.order, image.local_ref);
        self.images.push(image.clone());
        image
    }

    /// Remove the image with the given order. Unknown orders are ignored.
    /// Returns whether anything was removed.
    pub fn remove(&mut self, order: u32) -> bool {
        match self.images.iter().position(|image| image.order == order) {
            Some(index) => {
                self.images.remove(index);
                debug!("Removed image #{} ({} left)", order, self.images.len());
                true
            }
            None => {
                debug!("No image #{} in buffer, nothing removed", order);
                false
            }
        }
    }

    pub fn list(&self) -> &[CapturedImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        self.images.iter().any(CapturedImage::is_pending)
    }

    pub fn into_images(self) -> Vec<CapturedImage> {
        self.images
    }
}
