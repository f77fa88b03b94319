use tracing::{debug, info};

use crate::{capture::CapturedImage, upload::BatchResult};

/// Events a batch session emits to whatever presents it.
/// All methods default to doing nothing.
pub trait BatchObserver: Send + Sync {
    fn on_capture_added(&self, _image: &CapturedImage) {}

    fn on_buffer_changed(&self, _images: &[CapturedImage]) {}

    fn on_upload_progress(&self, _completed: usize, _total: usize) {}

    fn on_batch_complete(&self, _result: &BatchResult) {}
}

pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Reports session events through `tracing`
pub struct TracingObserver;

impl BatchObserver for TracingObserver {
    fn on_capture_added(&self, image: &CapturedImage) {
        info!("Captured #{}: {}", image.order, image.local_ref);
    }

    fn on_buffer_changed(&self, images: &[CapturedImage]) {
        debug!("Batch now holds {} images", images.len());
    }

    fn on_upload_progress(&self, completed: usize, total: usize) {
        debug!("Upload progress {}/{}", completed, total);
    }

    fn on_batch_complete(&self, result: &BatchResult) {
        info!(
            "Batch complete: {} of {} uploaded, {} failed",
            result.succeeded,
            result.attempted,
            result.failed()
        );
    }
}
