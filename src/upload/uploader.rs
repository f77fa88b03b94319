use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    api::{ScanBackend, ScanUpload, UploadReceipt},
    capture::{CapturedImage, ImageStatus},
    error::UploadError,
    session::BatchObserver,
    upload::{BatchResult, UploadTarget},
};

/// Images frozen for upload, with the credential captured at confirm time
pub struct UploadRun {
    pub(crate) images: Vec<CapturedImage>,
    /// Index of the next image to send; only moves forward
    pub(crate) cursor: usize,
    pub(crate) credential: String,
    pub(crate) target: UploadTarget,
    /// Outcomes recorded so far; kept here so an interrupted drain can resume
    pub(crate) result: BatchResult,
}

impl UploadRun {
    pub fn new(images: Vec<CapturedImage>, credential: String, target: UploadTarget) -> Self {
        Self {
            images,
            cursor: 0,
            credential,
            target,
            result: BatchResult::default(),
        }
    }

    pub fn images(&self) -> &[CapturedImage] {
        &self.images
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.images.len()
    }

    pub fn is_drained(&self) -> bool {
        self.cursor >= self.images.len()
    }
}

/// Fold state while draining a run. Points into the run so every step is
/// visible even if the drain future is dropped part way.
struct Drain<'r> {
    cursor: &'r mut usize,
    result: &'r mut BatchResult,
}

const INTERRUPTED: &str = "Upload interrupted before the backend answered";

/// Uploads a run's images one at a time, in order. A failed image is recorded
/// and the run moves on to the next one.
pub struct SequentialUploader {
    backend: Arc<dyn ScanBackend>,
    call_timeout: Duration,
}

impl SequentialUploader {
    pub fn new(backend: Arc<dyn ScanBackend>, call_timeout: Duration) -> Self {
        Self {
            backend,
            call_timeout,
        }
    }

    /// Send every image from the run's cursor onward. Calling this again after
    /// an interrupted drain resumes where it stopped; an image whose call was
    /// cut off is recorded as failed rather than sent a second time.
    pub async fn drain(&self, run: &mut UploadRun, observer: &dyn BatchObserver) -> BatchResult {
        let UploadRun {
            images,
            cursor,
            credential,
            target,
            result,
        } = run;
        let total = images.len();
        let start = *cursor;
        if start == 0 {
            info!("Uploading {} images sequentially", total);
        } else {
            info!("Resuming upload run at image {} of {}", start + 1, total);
        }

        let backend = self.backend.as_ref();
        let call_timeout = self.call_timeout;
        let credential = credential.as_str();
        let target = &*target;

        let drained = stream::iter(images[start..].iter_mut())
            .fold(Drain { cursor, result }, move |acc, image| async move {
                match image.status {
                    ImageStatus::Pending => {
                        image.status = ImageStatus::Uploading;

                        match upload_one(backend, call_timeout, credential, target, image).await {
                            Ok(receipt) => {
                                image.status = ImageStatus::Succeeded;
                                debug!(
                                    "Image #{} uploaded ({})",
                                    image.order,
                                    receipt.resource_id().unwrap_or_else(|| "no id".to_string())
                                );
                                acc.result.record_success(image.order, receipt);
                            }
                            Err(e) => {
                                image.status = ImageStatus::Failed;
                                warn!("Failed to upload image #{}: {}", image.order, e);
                                acc.result.record_failure(image.order, e.to_string());
                            }
                        }
                    }
                    ImageStatus::Uploading => {
                        // The backend may already hold this one
                        image.status = ImageStatus::Failed;
                        warn!("Image #{} was in flight when the run stopped, not resending", image.order);
                        acc.result.record_failure(image.order, INTERRUPTED);
                    }
                    ImageStatus::Succeeded | ImageStatus::Failed => {}
                }

                *acc.cursor += 1;
                observer.on_upload_progress(*acc.cursor, total);
                acc
            })
            .await;

        info!(
            "Upload run complete: {} successful, {} failed",
            drained.result.succeeded,
            drained.result.failed()
        );

        drained.result.clone()
    }
}

async fn upload_one(
    backend: &dyn ScanBackend,
    call_timeout: Duration,
    credential: &str,
    target: &UploadTarget,
    image: &CapturedImage,
) -> std::result::Result<UploadReceipt, UploadError> {
    let bytes = image
        .local_ref
        .load()
        .await
        .map_err(|e| UploadError::LocalImage(format!("{}: {}", image.local_ref, e)))?;

    let upload = ScanUpload {
        file_name: image.local_ref.file_name(),
        mime_type: image.local_ref.mime_type(),
        bytes,
        assessment_id: target.assessment_id,
        student_id: target.student_id,
    };

    match tokio::time::timeout(call_timeout, backend.upload_scan(credential, upload)).await {
        Ok(result) => result,
        Err(_) => Err(UploadError::Timeout(call_timeout)),
    }
}
