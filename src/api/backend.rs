use async_trait::async_trait;

use crate::{
    api::types::{ScanUpload, UploadReceipt},
    error::UploadError,
};

/// The grading backend as seen by the uploader: one image per call
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScanBackend: Send + Sync {
    async fn upload_scan(
        &self,
        credential: &str,
        upload: ScanUpload,
    ) -> std::result::Result<UploadReceipt, UploadError>;
}
