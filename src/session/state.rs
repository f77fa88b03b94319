use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    capture::{CaptureBuffer, CaptureSource, CapturedImage, ImageRef},
    error::{Result, ScanError},
    session::{observer::NoopObserver, review::BatchReviewController, BatchObserver},
    upload::{BatchResult, SequentialUploader, UploadRun, UploadTarget},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Capturing,
    Reviewing,
    Uploading,
    Complete,
    Discarded,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Capturing => write!(f, "capturing"),
            SessionState::Reviewing => write!(f, "reviewing"),
            SessionState::Uploading => write!(f, "uploading"),
            SessionState::Complete => write!(f, "complete"),
            SessionState::Discarded => write!(f, "discarded"),
        }
    }
}

/// Each phase owns only the data that is valid in it: the buffer exists while
/// capturing or reviewing, the frozen run while uploading.
pub(crate) enum Phase {
    Capturing(CaptureBuffer),
    Reviewing(CaptureBuffer),
    Uploading(UploadRun),
    Complete(BatchResult),
    Discarded,
}

impl Phase {
    pub(crate) fn state(&self) -> SessionState {
        match self {
            Phase::Capturing(_) => SessionState::Capturing,
            Phase::Reviewing(_) => SessionState::Reviewing,
            Phase::Uploading(_) => SessionState::Uploading,
            Phase::Complete(_) => SessionState::Complete,
            Phase::Discarded => SessionState::Discarded,
        }
    }
}

/// One capture → review → upload → complete cycle
pub struct BatchSession {
    id: Uuid,
    target: UploadTarget,
    created_at: DateTime<Utc>,
    pub(crate) phase: Phase,
    pub(crate) observer: Arc<dyn BatchObserver>,
}

impl BatchSession {
    pub fn new(target: UploadTarget) -> Self {
        Self::with_observer(target, Arc::new(NoopObserver))
    }

    pub fn with_observer(target: UploadTarget, observer: Arc<dyn BatchObserver>) -> Self {
        let id = Uuid::new_v4();
        info!("Started batch session {} for {}", id, target);
        Self {
            id,
            target,
            created_at: Utc::now(),
            phase: Phase::Capturing(CaptureBuffer::new()),
            observer,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target(&self) -> &UploadTarget {
        &self.target
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> SessionState {
        self.phase.state()
    }

    /// Images of the batch in capture order; empty once the session is over
    pub fn images(&self) -> &[CapturedImage] {
        match &self.phase {
            Phase::Capturing(buffer) | Phase::Reviewing(buffer) => buffer.list(),
            Phase::Uploading(run) => run.images(),
            Phase::Complete(_) | Phase::Discarded => &[],
        }
    }

    pub fn upload_cursor(&self) -> usize {
        match &self.phase {
            Phase::Uploading(run) => run.cursor(),
            Phase::Complete(result) => result.attempted,
            _ => 0,
        }
    }

    pub fn result(&self) -> Option<&BatchResult> {
        match &self.phase {
            Phase::Complete(result) => Some(result),
            _ => None,
        }
    }

    /// Acquire an image from `source` and append it to the batch
    pub fn capture(&mut self, source: &mut dyn CaptureSource) -> Result<CapturedImage> {
        self.ensure_capturing("capture")?;
        let local_ref = source.capture_image()?;
        self.add_image(local_ref)
    }

    /// Append an already acquired image to the batch
    pub fn add_image(&mut self, local_ref: ImageRef) -> Result<CapturedImage> {
        match &mut self.phase {
            Phase::Capturing(buffer) => {
                let image = buffer.add(local_ref);
                self.observer.on_capture_added(&image);
                self.observer.on_buffer_changed(buffer.list());
                Ok(image)
            }
            Phase::Uploading(_) => Err(ScanError::SessionBusy),
            _ => Err(self.invalid("capture")),
        }
    }

    /// Drop an image from the batch. Unknown orders are ignored. Emptying the
    /// batch while reviewing falls back to capturing.
    pub fn remove(&mut self, order: u32) -> Result<()> {
        let (buffer, reviewing) = match &mut self.phase {
            Phase::Capturing(buffer) => (buffer, false),
            Phase::Reviewing(buffer) => (buffer, true),
            Phase::Uploading(_) => return Err(ScanError::SessionBusy),
            Phase::Complete(_) | Phase::Discarded => return Err(self.invalid("remove an image")),
        };

        if !buffer.remove(order) {
            return Ok(());
        }
        self.observer.on_buffer_changed(buffer.list());

        if reviewing && buffer.is_empty() {
            info!("Batch is empty, leaving review");
            self.phase = Phase::Capturing(self.take_buffer());
        }
        Ok(())
    }

    /// Review operations: enter/exit review, prune, confirm upload
    pub fn review(&mut self) -> BatchReviewController<'_> {
        BatchReviewController::new(self)
    }

    /// Abandon the batch before any upload. Returns how many images were dropped.
    pub fn cancel(&mut self) -> Result<usize> {
        match &self.phase {
            Phase::Capturing(buffer) | Phase::Reviewing(buffer) => {
                let dropped = buffer.len();
                self.phase = Phase::Discarded;
                info!("Session {} cancelled, {} images discarded", self.id, dropped);
                Ok(dropped)
            }
            Phase::Uploading(_) => Err(ScanError::SessionBusy),
            Phase::Complete(_) | Phase::Discarded => Err(self.invalid("cancel")),
        }
    }

    /// Drain the confirmed batch and move to `Complete`. The run cannot be
    /// cancelled once started.
    pub async fn upload(&mut self, uploader: &SequentialUploader) -> Result<BatchResult> {
        let Phase::Uploading(run) = &mut self.phase else {
            return Err(self.invalid("upload"));
        };

        let result = uploader.drain(run, self.observer.as_ref()).await;
        debug_assert!(run.is_drained());

        self.observer.on_batch_complete(&result);
        self.phase = Phase::Complete(result.clone());
        Ok(result)
    }

    /// Consume a completed session, yielding its result
    pub fn into_result(self) -> Option<BatchResult> {
        match self.phase {
            Phase::Complete(result) => Some(result),
            _ => None,
        }
    }

    fn ensure_capturing(&self, operation: &'static str) -> Result<()> {
        match self.phase {
            Phase::Capturing(_) => Ok(()),
            Phase::Uploading(_) => Err(ScanError::SessionBusy),
            _ => Err(self.invalid(operation)),
        }
    }

    pub(crate) fn invalid(&self, operation: &'static str) -> ScanError {
        ScanError::InvalidState {
            operation,
            state: self.state(),
        }
    }

    /// Move the buffer out of a capturing/reviewing phase, leaving `Discarded`
    pub(crate) fn take_buffer(&mut self) -> CaptureBuffer {
        match std::mem::replace(&mut self.phase, Phase::Discarded) {
            Phase::Capturing(buffer) | Phase::Reviewing(buffer) => buffer,
            other => {
                self.phase = other;
                CaptureBuffer::new()
            }
        }
    }
}

impl fmt::Debug for BatchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchSession")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("state", &self.state())
            .field("images", &self.images().len())
            .finish()
    }
}
