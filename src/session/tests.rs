use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    api::{backend::MockScanBackend, ScanBackend, ScanUpload, UploadReceipt},
    auth::StaticCredentials,
    capture::{CaptureSource, CapturedImage, ImageRef, ImageStatus},
    error::{Result, ScanError, UploadError},
    session::{BatchObserver, BatchSession, SessionState},
    upload::{BatchResult, SequentialUploader, UploadTarget},
};

/// Backend that fails the calls whose 1-based index is listed
#[derive(Default)]
struct FakeBackend {
    fail_calls: HashSet<usize>,
    stall_on: Option<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn failing(calls: &[usize]) -> Self {
        Self {
            fail_calls: calls.iter().copied().collect(),
            ..Default::default()
        }
    }

    /// Hangs for a while on the named file
    fn stalling_on(file_name: &'static str) -> Self {
        Self {
            stall_on: Some(file_name),
            ..Default::default()
        }
    }

    fn uploaded_files(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScanBackend for FakeBackend {
    async fn upload_scan(
        &self,
        _credential: &str,
        upload: ScanUpload,
    ) -> std::result::Result<UploadReceipt, UploadError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(upload.file_name.clone());
            calls.len()
        };

        if self.stall_on == Some(upload.file_name.as_str()) {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        if self.fail_calls.contains(&call) {
            return Err(UploadError::Network("connection reset".to_string()));
        }

        Ok(serde_json::from_value(serde_json::json!({ "submission_id": format!("sub-{}", call) })).unwrap())
    }
}

/// Stands in for the camera
#[derive(Default)]
struct FakeCamera {
    shots: u32,
}

impl CaptureSource for FakeCamera {
    fn capture_image(&mut self) -> Result<ImageRef> {
        self.shots += 1;
        Ok(ImageRef::from_bytes(format!("paper{}.jpg", self.shots), vec![self.shots as u8]))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Captured(u32),
    BufferChanged(Vec<u32>),
    Progress(usize, usize),
    Complete(usize, usize),
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl BatchObserver for RecordingObserver {
    fn on_capture_added(&self, image: &CapturedImage) {
        self.events.lock().unwrap().push(Event::Captured(image.order));
    }

    fn on_buffer_changed(&self, images: &[CapturedImage]) {
        let orders = images.iter().map(|i| i.order).collect();
        self.events.lock().unwrap().push(Event::BufferChanged(orders));
    }

    fn on_upload_progress(&self, completed: usize, total: usize) {
        self.events.lock().unwrap().push(Event::Progress(completed, total));
    }

    fn on_batch_complete(&self, result: &BatchResult) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Complete(result.succeeded, result.attempted));
    }
}

fn signed_in() -> StaticCredentials {
    StaticCredentials::new(Some("token-abc".to_string()), Some("teacher@school.test".to_string()))
}

fn uploader(backend: Arc<dyn ScanBackend>) -> SequentialUploader {
    SequentialUploader::new(backend, Duration::from_secs(5))
}

fn session_with(count: usize, camera: &mut FakeCamera) -> BatchSession {
    let mut session = BatchSession::new(UploadTarget {
        assessment_id: Some(3),
        student_id: None,
    });
    for _ in 0..count {
        session.capture(&mut *camera).unwrap();
    }
    session
}

fn orders(session: &BatchSession) -> Vec<u32> {
    session.images().iter().map(|i| i.order).collect()
}

#[tokio::test]
async fn test_remove_then_upload_survivors() {
    let backend = Arc::new(FakeBackend::default());
    let mut camera = FakeCamera::default();
    let mut session = session_with(3, &mut camera);
    assert_eq!(orders(&session), vec![1, 2, 3]);

    session.review().enter().unwrap();
    session.review().remove(2).unwrap();
    session.review().confirm_upload(&signed_in()).unwrap();
    let result = session.upload(&uploader(backend.clone())).await.unwrap();

    assert_eq!(result.attempted, 2);
    assert_eq!(result.succeeded, 2);
    assert!(result.failures.is_empty());
    assert_eq!(backend.uploaded_files(), vec!["paper1.jpg", "paper3.jpg"]);
    assert_eq!(session.state(), SessionState::Complete);
}

#[tokio::test]
async fn test_interrupted_upload_resumes_without_duplicates() {
    let backend = Arc::new(FakeBackend::stalling_on("paper2.jpg"));
    let mut camera = FakeCamera::default();
    let mut session = session_with(3, &mut camera);
    session.review().enter().unwrap();
    session.review().confirm_upload(&signed_in()).unwrap();

    let uploader = uploader(backend.clone());
    let cut_short = tokio::time::timeout(Duration::from_millis(100), session.upload(&uploader)).await;
    assert!(cut_short.is_err());
    assert_eq!(session.state(), SessionState::Uploading);
    assert_eq!(session.upload_cursor(), 1);

    let result = session.upload(&uploader).await.unwrap();

    assert_eq!(
        backend.uploaded_files(),
        vec!["paper1.jpg", "paper2.jpg", "paper3.jpg"]
    );
    assert_eq!(result.attempted, 3);
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].image_order, 2);
    assert_eq!(session.state(), SessionState::Complete);
}

#[tokio::test]
async fn test_missing_credential_keeps_review_and_calls_nothing() {
    let mut backend = MockScanBackend::new();
    backend.expect_upload_scan().never();
    let uploader = uploader(Arc::new(backend));

    let mut camera = FakeCamera::default();
    let mut session = session_with(2, &mut camera);
    session.review().enter().unwrap();

    let err = session
        .review()
        .confirm_upload(&StaticCredentials::anonymous())
        .unwrap_err();
    assert!(matches!(err, ScanError::Unauthenticated));
    assert_eq!(session.state(), SessionState::Reviewing);
    assert_eq!(orders(&session), vec![1, 2]);

    // Nothing was committed, so there is nothing to drain
    assert!(matches!(
        session.upload(&uploader).await,
        Err(ScanError::InvalidState { .. })
    ));
    assert_eq!(session.state(), SessionState::Reviewing);
}

#[tokio::test]
async fn test_retry_confirm_after_signing_in() {
    let backend = Arc::new(FakeBackend::default());
    let mut camera = FakeCamera::default();
    let mut session = session_with(2, &mut camera);
    session.review().enter().unwrap();

    assert!(session.review().confirm_upload(&StaticCredentials::anonymous()).is_err());
    session.review().confirm_upload(&signed_in()).unwrap();
    let result = session.upload(&uploader(backend)).await.unwrap();
    assert_eq!(result.succeeded, 2);
}

#[test]
fn test_enter_review_on_empty_batch() {
    let mut session = BatchSession::new(UploadTarget::default());
    let err = session.review().enter().unwrap_err();
    assert!(matches!(err, ScanError::EmptyBatch));
    assert!(err.is_user_error());
    assert_eq!(session.state(), SessionState::Capturing);
    assert!(session.images().is_empty());
}

#[tokio::test]
async fn test_all_uploads_succeed() {
    let backend = Arc::new(FakeBackend::default());
    let mut camera = FakeCamera::default();
    let mut session = session_with(4, &mut camera);

    session.review().enter().unwrap();
    session.review().confirm_upload(&signed_in()).unwrap();
    let result = session.upload(&uploader(backend)).await.unwrap();

    assert_eq!(result.attempted, 4);
    assert_eq!(result.succeeded, 4);
    assert!(result.failures.is_empty());
    assert_eq!(result.uploaded.len(), 4);
}

#[tokio::test]
async fn test_one_failure_does_not_abort_batch() {
    let backend = Arc::new(FakeBackend::failing(&[2]));
    let mut camera = FakeCamera::default();
    let mut session = session_with(4, &mut camera);

    session.review().enter().unwrap();
    session.review().confirm_upload(&signed_in()).unwrap();
    let result = session.upload(&uploader(backend.clone())).await.unwrap();

    assert_eq!(result.attempted, 4);
    assert_eq!(result.succeeded, 3);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].image_order, 2);
    assert_eq!(
        result.failures[0].error_detail.as_deref(),
        Some("Network error: connection reset")
    );
    assert_eq!(result.succeeded + result.failures.len(), result.attempted);
    // Items after the failed one were still sent
    assert_eq!(
        backend.uploaded_files(),
        vec!["paper1.jpg", "paper2.jpg", "paper3.jpg", "paper4.jpg"]
    );
}

#[tokio::test]
async fn test_capture_and_remove_rejected_while_uploading() {
    let backend = Arc::new(FakeBackend::default());
    let mut camera = FakeCamera::default();
    let mut session = session_with(2, &mut camera);

    session.review().enter().unwrap();
    session.review().confirm_upload(&signed_in()).unwrap();
    assert_eq!(session.state(), SessionState::Uploading);
    assert_eq!(session.upload_cursor(), 0);

    assert!(matches!(session.capture(&mut camera), Err(ScanError::SessionBusy)));
    assert!(matches!(
        session.add_image(ImageRef::from_bytes("late.jpg", vec![0])),
        Err(ScanError::SessionBusy)
    ));
    assert!(matches!(session.remove(1), Err(ScanError::SessionBusy)));
    assert!(matches!(session.cancel(), Err(ScanError::SessionBusy)));
    assert!(matches!(session.review().enter(), Err(ScanError::SessionBusy)));
    // The camera was never asked for a shot while busy
    assert_eq!(camera.shots, 2);
    assert_eq!(orders(&session), vec![1, 2]);
    assert!(session.images().iter().all(|i| i.status == ImageStatus::Pending));

    let result = session.upload(&uploader(backend)).await.unwrap();
    assert_eq!(result.attempted, 2);
    assert_eq!(result.succeeded, 2);
    assert_eq!(session.upload_cursor(), 2);
}

#[test]
fn test_removing_last_image_leaves_review() {
    let mut camera = FakeCamera::default();
    let mut session = session_with(2, &mut camera);

    session.review().enter().unwrap();
    session.review().remove(1).unwrap();
    assert_eq!(session.state(), SessionState::Reviewing);

    session.review().remove(2).unwrap();
    assert_eq!(session.state(), SessionState::Capturing);
    assert!(session.images().is_empty());

    // Capturing resumes normally and orders continue
    let image = session.capture(&mut camera).unwrap();
    assert_eq!(image.order, 3);
}

#[test]
fn test_remove_unknown_order_is_noop() {
    let mut camera = FakeCamera::default();
    let mut session = session_with(2, &mut camera);
    session.review().enter().unwrap();

    session.review().remove(9).unwrap();
    assert_eq!(session.state(), SessionState::Reviewing);
    assert_eq!(orders(&session), vec![1, 2]);
}

#[test]
fn test_exit_review_keeps_images() {
    let mut camera = FakeCamera::default();
    let mut session = session_with(2, &mut camera);

    session.review().enter().unwrap();
    assert!(matches!(
        session.capture(&mut camera),
        Err(ScanError::InvalidState { state: SessionState::Reviewing, .. })
    ));

    session.review().exit().unwrap();
    assert_eq!(session.state(), SessionState::Capturing);
    assert_eq!(orders(&session), vec![1, 2]);
    assert!(session.images().iter().all(|i| i.status == ImageStatus::Pending));

    session.capture(&mut camera).unwrap();
    assert_eq!(orders(&session), vec![1, 2, 3]);
}

#[test]
fn test_cancel_before_upload() {
    let mut camera = FakeCamera::default();
    let mut session = session_with(3, &mut camera);
    session.review().enter().unwrap();

    assert_eq!(session.cancel().unwrap(), 3);
    assert_eq!(session.state(), SessionState::Discarded);
    assert!(session.images().is_empty());
    assert!(matches!(
        session.capture(&mut camera),
        Err(ScanError::InvalidState { .. })
    ));
    assert!(session.into_result().is_none());
}

#[tokio::test]
async fn test_complete_session_is_terminal() {
    let backend = Arc::new(FakeBackend::default());
    let uploader = uploader(backend.clone());
    let mut camera = FakeCamera::default();
    let mut session = session_with(1, &mut camera);

    session.review().enter().unwrap();
    session.review().confirm_upload(&signed_in()).unwrap();
    let result = session.upload(&uploader).await.unwrap();

    assert!(matches!(session.upload(&uploader).await, Err(ScanError::InvalidState { .. })));
    assert!(matches!(session.capture(&mut camera), Err(ScanError::InvalidState { .. })));
    assert!(matches!(session.review().enter(), Err(ScanError::InvalidState { .. })));
    assert!(matches!(session.cancel(), Err(ScanError::InvalidState { .. })));
    assert_eq!(backend.uploaded_files().len(), 1);

    assert_eq!(session.result(), Some(&result));
    assert_eq!(session.into_result(), Some(result));
}

#[tokio::test]
async fn test_observer_sees_capture_and_progress() {
    let observer = Arc::new(RecordingObserver::default());
    let backend = Arc::new(FakeBackend::failing(&[1]));
    let mut camera = FakeCamera::default();

    let mut session = BatchSession::with_observer(UploadTarget::default(), observer.clone());
    session.capture(&mut camera).unwrap();
    session.capture(&mut camera).unwrap();
    session.remove(1).unwrap();
    session.capture(&mut camera).unwrap();

    session.review().enter().unwrap();
    session.review().confirm_upload(&signed_in()).unwrap();
    session.upload(&uploader(backend)).await.unwrap();

    assert_eq!(
        observer.events(),
        vec![
            Event::Captured(1),
            Event::BufferChanged(vec![1]),
            Event::Captured(2),
            Event::BufferChanged(vec![1, 2]),
            Event::BufferChanged(vec![2]),
            Event::Captured(3),
            Event::BufferChanged(vec![2, 3]),
            Event::Progress(0, 2),
            Event::Progress(1, 2),
            Event::Progress(2, 2),
            Event::Complete(1, 2),
        ]
    );
}

#[test]
fn test_confirm_requires_review() {
    let mut camera = FakeCamera::default();
    let mut session = session_with(1, &mut camera);

    assert!(matches!(
        session.review().confirm_upload(&signed_in()),
        Err(ScanError::InvalidState { state: SessionState::Capturing, .. })
    ));
    assert!(matches!(
        session.review().exit(),
        Err(ScanError::InvalidState { .. })
    ));
    assert_eq!(session.state(), SessionState::Capturing);
}
