use tracing::{info, warn};

use crate::{
    auth::CredentialProvider,
    capture::CapturedImage,
    error::{Result, ScanError},
    session::state::{BatchSession, Phase},
    upload::UploadRun,
};

/// Lets the user inspect and prune a batch before committing it for upload
pub struct BatchReviewController<'s> {
    session: &'s mut BatchSession,
}

impl<'s> BatchReviewController<'s> {
    pub(crate) fn new(session: &'s mut BatchSession) -> Self {
        Self { session }
    }

    /// Open review. Requires at least one pending image.
    pub fn enter(self) -> Result<()> {
        match &self.session.phase {
            Phase::Capturing(buffer) if buffer.has_pending() => {}
            Phase::Capturing(_) => return Err(ScanError::EmptyBatch),
            Phase::Uploading(_) => return Err(ScanError::SessionBusy),
            _ => return Err(self.session.invalid("enter review")),
        }

        let buffer = self.session.take_buffer();
        info!("Reviewing batch of {} images", buffer.len());
        self.session.phase = Phase::Reviewing(buffer);
        Ok(())
    }

    /// Back to capturing; images are left as they are
    pub fn exit(self) -> Result<()> {
        match &self.session.phase {
            Phase::Reviewing(_) => {}
            Phase::Uploading(_) => return Err(ScanError::SessionBusy),
            _ => return Err(self.session.invalid("leave review")),
        }

        let buffer = self.session.take_buffer();
        self.session.phase = Phase::Capturing(buffer);
        Ok(())
    }

    pub fn images(&self) -> &[CapturedImage] {
        self.session.images()
    }

    pub fn remove(self, order: u32) -> Result<()> {
        self.session.remove(order)
    }

    /// Commit the batch for upload. Irreversible once it succeeds.
    ///
    /// Without a credential this fails with `Unauthenticated` and the session
    /// stays in review so the user can retry after signing in.
    pub fn confirm_upload(self, auth: &dyn CredentialProvider) -> Result<()> {
        match &self.session.phase {
            Phase::Reviewing(_) => {}
            Phase::Uploading(_) => return Err(ScanError::SessionBusy),
            _ => return Err(self.session.invalid("confirm upload")),
        }

        let Some(credential) = auth.credential() else {
            warn!("Upload confirmed without a credential, staying in review");
            return Err(ScanError::Unauthenticated);
        };

        let buffer = self.session.take_buffer();
        let run = UploadRun::new(buffer.into_images(), credential, self.session.target().clone());
        info!(
            "Batch {} confirmed: {} images for {}",
            self.session.id(),
            run.total(),
            self.session.target()
        );

        self.session.observer.on_upload_progress(0, run.total());
        self.session.phase = Phase::Uploading(run);
        Ok(())
    }
}
