pub mod result;
pub mod uploader;

pub use result::{BatchResult, UploadOutcome, UploadedScan};
pub use uploader::{SequentialUploader, UploadRun};

use serde::{Deserialize, Serialize};

/// Backend grouping the batch is uploaded into. Both absent means an
/// unassigned upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    pub assessment_id: Option<i64>,
    pub student_id: Option<i64>,
}

impl std::fmt::Display for UploadTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.assessment_id, self.student_id) {
            (Some(assessment), Some(student)) => write!(f, "assessment #{} / student #{}", assessment, student),
            (Some(assessment), None) => write!(f, "assessment #{}", assessment),
            (None, Some(student)) => write!(f, "student #{} (no assessment)", student),
            (None, None) => write!(f, "quick scan (unassigned)"),
        }
    }
}
