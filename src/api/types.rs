use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One image plus its metadata, as sent to `POST /scan/upload`
#[derive(Debug, Clone)]
pub struct ScanUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub assessment_id: Option<i64>,
    pub student_id: Option<i64>,
}

/// Created-resource descriptor returned for an accepted upload. Any JSON
/// object is accepted; identifiers are read leniently so an unexpected field
/// type never turns an accepted upload into a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadReceipt {
    pub fields: Map<String, Value>,
}

impl UploadReceipt {
    /// `submission_id`, falling back to `id`, as text
    pub fn resource_id(&self) -> Option<String> {
        self.text("submission_id").or_else(|| self.text("id"))
    }

    pub fn status(&self) -> Option<String> {
        self.text("status")
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Error body shape used by the backend: `{ "detail": ... }`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub content_score: Option<i64>,
    #[serde(default)]
    pub handwriting_score: Option<i64>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub assessment_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub classroom_id: Option<i64>,
    #[serde(default)]
    pub rubric_id: Option<i64>,
    #[serde(default)]
    pub reference_exam_id: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SetReferenceRequest {
    pub reference_exam_id: i64,
}
