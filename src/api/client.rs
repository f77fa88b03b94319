use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    api::{
        backend::ScanBackend,
        types::{Assessment, ErrorBody, Exam, ScanUpload, SetReferenceRequest, UploadReceipt},
    },
    error::{Result, ScanError, UploadError},
};

/// HTTP client for the grading backend
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl ApiClient {
    /// `request_timeout` applies to the read/mark endpoints; uploads are bounded
    /// by the uploader's per-call timeout instead.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// List the exams submitted for an assessment
    pub async fn list_assessment_exams(&self, credential: &str, assessment_id: i64) -> Result<Vec<Exam>> {
        let response = self
            .client
            .get(self.url(&format!("/assessments/{}/exams", assessment_id)))
            .bearer_auth(credential)
            .timeout(self.request_timeout)
            .send()
            .await?;

        read_json(response).await
    }

    /// Mark an exam as the answer key of an assessment
    pub async fn set_reference_exam(
        &self,
        credential: &str,
        assessment_id: i64,
        exam_id: i64,
    ) -> Result<Assessment> {
        let response = self
            .client
            .put(self.url(&format!("/assessments/{}/reference", assessment_id)))
            .bearer_auth(credential)
            .timeout(self.request_timeout)
            .json(&SetReferenceRequest { reference_exam_id: exam_id })
            .send()
            .await?;

        let assessment = read_json(response).await?;
        info!("Exam {} set as reference for assessment {}", exam_id, assessment_id);
        Ok(assessment)
    }

    fn upload_form(upload: ScanUpload) -> std::result::Result<multipart::Form, UploadError> {
        let file_part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.mime_type)
            .map_err(|e| UploadError::LocalImage(format!("Invalid MIME type: {}", e)))?;

        let mut form = multipart::Form::new().part("file", file_part);
        if let Some(assessment_id) = upload.assessment_id {
            form = form.text("assessment_id", assessment_id.to_string());
        }
        if let Some(student_id) = upload.student_id {
            form = form.text("student_id", student_id.to_string());
        }

        Ok(form)
    }
}

#[async_trait]
impl ScanBackend for ApiClient {
    async fn upload_scan(
        &self,
        credential: &str,
        upload: ScanUpload,
    ) -> std::result::Result<UploadReceipt, UploadError> {
        debug!(
            "Uploading {} ({} bytes, assessment {:?})",
            upload.file_name,
            upload.bytes.len(),
            upload.assessment_id
        );

        let form = Self::upload_form(upload)?;
        let response = self
            .client
            .post(self.url("/scan/upload"))
            .bearer_auth(credential)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                detail: error_detail(status, &body),
            });
        }

        serde_json::from_str(&body).map_err(|e| UploadError::MalformedResponse(e.to_string()))
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ScanError::Api {
            status: status.as_u16(),
            detail: error_detail(status, &body),
        });
    }

    Ok(serde_json::from_str(&body)?)
}

/// The backend's `detail` message when the body carries one, otherwise a
/// generic message naming the status
pub(crate) fn error_detail(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.detail)
        .and_then(|detail| match detail {
            Value::String(message) if !message.trim().is_empty() => Some(message),
            Value::String(_) | Value::Null => None,
            other => Some(other.to_string()),
        });

    detail.unwrap_or_else(|| format!("Upload failed (HTTP {})", status.as_u16()))
}
