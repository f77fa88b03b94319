use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_FILE_NAME: &str = "scan.jpg";

/// Opaque handle to the bytes of a captured image
#[derive(Clone, PartialEq)]
pub enum ImageRef {
    /// Image written to local storage by the capture device
    File(PathBuf),
    /// Image held in memory, named for the upload
    Memory { name: String, bytes: Arc<[u8]> },
}

impl ImageRef {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ImageRef::File(path.into())
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        ImageRef::Memory {
            name: name.into(),
            bytes: Arc::from(bytes),
        }
    }

    pub fn file_name(&self) -> String {
        let name = match self {
            ImageRef::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            ImageRef::Memory { name, .. } => Some(name.clone()),
        };

        name.filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
    }

    /// `image/<ext>` from the file name, `image/jpeg` when there is no extension
    pub fn mime_type(&self) -> String {
        let name = self.file_name();
        match Path::new(&name).extension().and_then(|ext| ext.to_str()) {
            Some(ext) if !ext.is_empty() => match ext.to_ascii_lowercase().as_str() {
                "jpg" => "image/jpeg".to_string(),
                "tif" => "image/tiff".to_string(),
                other => format!("image/{}", other),
            },
            _ => "image/jpeg".to_string(),
        }
    }

    pub async fn load(&self) -> std::io::Result<Vec<u8>> {
        match self {
            ImageRef::File(path) => tokio::fs::read(path).await,
            ImageRef::Memory { bytes, .. } => Ok(bytes.to_vec()),
        }
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::File(path) => f.debug_tuple("File").field(path).finish(),
            ImageRef::Memory { name, bytes } => f
                .debug_struct("Memory")
                .field("name", name)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::File(path) => write!(f, "{}", path.display()),
            ImageRef::Memory { name, .. } => write!(f, "{} (in memory)", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageStatus {
    Pending,
    Uploading,
    Succeeded,
    Failed,
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageStatus::Pending => write!(f, "Pending"),
            ImageStatus::Uploading => write!(f, "Uploading"),
            ImageStatus::Succeeded => write!(f, "Succeeded"),
            ImageStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// An image in the current batch
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub local_ref: ImageRef,
    /// Assigned at capture time, never reused within a session
    pub order: u32,
    pub status: ImageStatus,
    pub captured_at: DateTime<Utc>,
}

impl CapturedImage {
    pub fn new(local_ref: ImageRef, order: u32) -> Self {
        Self {
            local_ref,
            order,
            status: ImageStatus::Pending,
            captured_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ImageStatus::Pending
    }
}
