pub mod backend;
pub mod client;
pub mod types;

pub use backend::ScanBackend;
pub use client::ApiClient;
pub use types::{Assessment, Exam, ScanUpload, UploadReceipt};
