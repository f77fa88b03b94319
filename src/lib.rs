pub mod api;
pub mod auth;
pub mod capture;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod upload;
pub mod utils;

pub use config::Config;
pub use error::{Result, ScanError, UploadError};
pub use session::{BatchObserver, BatchSession, SessionState};
pub use upload::{BatchResult, SequentialUploader, UploadOutcome, UploadTarget};
