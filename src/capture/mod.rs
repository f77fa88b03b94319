pub mod buffer;
pub mod image;
pub mod source;

pub use buffer::CaptureBuffer;
pub use image::{CapturedImage, ImageRef, ImageStatus};
pub use source::{CaptureSource, FileCaptureSource};
