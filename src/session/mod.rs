pub mod observer;
pub mod review;
pub mod state;

#[cfg(test)]
mod tests;

pub use observer::{BatchObserver, NoopObserver, TracingObserver};
pub use review::BatchReviewController;
pub use state::{BatchSession, SessionState};
