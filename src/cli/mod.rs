pub mod commands;
pub mod progress;

pub use commands::{Cli, Commands};
pub use progress::ProgressObserver;
