//! Presentation layer for toolhost
//!
//! This crate contains CLI definitions, console output formatting,
//! progress reporters, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{HostRepl, ReplCommand};
pub use cli::commands::Cli;
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
