//! Interactive chat module
//!
//! Provides a readline-based interactive loop over one conversation.

mod command;
mod repl;

pub use command::ReplCommand;
pub use repl::HostRepl;
