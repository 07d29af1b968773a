//! MCP (Model Context Protocol) adapter
//!
//! Tool sessions that talk JSON-RPC 2.0 to MCP servers over stdio.

pub mod connector;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use connector::StdioSessionConnector;
pub use error::McpError;
pub use session::{SessionOptions, StdioToolSession};
