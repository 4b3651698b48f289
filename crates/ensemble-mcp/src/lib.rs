//! MCP tool adapter: connection lifecycle, tool discovery, and invocation.

pub mod adapter;
pub mod client;
pub mod config;
pub mod error;
pub mod prompt;
pub mod security;
pub mod session;
pub mod tool;

pub use adapter::{AdapterState, ToolAdapter};
pub use client::{McpClient, McpConnector};
pub use config::{ConnectPolicy, McpTransport, ToolConnectionConfig};
pub use error::McpError;
pub use prompt::format_mcp_tools_prompt;
pub use session::{Connector, ToolSession};
pub use tool::{McpTool, ToolCallOutput, tool_names};
