//! Seams between the adapter lifecycle and the wire client.
//!
//! `ToolAdapter` only talks to these traits, so the lifecycle can be driven by
//! the rmcp-backed [`McpConnector`](crate::client::McpConnector) in production
//! and by in-process fakes in tests.

use std::future::Future;

use crate::config::ToolConnectionConfig;
use crate::error::McpError;
use crate::tool::{McpTool, ToolCallOutput};

/// An established connection to a tool server.
pub trait ToolSession: Send + Sync + 'static {
    /// `tools/list`, in server-reported order.
    fn list_tools(&self) -> impl Future<Output = Result<Vec<McpTool>, McpError>> + Send;

    /// `tools/call` with a JSON object of arguments.
    fn call_tool(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> impl Future<Output = Result<ToolCallOutput, McpError>> + Send;

    /// Disconnect handshake. Consumes the session so it cannot run twice.
    fn close(self) -> impl Future<Output = Result<(), McpError>> + Send;

    /// Synchronous teardown for contexts that cannot drive `close`, such as
    /// `Drop` on a current-thread runtime. Must not block on the runtime.
    fn abort(self);
}

/// Opens sessions for a connection config.
pub trait Connector: Send + Sync {
    type Session: ToolSession;

    fn connect(
        &self,
        config: &ToolConnectionConfig,
    ) -> impl Future<Output = Result<Self::Session, McpError>> + Send;
}
