/// Failures of the tool server connection, its policy checks, and tool calls.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("connection failed for server '{server_id}': {message}")]
    Connection { server_id: String, message: String },

    #[error("connection to server '{server_id}' timed out after {timeout_secs}s")]
    ConnectTimeout { server_id: String, timeout_secs: u64 },

    #[error("disconnect failed for server '{server_id}': {message}")]
    Disconnect { server_id: String, message: String },

    #[error("tool call failed: {server_id}/{tool_name}: {message}")]
    ToolCall {
        server_id: String,
        tool_name: String,
        message: String,
    },

    #[error("server '{server_id}' is not connected")]
    NotConnected { server_id: String },

    #[error("server '{server_id}' does not advertise tool '{tool_name}'")]
    ToolNotFound {
        server_id: String,
        tool_name: String,
    },

    #[error("call to {server_id}/{tool_name} timed out after {timeout_secs}s")]
    Timeout {
        server_id: String,
        tool_name: String,
        timeout_secs: u64,
    },

    #[error("invalid connection config: {0}")]
    InvalidConfig(String),

    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("SSRF blocked: '{url}' resolves to private address {addr}")]
    SsrfBlocked { url: String, addr: String },

    #[error("command '{command}' is not allowed")]
    CommandNotAllowed { command: String },

    #[error("env var '{var_name}' is blocked")]
    EnvVarBlocked { var_name: String },
}
