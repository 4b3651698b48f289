//! Tool adapter lifecycle: acquire one tool server connection, expose its tool
//! snapshot, release it exactly once.
//!
//! Failures never escape the lifecycle methods. A failed connect leaves the
//! adapter in [`AdapterState::Failed`] with an empty tool list; a failed
//! disconnect is logged and swallowed. If the owner never calls
//! [`ToolAdapter::release`], `Drop` disconnects: through the close handshake
//! when it can block, through [`ToolSession::abort`] on a current-thread runtime.

use std::time::Duration;

use tokio::runtime::{Handle, RuntimeFlavor};

use crate::client::McpConnector;
use crate::config::ToolConnectionConfig;
use crate::error::McpError;
use crate::session::{Connector, ToolSession};
use crate::tool::{McpTool, ToolCallOutput, tool_names};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Disconnected,
    Connected,
    Failed,
}

impl std::fmt::Display for AdapterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Failed => "failed",
        })
    }
}

pub struct ToolAdapter<C: Connector = McpConnector> {
    connector: C,
    server_id: String,
    call_timeout: Duration,
    state: AdapterState,
    session: Option<C::Session>,
    tools: Vec<McpTool>,
    last_error: Option<String>,
}

impl<C: Connector> std::fmt::Debug for ToolAdapter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolAdapter")
            .field("server_id", &self.server_id)
            .field("state", &self.state)
            .field("tools", &tool_names(&self.tools))
            .finish_non_exhaustive()
    }
}

impl ToolAdapter {
    /// Adapter backed by the rmcp transports.
    #[must_use]
    pub fn mcp() -> Self {
        Self::new(McpConnector)
    }
}

impl<C: Connector> ToolAdapter<C> {
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            server_id: String::new(),
            call_timeout: Duration::ZERO,
            state: AdapterState::Disconnected,
            session: None,
            tools: Vec::new(),
            last_error: None,
        }
    }

    /// Connect, list tools, and record the outcome.
    ///
    /// The handshake and the initial `tools/list` together are bounded by the
    /// config's connect timeout. Any failure is logged and turned into
    /// `Failed` with an empty tool list; it is never returned as an error.
    ///
    /// A fresh attempt is allowed from `Disconnected` or `Failed`. While
    /// `Connected` the call is ignored and the current snapshot is returned.
    pub async fn initialize(
        &mut self,
        config: &ToolConnectionConfig,
    ) -> (AdapterState, Vec<McpTool>) {
        if self.state == AdapterState::Connected {
            tracing::warn!(
                server_id = self.server_id,
                "MCP adapter already connected, ignoring re-initialization"
            );
            return (self.state, self.tools.clone());
        }

        self.server_id = config.server_id().to_owned();
        self.call_timeout = config.connect_timeout();
        self.tools.clear();
        self.last_error = None;

        let timeout = config.connect_timeout();
        let outcome = match tokio::time::timeout(timeout, open(&self.connector, config)).await {
            Ok(result) => result,
            Err(_) => Err(McpError::ConnectTimeout {
                server_id: self.server_id.clone(),
                timeout_secs: timeout.as_secs(),
            }),
        };

        match outcome {
            Ok((session, tools)) => {
                tracing::info!(
                    server_id = self.server_id,
                    endpoint = %config.transport(),
                    tools = ?tool_names(&tools),
                    "available MCP tools"
                );
                self.session = Some(session);
                self.tools = tools;
                self.state = AdapterState::Connected;
            }
            Err(e) => {
                tracing::error!(
                    server_id = self.server_id,
                    endpoint = %config.transport(),
                    "MCP tool initialization failed: {e:#}"
                );
                self.last_error = Some(e.to_string());
                self.state = AdapterState::Failed;
            }
        }

        (self.state, self.tools.clone())
    }

    /// Tools captured by the last successful `initialize`.
    ///
    /// Empty before the first attempt, after a failed attempt, and after release.
    #[must_use]
    pub fn current_tools(&self) -> &[McpTool] {
        &self.tools
    }

    #[must_use]
    pub fn state(&self) -> AdapterState {
        self.state
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == AdapterState::Connected
    }

    #[must_use]
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Cause of the most recent failed `initialize`, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Invoke a tool on the connected server.
    ///
    /// # Errors
    ///
    /// Returns `McpError::NotConnected` without a live session,
    /// `McpError::ToolNotFound` if the server did not advertise `name`,
    /// `McpError::Timeout` if the call exceeds the connect timeout, or the
    /// session's `McpError::ToolCall`.
    pub async fn call_tool(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolCallOutput, McpError> {
        let session = self.session.as_ref().ok_or_else(|| McpError::NotConnected {
            server_id: self.server_id.clone(),
        })?;
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(McpError::ToolNotFound {
                server_id: self.server_id.clone(),
                tool_name: name.into(),
            });
        }

        tokio::time::timeout(self.call_timeout, session.call_tool(name, args))
            .await
            .map_err(|_| McpError::Timeout {
                server_id: self.server_id.clone(),
                tool_name: name.into(),
                timeout_secs: self.call_timeout.as_secs(),
            })?
    }

    /// Disconnect handshake. Runs at most once per successful `initialize`;
    /// later calls are no-ops. Disconnect errors are logged, never returned.
    pub async fn release(&mut self) {
        let Some(session) = self.take_session() else {
            return;
        };
        tracing::info!(server_id = self.server_id, "releasing MCP connection");
        close_logged(self.server_id.clone(), session).await;
    }

    /// Connect, hand the adapter to `f`, then release on the way out.
    ///
    /// If `f` panics the release still happens through `Drop`.
    pub async fn scoped<T>(
        connector: C,
        config: &ToolConnectionConfig,
        f: impl AsyncFnOnce(&Self) -> T,
    ) -> T {
        let mut adapter = Self::new(connector);
        adapter.initialize(config).await;
        let out = f(&adapter).await;
        adapter.release().await;
        out
    }

    fn take_session(&mut self) -> Option<C::Session> {
        let session = self.session.take()?;
        self.state = AdapterState::Disconnected;
        self.tools.clear();
        Some(session)
    }
}

impl<C: Connector> Drop for ToolAdapter<C> {
    fn drop(&mut self) {
        let Some(session) = self.take_session() else {
            return;
        };
        let server_id = std::mem::take(&mut self.server_id);
        tracing::debug!(server_id, "MCP adapter dropped while connected, releasing");

        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                let close = close_logged(server_id, session);
                tokio::task::block_in_place(|| handle.block_on(close));
            }
            // A current-thread runtime cannot be blocked from inside itself, and
            // a spawned close may never be polled once the runtime shuts down.
            Ok(_) => session.abort(),
            Err(_) => match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt.block_on(close_logged(server_id, session)),
                Err(e) => {
                    tracing::warn!(server_id, "no runtime for MCP disconnect, aborting: {e}");
                    session.abort();
                }
            },
        }
    }
}

async fn open<C: Connector>(
    connector: &C,
    config: &ToolConnectionConfig,
) -> Result<(C::Session, Vec<McpTool>), McpError> {
    let session = connector.connect(config).await?;
    match session.list_tools().await {
        Ok(tools) => Ok((session, tools)),
        Err(e) => {
            close_logged(config.server_id().to_owned(), session).await;
            Err(e)
        }
    }
}

async fn close_logged<S: ToolSession>(server_id: String, session: S) {
    if let Err(e) = session.close().await {
        tracing::error!(server_id, "MCP resource cleanup failed: {e:#}");
    }
}
