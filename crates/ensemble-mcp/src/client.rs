use std::borrow::Cow;
use std::collections::HashMap;

use rmcp::ServiceExt;
use rmcp::model::{CallToolRequestParams, RawContent};
use rmcp::service::RunningService;
use rmcp::transport::TokioChildProcess;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransport;
use tokio::process::Command;
use url::Url;

use crate::config::{ConnectPolicy, McpTransport, ToolConnectionConfig};
use crate::error::McpError;
use crate::session::{Connector, ToolSession};
use crate::tool::{McpTool, ToolCallOutput};

type ClientService = RunningService<rmcp::RoleClient, ()>;

/// Live rmcp client session.
pub struct McpClient {
    server_id: String,
    service: ClientService,
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("server_id", &self.server_id)
            .finish_non_exhaustive()
    }
}

impl McpClient {
    /// Run the policy checks for the configured transport, then perform the MCP handshake.
    ///
    /// No timeout is applied here; the caller bounds the whole attempt.
    ///
    /// # Errors
    ///
    /// Returns a policy error (`CommandNotAllowed`, `EnvVarBlocked`, `SsrfBlocked`,
    /// `InvalidUrl`) or `McpError::Connection` if the transport or handshake fails.
    pub async fn connect(config: &ToolConnectionConfig) -> Result<Self, McpError> {
        match config.transport() {
            McpTransport::Http { url } => {
                Self::connect_url(config.server_id(), url, config.policy()).await
            }
            McpTransport::Stdio { command, args, env } => {
                Self::connect_stdio(config.server_id(), command, args, env, config.policy()).await
            }
        }
    }

    async fn connect_stdio(
        server_id: &str,
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        policy: &ConnectPolicy,
    ) -> Result<Self, McpError> {
        policy.check_stdio(command, env)?;

        let mut cmd = Command::new(command);
        cmd.args(args);
        for (k, v) in env {
            cmd.env(k, v);
        }

        let transport = TokioChildProcess::new(cmd).map_err(|e| McpError::Connection {
            server_id: server_id.into(),
            message: e.to_string(),
        })?;

        let service = ().serve(transport).await.map_err(|e| McpError::Connection {
            server_id: server_id.into(),
            message: e.to_string(),
        })?;

        Ok(Self {
            server_id: server_id.into(),
            service,
        })
    }

    async fn connect_url(
        server_id: &str,
        url: &Url,
        policy: &ConnectPolicy,
    ) -> Result<Self, McpError> {
        policy.check_endpoint(url).await?;

        let transport = StreamableHttpClientTransport::from_uri(url.as_str().to_owned());

        let service = ().serve(transport).await.map_err(|e| McpError::Connection {
            server_id: server_id.into(),
            message: e.to_string(),
        })?;

        Ok(Self {
            server_id: server_id.into(),
            service,
        })
    }
}

impl ToolSession for McpClient {
    async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        let tools = self
            .service
            .list_all_tools()
            .await
            .map_err(|e| McpError::ToolCall {
                server_id: self.server_id.clone(),
                tool_name: "tools/list".into(),
                message: e.to_string(),
            })?;

        Ok(tools
            .into_iter()
            .map(|t| McpTool {
                server_id: self.server_id.clone(),
                name: t.name.to_string(),
                description: t.description.map_or_else(String::new, |d| d.to_string()),
                input_schema: serde_json::Value::Object((*t.input_schema).clone()),
            })
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolCallOutput, McpError> {
        let arguments = match args {
            serde_json::Value::Object(map) => Some(map),
            serde_json::Value::Null => None,
            other => {
                return Err(McpError::ToolCall {
                    server_id: self.server_id.clone(),
                    tool_name: name.into(),
                    message: format!("arguments must be a JSON object, got {other}"),
                });
            }
        };

        let params = CallToolRequestParams {
            name: Cow::Owned(name.to_owned()),
            arguments,
            task: None,
            meta: None,
        };

        let result = self
            .service
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCall {
                server_id: self.server_id.clone(),
                tool_name: name.into(),
                message: e.to_string(),
            })?;

        let text = result
            .content
            .iter()
            .filter_map(|c| {
                if let RawContent::Text(t) = &c.raw {
                    Some(t.text.as_str())
                } else {
                    tracing::debug!(
                        server_id = self.server_id,
                        tool = name,
                        "skipping non-text content from MCP tool"
                    );
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolCallOutput {
            text,
            is_error: result.is_error.unwrap_or(false),
        })
    }

    async fn close(self) -> Result<(), McpError> {
        let reason = self
            .service
            .cancel()
            .await
            .map_err(|e| McpError::Disconnect {
                server_id: self.server_id.clone(),
                message: e.to_string(),
            })?;
        tracing::debug!(server_id = self.server_id, ?reason, "MCP session closed");
        Ok(())
    }

    fn abort(self) {
        // Stops the service loop; the transport is dropped with it.
        self.service.cancellation_token().cancel();
        tracing::debug!(server_id = self.server_id, "MCP session cancelled");
    }
}

/// Connector backed by rmcp transports.
#[derive(Debug, Clone, Copy, Default)]
pub struct McpConnector;

impl Connector for McpConnector {
    type Session = McpClient;

    async fn connect(&self, config: &ToolConnectionConfig) -> Result<McpClient, McpError> {
        McpClient::connect(config).await
    }
}
