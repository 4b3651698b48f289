use std::collections::HashMap;
use std::time::Duration;

use url::Url;

use crate::error::McpError;

/// How the tool server is reached.
#[derive(Clone)]
pub enum McpTransport {
    /// Streamable HTTP endpoint.
    Http { url: Url },
    /// Child process speaking MCP over stdio.
    Stdio {
        command: String,
        args: Vec<String>,
        env: HashMap<String, String>,
    },
}

impl std::fmt::Debug for McpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http { url } => f.debug_struct("Http").field("url", &url.as_str()).finish(),
            Self::Stdio { command, args, env } => {
                let redacted: Vec<&str> = env.keys().map(String::as_str).collect();
                f.debug_struct("Stdio")
                    .field("command", command)
                    .field("args", args)
                    .field("env_keys", &redacted)
                    .finish()
            }
        }
    }
}

impl std::fmt::Display for McpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http { url } => write!(f, "{url}"),
            Self::Stdio { command, args, .. } => {
                write!(f, "stdio:{command}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
        }
    }
}

/// Connection policy applied before the handshake.
#[derive(Debug, Clone, Default)]
pub struct ConnectPolicy {
    /// Extra stdio commands permitted beyond the built-in allowlist.
    pub allowed_commands: Vec<String>,
    /// Reject HTTP endpoints resolving to loopback/private/link-local addresses.
    pub block_private_hosts: bool,
}

/// Immutable description of a single tool server connection.
///
/// The constructors enforce a positive timeout and a well-formed endpoint, so
/// a value of this type is always connectable in principle.
#[derive(Debug, Clone)]
pub struct ToolConnectionConfig {
    server_id: String,
    transport: McpTransport,
    connect_timeout: Duration,
    policy: ConnectPolicy,
}

impl ToolConnectionConfig {
    /// Connection to a streamable HTTP endpoint.
    ///
    /// # Errors
    ///
    /// Returns `McpError::InvalidUrl` if `endpoint` is not an absolute `http`/`https`
    /// URI, or `McpError::InvalidConfig` if the timeout is zero.
    pub fn http(
        server_id: impl Into<String>,
        endpoint: &str,
        connect_timeout_secs: u64,
    ) -> Result<Self, McpError> {
        let url = Url::parse(endpoint).map_err(|e| McpError::InvalidUrl {
            url: endpoint.into(),
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(McpError::InvalidUrl {
                url: endpoint.into(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Self::build(server_id, McpTransport::Http { url }, connect_timeout_secs)
    }

    /// Connection to a server spawned as a child process.
    ///
    /// # Errors
    ///
    /// Returns `McpError::InvalidConfig` if the command is empty or the timeout is zero.
    pub fn stdio(
        server_id: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
        env: HashMap<String, String>,
        connect_timeout_secs: u64,
    ) -> Result<Self, McpError> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(McpError::InvalidConfig("stdio command is empty".into()));
        }
        Self::build(
            server_id,
            McpTransport::Stdio { command, args, env },
            connect_timeout_secs,
        )
    }

    fn build(
        server_id: impl Into<String>,
        transport: McpTransport,
        connect_timeout_secs: u64,
    ) -> Result<Self, McpError> {
        if connect_timeout_secs == 0 {
            return Err(McpError::InvalidConfig(
                "connect timeout must be greater than zero".into(),
            ));
        }
        let server_id = server_id.into();
        if server_id.trim().is_empty() {
            return Err(McpError::InvalidConfig("server id is empty".into()));
        }
        Ok(Self {
            server_id,
            transport,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            policy: ConnectPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ConnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    #[must_use]
    pub fn transport(&self) -> &McpTransport {
        &self.transport
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    #[must_use]
    pub fn policy(&self) -> &ConnectPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_config_accepts_valid_endpoint() {
        let cfg = ToolConnectionConfig::http("jira", "http://localhost:9000/mcp", 60).unwrap();
        assert_eq!(cfg.server_id(), "jira");
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(60));
        assert!(matches!(cfg.transport(), McpTransport::Http { url } if url.port() == Some(9000)));
    }

    #[test]
    fn http_config_rejects_zero_timeout() {
        let err = ToolConnectionConfig::http("jira", "http://localhost:9000/mcp", 0).unwrap_err();
        assert!(matches!(err, McpError::InvalidConfig(_)));
    }

    #[test]
    fn http_config_rejects_malformed_uri() {
        let err = ToolConnectionConfig::http("jira", "not a uri", 5).unwrap_err();
        assert!(matches!(err, McpError::InvalidUrl { .. }));
    }

    #[test]
    fn http_config_rejects_non_http_scheme() {
        let err = ToolConnectionConfig::http("jira", "ftp://localhost/mcp", 5).unwrap_err();
        assert!(matches!(err, McpError::InvalidUrl { ref message, .. } if message.contains("ftp")));
    }

    #[test]
    fn stdio_config_rejects_empty_command() {
        let err = ToolConnectionConfig::stdio("fs", "  ", vec![], HashMap::new(), 5).unwrap_err();
        assert!(matches!(err, McpError::InvalidConfig(_)));
    }

    #[test]
    fn empty_server_id_rejected() {
        assert!(ToolConnectionConfig::http("", "http://localhost:9000/mcp", 5).is_err());
    }

    #[test]
    fn stdio_debug_hides_env_values() {
        let cfg = ToolConnectionConfig::stdio(
            "jira",
            "npx",
            vec!["-y".into(), "jira-mcp".into()],
            HashMap::from([("JIRA_TOKEN".into(), "secret-value".into())]),
            5,
        )
        .unwrap();
        let debug = format!("{cfg:?}");
        assert!(debug.contains("JIRA_TOKEN"));
        assert!(!debug.contains("secret-value"));
    }

    #[test]
    fn transport_display() {
        let cfg = ToolConnectionConfig::stdio(
            "fs",
            "npx",
            vec!["-y".into(), "fs-mcp".into()],
            HashMap::new(),
            5,
        )
        .unwrap();
        assert_eq!(cfg.transport().to_string(), "stdio:npx -y fs-mcp");
    }

    #[test]
    fn policy_defaults_permissive_for_local_servers() {
        let cfg = ToolConnectionConfig::http("jira", "http://127.0.0.1:9000/mcp", 5).unwrap();
        assert!(!cfg.policy().block_private_hosts);
        assert!(cfg.policy().allowed_commands.is_empty());
    }
}
