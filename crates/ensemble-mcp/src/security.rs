//! Pre-connect policy checks for tool server endpoints.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use url::Url;

use crate::config::ConnectPolicy;
use crate::error::McpError;

/// Launchers a stdio server may be started with when no extra commands are configured.
pub const BUILTIN_COMMANDS: &[&str] = &[
    "npx", "uvx", "node", "python3", "python", "docker", "deno", "bun",
];

/// Variables that let the parent inject code into the spawned server.
const HIJACK_VARS: &[&str] = &[
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "LD_AUDIT",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    "BASH_ENV",
    "ENV",
    "PYTHONPATH",
    "PYTHONSTARTUP",
    "NODE_OPTIONS",
    "NODE_PATH",
    "PERL5OPT",
    "JAVA_TOOL_OPTIONS",
];

impl ConnectPolicy {
    /// Gate a stdio launch: the command must be a bare allowlisted name and
    /// the environment must not carry loader or interpreter hooks.
    ///
    /// # Errors
    ///
    /// `McpError::CommandNotAllowed` or `McpError::EnvVarBlocked`.
    pub fn check_stdio<S: std::hash::BuildHasher>(
        &self,
        command: &str,
        env: &HashMap<String, String, S>,
    ) -> Result<(), McpError> {
        let bare = !command.is_empty() && !command.contains(['/', '\\']);
        let listed = BUILTIN_COMMANDS.contains(&command)
            || self.allowed_commands.iter().any(|c| c == command);
        if !(bare && listed) {
            return Err(McpError::CommandNotAllowed {
                command: command.into(),
            });
        }

        match env
            .keys()
            .find(|k| HIJACK_VARS.contains(&k.as_str()) || k.starts_with("BASH_FUNC_"))
        {
            Some(key) => Err(McpError::EnvVarBlocked {
                var_name: key.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Gate an HTTP endpoint. With `block_private_hosts` set, every address the
    /// host resolves to must be publicly routable.
    ///
    /// # Errors
    ///
    /// `McpError::SsrfBlocked` for an internal address, `McpError::InvalidUrl`
    /// when the host is missing or does not resolve.
    pub async fn check_endpoint(&self, url: &Url) -> Result<(), McpError> {
        if !self.block_private_hosts {
            return Ok(());
        }
        let invalid = |message: String| McpError::InvalidUrl {
            url: url.to_string(),
            message,
        };

        let host = url
            .host_str()
            .ok_or_else(|| invalid("missing host".into()))?
            .trim_start_matches('[')
            .trim_end_matches(']');
        let port = url.port_or_known_default().unwrap_or(80);

        let resolved = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| invalid(format!("DNS resolution failed: {e}")))?;

        if let Some(addr) = resolved.map(|a| a.ip()).find(|ip| is_internal(*ip)) {
            tracing::warn!(%url, %addr, "refusing MCP endpoint on internal address");
            return Err(McpError::SsrfBlocked {
                url: url.to_string(),
                addr: addr.to_string(),
            });
        }
        Ok(())
    }
}

fn is_internal(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_internal_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_internal_v4(v4),
            None => is_internal_v6(v6),
        },
    }
}

fn is_internal_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
}

fn is_internal_v6(ip: Ipv6Addr) -> bool {
    let head = ip.segments()[0];
    // fc00::/7 unique local, fe80::/10 link-local
    ip.is_loopback() || ip.is_unspecified() || head & 0xfe00 == 0xfc00 || head & 0xffc0 == 0xfe80
}
