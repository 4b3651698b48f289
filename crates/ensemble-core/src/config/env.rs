use super::{Config, LogFormat};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ENSEMBLE_MCP_URL") {
            self.mcp.url = Some(v);
            self.mcp.command = None;
        }
        if let Ok(v) = std::env::var("ENSEMBLE_MCP_TIMEOUT") {
            match v.parse::<u64>() {
                Ok(secs) if secs > 0 => self.mcp.timeout = secs,
                _ => tracing::warn!("ignoring invalid ENSEMBLE_MCP_TIMEOUT value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("ENSEMBLE_MCP_ENABLED") {
            if let Ok(enabled) = v.parse::<bool>() {
                self.mcp.enabled = enabled;
            } else {
                tracing::warn!("ignoring invalid ENSEMBLE_MCP_ENABLED value: {v}");
            }
        }
        if let Ok(v) = std::env::var("ENSEMBLE_MCP_BLOCK_PRIVATE_HOSTS") {
            if let Ok(block) = v.parse::<bool>() {
                self.mcp.block_private_hosts = block;
            } else {
                tracing::warn!("ignoring invalid ENSEMBLE_MCP_BLOCK_PRIVATE_HOSTS value: {v}");
            }
        }
        if let Ok(v) = std::env::var("ENSEMBLE_CREW_VERBOSE") {
            if let Ok(verbose) = v.parse::<bool>() {
                self.crew.verbose = verbose;
            } else {
                tracing::warn!("ignoring invalid ENSEMBLE_CREW_VERBOSE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("ENSEMBLE_LOG_FORMAT") {
            match v.to_ascii_lowercase().as_str() {
                "pretty" => self.observability.log_format = LogFormat::Pretty,
                "json" => self.observability.log_format = LogFormat::Json,
                _ => tracing::warn!("ignoring invalid ENSEMBLE_LOG_FORMAT value: {v}"),
            }
        }
    }
}
