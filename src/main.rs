use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use ensemble_core::config::LogFormat;
use ensemble_core::{Config, Crew};
use ensemble_mcp::{AdapterState, McpConnector, ToolAdapter, ToolConnectionConfig};

#[derive(Debug, Parser)]
#[command(
    name = "ensemble",
    version,
    about = "Sequential multi-agent crew with a managed MCP tool connection"
)]
struct Cli {
    /// Path to config file (defaults to $ENSEMBLE_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connect to the MCP server and list the tools it advertises
    Tools,
    /// Assemble the crew against the live tool snapshot and print the plan
    Plan {
        /// Crew input as key=value, e.g. --input project_key=PM
        #[arg(long = "input", value_parser = parse_input)]
        inputs: Vec<(String, String)>,
        /// Also print the rendered prompt of every task
        #[arg(long)]
        prompts: bool,
    },
    /// Call one MCP tool and print its text output
    Call {
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());
    init_subscriber(log_format(&config_path));
    let config = Config::load(&config_path)?;
    config.validate()?;
    tracing::debug!(path = %config_path.display(), "configuration loaded");

    let connection = config.mcp.connection()?;

    tokio::select! {
        result = run(cli.command, &config, connection.as_ref()) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, shutting down");
            Ok(())
        }
    }
}

async fn run(
    command: Command,
    config: &Config,
    connection: Option<&ToolConnectionConfig>,
) -> anyhow::Result<()> {
    match command {
        Command::Tools => {
            let conn = connection.context("MCP is disabled in the [mcp] section")?;
            ToolAdapter::scoped(
                McpConnector,
                conn,
                async |adapter: &ToolAdapter| -> anyhow::Result<()> {
                    ensure_connected(adapter)?;
                    for tool in adapter.current_tools() {
                        if tool.description.is_empty() {
                            println!("{}", tool.name);
                        } else {
                            println!("{}\t{}", tool.name, tool.description);
                        }
                    }
                    Ok(())
                },
            )
            .await
        }
        Command::Plan { inputs, prompts } => {
            let inputs: HashMap<String, String> = inputs.into_iter().collect();
            let Some(conn) = connection else {
                print_plan(&Crew::assemble(config, &[])?, &inputs, prompts);
                return Ok(());
            };
            ToolAdapter::scoped(
                McpConnector,
                conn,
                async |adapter: &ToolAdapter| -> anyhow::Result<()> {
                    let crew = Crew::assemble(config, adapter.current_tools())?;
                    print_plan(&crew, &inputs, prompts);
                    Ok(())
                },
            )
            .await
        }
        Command::Call { tool, args } => {
            let args: serde_json::Value =
                serde_json::from_str(&args).context("--args must be valid JSON")?;
            let conn = connection.context("MCP is disabled in the [mcp] section")?;
            ToolAdapter::scoped(
                McpConnector,
                conn,
                async move |adapter: &ToolAdapter| -> anyhow::Result<()> {
                    ensure_connected(adapter)?;
                    let output = adapter.call_tool(&tool, args).await?;
                    println!("{}", output.text);
                    if output.is_error {
                        bail!("tool '{tool}' reported an error");
                    }
                    Ok(())
                },
            )
            .await
        }
    }
}

fn ensure_connected(adapter: &ToolAdapter) -> anyhow::Result<()> {
    if adapter.state() == AdapterState::Connected {
        return Ok(());
    }
    bail!(
        "MCP server '{}' unavailable: {}",
        adapter.server_id(),
        adapter.last_error().unwrap_or("not connected")
    )
}

fn print_plan(crew: &Crew, inputs: &HashMap<String, String>, prompts: bool) {
    print!("{}", crew.plan());
    if prompts {
        for task in crew.tasks() {
            println!("\n=== {} ===\n{}", task.id, task.render_prompt(inputs, &[]));
        }
    }
}

fn parse_input(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

fn resolve_config_path(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("ENSEMBLE_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

/// Log format for the subscriber, read before it is installed. Warnings from
/// this read have nowhere to go; the main load repeats them once logging is up.
fn log_format(config_path: &Path) -> LogFormat {
    Config::load(config_path)
        .map_or_else(|_| LogFormat::default(), |c| c.observability.log_format)
}

fn init_subscriber(format: LogFormat) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_splits_on_first_equals() {
        assert_eq!(
            parse_input("project_key=PM").unwrap(),
            ("project_key".into(), "PM".into())
        );
        assert_eq!(
            parse_input("query=a=b").unwrap(),
            ("query".into(), "a=b".into())
        );
        assert_eq!(parse_input("empty=").unwrap(), ("empty".into(), String::new()));
    }

    #[test]
    fn parse_input_rejects_malformed() {
        assert!(parse_input("no_equals").is_err());
        assert!(parse_input("=value").is_err());
    }

    #[test]
    fn config_flag_wins() {
        let path = resolve_config_path(Some(Path::new("/etc/ensemble.toml")));
        assert_eq!(path, PathBuf::from("/etc/ensemble.toml"));
    }

    #[test]
    fn log_format_comes_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ensemble.toml");
        std::fs::write(&path, "[observability]\nlog_format = \"json\"\n").unwrap();
        assert_eq!(log_format(&path), LogFormat::Json);
    }

    #[test]
    fn log_format_falls_back_on_unreadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[crew\n").unwrap();
        assert_eq!(log_format(&path), LogFormat::Pretty);
    }

    #[test]
    fn cli_parses_plan_inputs() {
        let cli = Cli::try_parse_from([
            "ensemble",
            "plan",
            "--input",
            "project_key=PM",
            "--input",
            "project_description=tracker",
            "--config",
            "crew.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("crew.toml")));
        let Command::Plan { inputs, prompts } = cli.command else {
            panic!("expected plan");
        };
        assert!(!prompts);
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].1, "PM");
    }

    #[test]
    fn cli_parses_call() {
        let cli =
            Cli::try_parse_from(["ensemble", "call", "create_ticket", "--args", r#"{"a":1}"#])
                .unwrap();
        let Command::Call { tool, args } = cli.command else {
            panic!("expected call");
        };
        assert_eq!(tool, "create_ticket");
        assert_eq!(args, r#"{"a":1}"#);
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["ensemble"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
