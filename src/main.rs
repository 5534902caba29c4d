use anyhow::{Context, Result};
use clap::Parser;
use osabridge::cli::{Cli, Commands};
use osabridge::core::MCPServer;
use osabridge::{utils, Bridge, Settings, ToolRegistry};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(Path::new(path)),
        None => Settings::new(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            utils::print_error(&format!("Configuration error: {:#}", e));
            std::process::exit(2);
        }
    };

    // stdout carries the MCP protocol, so logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let bridge = Bridge::new(&settings);
    let registry = Arc::new(ToolRegistry::for_bridge(&bridge));

    match cli.command {
        Commands::Serve => MCPServer::new(registry).serve_stdio().await,
        Commands::Tools { json } => handle_tools(&registry, json),
        Commands::Call { tool, args } => handle_call(&registry, &tool, &args).await,
    }
}

fn handle_tools(registry: &ToolRegistry, json: bool) -> Result<()> {
    if json {
        let tools: Vec<_> = registry
            .list_tools()
            .into_iter()
            .map(osabridge::core::mcp::MCPTool::from)
            .collect();
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    utils::print_header("Available tools");
    for metadata in registry.list_tools() {
        utils::print_tool(&metadata);
    }
    Ok(())
}

async fn handle_call(registry: &ToolRegistry, tool: &str, args: &str) -> Result<()> {
    let args: serde_json::Value =
        serde_json::from_str(args).context("Arguments must be a JSON object")?;
    if !args.is_object() {
        anyhow::bail!("Arguments must be a JSON object, got {}", args);
    }

    let result = registry.call(tool, args).await;
    utils::print_result(&result);
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
