//! toolgate - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use toolgate::{
    cli::{Args, Commands, Config},
    observability::init_tracing,
    ServerConfig, StdioServer, ToolRuntime,
};

/// Resolve config file, CLI overrides and environment into a runtime
fn build_runtime(args: &Args) -> Result<ToolRuntime> {
    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    config.apply_overrides(args.root.as_deref(), args.tools.as_deref());

    let server = ServerConfig::from_config(&config).context("Invalid configuration")?;
    ToolRuntime::new(server).context("Failed to build tool runtime")
}

async fn serve(runtime: ToolRuntime) -> Result<()> {
    StdioServer::new(runtime)
        .serve_stdio()
        .await
        .context("Host channel failed")
}

fn print_catalog(runtime: &ToolRuntime) -> Result<()> {
    let catalog = serde_json::to_string_pretty(&runtime.catalog())?;
    println!("{}", catalog);
    Ok(())
}

async fn call_tool(runtime: &ToolRuntime, tool: &str, arguments: &str) -> Result<()> {
    let arguments: Value =
        serde_json::from_str(arguments).context("Arguments must be valid JSON")?;

    let envelope = runtime.execute(tool, arguments).await;
    println!("{}", serde_json::to_string_pretty(&envelope.to_value())?);

    if envelope.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbosity(), args.log_format());

    let runtime = build_runtime(&args)?;

    match args.command() {
        Commands::Serve => serve(runtime).await?,
        Commands::Tools => print_catalog(&runtime)?,
        Commands::Call { tool, arguments } => call_tool(&runtime, &tool, &arguments).await?,
    }

    Ok(())
}
