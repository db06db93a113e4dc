//! Otto CLI - a ReAct agent for local LLMs with MCP tool support.

use anyhow::Result;
use clap::Parser;
use otto_config::{CliOverrides, OttoConfig};
use otto_core::ReactAgent;
use otto_llm::HttpCompletionModel;
use otto_mcp::McpManager;
use otto_tools::ToolRegistry;
use otto_types::{RunOutcome, StepKind};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "otto", version, about = "A ReAct agent for local LLMs")]
struct Cli {
    /// The task to run
    task: Option<String>,

    /// Model to use
    #[arg(long)]
    model: Option<String>,

    /// Completion endpoint base URL (OpenAI-compatible)
    #[arg(long)]
    base_url: Option<String>,

    /// API key (overrides OTTO_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Maximum reasoning steps per run
    #[arg(long)]
    max_steps: Option<usize>,

    /// Config directory (overrides OTTO_CONFIG_DIR, default ~/.otto)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// List every available tool and its parameter schema, then exit
    #[arg(long)]
    list_tools: bool,

    /// List connected MCP providers and their tool counts, then exit
    #[arg(long)]
    list_providers: bool,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = OttoConfig::load(CliOverrides {
        base_url: cli.base_url,
        api_key: cli.api_key,
        model: cli.model,
        max_steps: cli.max_steps,
        config_dir: cli.config_dir,
    })
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    let manager = McpManager::start(config.mcp.clone()).await;

    let mut registry = ToolRegistry::with_builtins();
    registry.extend(manager.tools().await);

    if cli.list_tools {
        list_tools(&registry).await;
        manager.shutdown().await;
        return Ok(());
    }

    if cli.list_providers {
        list_providers(&manager).await;
        manager.shutdown().await;
        return Ok(());
    }

    let Some(task) = cli.task else {
        manager.shutdown().await;
        anyhow::bail!("no task given (try `otto \"2 + 2\"` or `otto --list-tools`)");
    };

    let mut model = HttpCompletionModel::new(&config.base_url, &config.model)
        .map_err(|e| anyhow::anyhow!("{e}"))?
        .with_temperature(f64::from(config.temperature))
        .with_max_tokens(config.max_tokens);
    if let Some(api_key) = &config.api_key {
        model = model.with_api_key(api_key);
    }

    eprintln!(
        "otto v{} (model: {}, {} tools)",
        env!("CARGO_PKG_VERSION"),
        config.model,
        registry.len()
    );

    let agent = ReactAgent::new(Arc::new(model), registry).with_max_steps(config.max_steps);
    let run = agent.execute(&task).await;

    for step in &run.steps {
        match step.kind {
            StepKind::Thought => println!("Thought: {}", step.content),
            StepKind::Action => println!("Action: {}", step.content),
            StepKind::Observation => println!("Observation: {}", step.content),
        }
    }

    let failed = match &run.outcome {
        RunOutcome::Success { final_answer } => {
            println!("\n{final_answer}");
            false
        }
        RunOutcome::Failure { error } => {
            eprintln!("\nError: {error}");
            true
        }
    };
    eprintln!("({} of {} steps used)", run.steps_used, agent.max_steps());

    manager.shutdown().await;
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Print every registered tool with its parameter schema.
async fn list_tools(registry: &ToolRegistry) {
    if registry.is_empty() {
        println!("No tools available.");
        return;
    }
    for tool in registry.all() {
        println!("{}: {}", tool.name(), tool.description());
        let schema = tool.parameter_schema().await;
        let pretty = serde_json::to_string_pretty(&schema).unwrap_or_default();
        for line in pretty.lines() {
            println!("    {line}");
        }
    }
}

/// Print connected MCP providers and how many tools each contributed.
async fn list_providers(manager: &McpManager) {
    let summary = manager.provider_summary().await;
    if summary.is_empty() {
        println!("No MCP providers connected.");
        return;
    }
    for (name, count) in summary {
        println!("{name}: {count} tool(s)");
    }
}
