//! Buildpilot CLI
//!
//! Thin terminal front-end over the orchestration core: parse flags,
//! load .env keys, wire the backend and workspace, run one request
//! through the graph, and print a summary of the final state.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use buildpilot_core::graph::{Orchestrator, RunEvent, RunEventKind, DEFAULT_STEP_CEILING};
use buildpilot_core::models::{LlmProvider, ModelConfig};
use buildpilot_core::state::RunState;
use buildpilot_core::tools::Workspace;

/// LLM-driven code generation: plan, decompose, implement.
#[derive(Parser, Debug)]
#[command(name = "buildpilot", version, about)]
struct Args {
    /// The build request, e.g. "Build a calculator web app"
    request: String,

    /// Directory the generated project is written into
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// LLM provider: anthropic or openai
    #[arg(long, default_value = "anthropic")]
    provider: String,

    /// Model name (provider default when omitted)
    #[arg(long)]
    model: Option<String>,

    /// Base URL override (OpenAI-compatible endpoints)
    #[arg(long)]
    base_url: Option<String>,

    /// Upper bound on total graph transitions for the run
    #[arg(long, default_value_t = DEFAULT_STEP_CEILING)]
    ceiling: usize,
}

fn model_config(args: &Args) -> Result<ModelConfig> {
    let provider = match args.provider.as_str() {
        "anthropic" => LlmProvider::Anthropic,
        "openai" => LlmProvider::OpenAi,
        other => return Err(anyhow!("unknown provider '{other}'")),
    };
    let mut config = match &args.model {
        Some(model) => ModelConfig::with_provider(provider, model),
        None => ModelConfig {
            provider,
            ..ModelConfig::default()
        },
    };
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url);
    }
    Ok(config)
}

fn print_summary(state: &RunState) {
    if let Some(plan) = &state.plan {
        println!("Plan: {}", plan.description);
        for file in &plan.files {
            println!("  {} - {}", file.path, file.purpose);
        }
    }
    if let Some(coder) = &state.coder {
        println!(
            "Steps completed: {}/{}",
            coder.current_step_idx,
            coder.task_plan.implementation_steps.len()
        );
    }
    match &state.status {
        Some(status) => println!("Status: {status:?}"),
        None => println!("Status: incomplete"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("buildpilot=info,buildpilot_core=info")),
        )
        .init();

    let args = Args::parse();
    let config = model_config(&args)?;
    let backend = config
        .create_backend()
        .context("failed to construct generation backend")?;
    let workspace = Arc::new(Workspace::new(&args.root));

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<RunEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if event.kind == RunEventKind::StepAdvanced {
                if let Some(data) = &event.data {
                    println!("  step {} done", data["cursor"]);
                }
            }
        }
    });

    tracing::info!(
        provider = config.provider.display_name(),
        model = %config.model,
        root = %args.root.display(),
        "starting run"
    );

    let result = Orchestrator::new(backend, workspace)
        .with_step_ceiling(args.ceiling)
        .with_events(event_tx)
        .run(args.request.clone())
        .await;

    let _ = printer.await;

    match result {
        Ok(state) => {
            print_summary(&state);
            Ok(())
        }
        Err(err) => {
            eprintln!("run failed at {}: {}", err.last_node, err.source);
            print_summary(&err.state);
            Err(err.into())
        }
    }
}
