use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use weftcore::{ExecutionEvent, NodeEvent, NodeSpec, NodeStatus, RunPhase, RunStatus, WorkflowDefinition};
use weftnodes::Services;
use weftruntime::{ComponentRegistry, RuntimeConfig, Scheduler, WeftRuntime};

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Weft workflow engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Runtime configuration JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum number of nodes running at once
        #[arg(long)]
        max_parallel: Option<usize>,

        /// Per-node timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available component types
    Components,

    /// Create a new example workflow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            config,
            max_parallel,
            timeout_ms,
            verbose,
        } => {
            let level = if verbose { "debug" } else { "info" };
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
                .init();

            let mut runtime_config = load_config(config.as_deref())?;
            if let Some(max_parallel) = max_parallel {
                runtime_config.max_parallel_nodes = max_parallel;
            }
            if timeout_ms.is_some() {
                runtime_config.node_timeout_ms = timeout_ms;
            }

            let status = run_workflow(&file, runtime_config).await?;
            if status == RunStatus::Failed {
                std::process::exit(1);
            }
        }

        Commands::Validate { file } => {
            if !validate_workflow(&file)? {
                std::process::exit(1);
            }
        }

        Commands::Components => {
            list_components()?;
        }

        Commands::Init { output } => {
            create_example_workflow(&output)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Ok(serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?)
        }
        None => Ok(RuntimeConfig::default()),
    }
}

fn load_workflow(file: &Path) -> Result<WorkflowDefinition> {
    let workflow_json = std::fs::read_to_string(file)
        .with_context(|| format!("reading workflow {}", file.display()))?;
    Ok(serde_json::from_str(&workflow_json)?)
}

fn build_runtime(config: RuntimeConfig) -> Result<WeftRuntime> {
    let services = Services::in_memory();
    let mut registry = ComponentRegistry::new();
    weftnodes::register_all(&mut registry, &services)?;

    Ok(WeftRuntime::with_registry(Arc::new(registry), config).with_store(services.records.clone()))
}

async fn run_workflow(file: &Path, config: RuntimeConfig) -> Result<RunStatus> {
    println!("🚀 Loading workflow from: {}", file.display());

    let workflow = load_workflow(file)?;
    println!("📋 Workflow: {}", workflow.name);
    println!("   Nodes: {}", workflow.nodes.len());
    println!("   Edges: {}", workflow.edges().len());
    println!();

    let runtime = build_runtime(config)?;
    let mut events = runtime.subscribe_events();

    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::RunStarted { run_id, .. } => {
                    println!("▶️  Run {} started", run_id);
                }
                ExecutionEvent::NodeStarted {
                    node_id,
                    component_type,
                    ..
                } => {
                    println!("  ⚡ Starting node: {} ({})", node_id, component_type);
                }
                ExecutionEvent::NodeSucceeded {
                    node_id, duration_ms, ..
                } => {
                    println!("  ✅ Node {} succeeded in {}ms", node_id, duration_ms);
                }
                ExecutionEvent::NodeFailed { node_id, error, .. } => {
                    println!("  ❌ Node {} failed: {}", node_id, error);
                }
                ExecutionEvent::NodeSkipped {
                    node_id, upstream, ..
                } => {
                    println!("  ⏭️  Node {} skipped ({} failed)", node_id, upstream);
                }
                ExecutionEvent::NodeCancelled { node_id, .. } => {
                    println!("  🛑 Node {} cancelled", node_id);
                }
                ExecutionEvent::NodeEvent { node_id, event, .. } => match event {
                    NodeEvent::Info { message } => println!("     ℹ️  [{}] {}", node_id, message),
                    NodeEvent::Warning { message } => println!("     ⚠️  [{}] {}", node_id, message),
                    NodeEvent::Progress { percent, message } => match message {
                        Some(msg) => println!("     📊 [{}] {}% - {}", node_id, percent, msg),
                        None => println!("     📊 [{}] {}%", node_id, percent),
                    },
                    NodeEvent::Data { .. } => {}
                },
                ExecutionEvent::RunPhaseChanged {
                    phase: RunPhase::Failed,
                    ..
                } => {
                    println!("💥 Run aborted");
                }
                ExecutionEvent::RunPhaseChanged { .. } => {}
                ExecutionEvent::RunCompleted {
                    status, duration_ms, ..
                } => {
                    println!("✨ Run finished with status {} in {}ms", status, duration_ms);
                }
            }
        }
    });

    let result = runtime.execute(&workflow).await;

    // Let the listener drain before tearing it down
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    let result = result?;

    println!();
    println!("📊 Run Summary:");
    println!("   Run ID: {}", result.run_id);
    println!("   Status: {}", result.status);
    println!(
        "   Succeeded: {}/{} nodes",
        result.count(NodeStatus::Succeeded),
        result.nodes.len()
    );

    println!();
    println!("📤 Nodes:");
    for (node_id, report) in &result.nodes {
        println!("   {} [{}]", node_id, report.status);
        if let Some(outputs) = &report.outputs {
            let mut names: Vec<_> = outputs.keys().collect();
            names.sort();
            for name in names {
                println!("     {}: {}", name, outputs[name].to_plain_json());
            }
        }
        if let Some(error) = &report.error {
            println!("     error ({}): {}", error.kind, error.message);
        }
        if let Some(upstream) = &report.skipped_because {
            println!("     skipped because '{}' failed", upstream);
        }
    }

    Ok(result.status)
}

fn validate_workflow(file: &Path) -> Result<bool> {
    println!("🔍 Validating workflow: {}", file.display());

    let workflow = load_workflow(file)?;
    let runtime = build_runtime(RuntimeConfig::default())?;

    match runtime.validate(&workflow) {
        Ok(plan) => {
            let scheduler = Scheduler::new(&plan);
            println!("✅ Workflow is valid:");
            println!("   Name: {}", workflow.name);
            println!("   Nodes: {}", workflow.nodes.len());
            println!("   Edges: {}", workflow.edges().len());
            println!("   Order: {}", scheduler.topological_order().join(" → "));
            for (wave, batch) in scheduler.batches().iter().enumerate() {
                println!("   Batch {}: {}", wave + 1, batch.join(", "));
            }
            Ok(true)
        }
        Err(validation) => {
            println!("❌ Workflow is invalid ({} problem(s)):", validation.violations.len());
            for violation in &validation.violations {
                println!("   • {}", violation);
            }
            Ok(false)
        }
    }
}

fn list_components() -> Result<()> {
    println!("📦 Available Component Types:");
    println!();

    let runtime = build_runtime(RuntimeConfig::default())?;
    for descriptor in runtime.registry().descriptors() {
        println!("  • {} ({})", descriptor.type_name, descriptor.category);
        println!("    {}", descriptor.description);
        for (name, port) in &descriptor.inputs {
            let required = if port.required { "required" } else { "optional" };
            println!("      in  {}: {} ({})", name, port.value_type, required);
        }
        for (name, port) in &descriptor.outputs {
            println!("      out {}: {}", name, port.value_type);
        }
    }
    Ok(())
}

fn create_example_workflow(output: &Path) -> Result<()> {
    let mut workflow = WorkflowDefinition::new("Example Document Q&A");
    workflow.description = Some("Ingests a document and answers a question about it".to_string());

    workflow.add_node(
        NodeSpec::new("load", "document.load")
            .with_name("Load Document")
            .with_literal("text", "Weft runs workflows as graphs of components. Each node runs once its inputs are ready.")
            .with_position(100.0, 100.0),
    );
    workflow.add_node(
        NodeSpec::new("chunk", "text.chunk")
            .with_input("text", "load", "text")
            .with_config("chunk_size", 200.0)
            .with_config("chunk_overlap", 20.0)
            .with_position(300.0, 50.0),
    );
    workflow.add_node(
        NodeSpec::new("embed", "text.embed")
            .with_input("chunks", "chunk", "chunks")
            .with_position(500.0, 50.0),
    );
    workflow.add_node(
        NodeSpec::new("store", "vector.store")
            .with_input("chunks", "embed", "chunks")
            .with_input("embeddings", "embed", "embeddings")
            .with_input("document_id", "load", "document_id")
            .with_position(700.0, 50.0),
    );
    workflow.add_node(
        NodeSpec::new("answer", "chat.complete")
            .with_literal("prompt", "When does a node run?")
            .with_input("context", "load", "text")
            .with_config("system_prompt", "Answer from the context only.")
            .with_position(300.0, 200.0),
    );
    workflow.add_node(
        NodeSpec::new("report", "output.format")
            .with_input("value", "answer", "response")
            .with_config("template", "Answer: {{value}}")
            .with_position(500.0, 200.0),
    );

    let json = serde_json::to_string_pretty(&workflow)?;
    std::fs::write(output, json)?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!("  weft run --file {}", output.display());

    Ok(())
}
