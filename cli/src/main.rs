//! CLI entrypoint for planwright
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use planwright_application::{
    ChannelKey, ResumeToken, WorkflowConfig, WorkflowController, WorkflowOutcome,
};
use planwright_infrastructure::{
    CommandLlmGateway, ConfigLoader, FileConfig, GatewayDiffApplier, JsonStateStore,
    LocalFileContext, RuntimeBridgePublisher,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "planwright", version, about = "Plan-first coding agent with a human approval gate")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a config file (overrides discovered configs)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip config discovery and use built-in defaults
    #[arg(long, global = true)]
    no_config: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Print progress events as JSON lines instead of text
    #[arg(long, global = true)]
    json_events: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new run: plan the request and suspend for review
    Run {
        /// What to build or change
        request: String,

        /// Directory the plan's file paths are relative to
        #[arg(long, default_value = ".")]
        working_dir: String,

        /// User the run belongs to (defaults to $USER)
        #[arg(long)]
        user: Option<String>,

        /// Run identifier (defaults to a timestamp)
        #[arg(long)]
        run_id: Option<String>,
    },
    /// Resume a suspended run with a review reply
    Resume {
        /// Token printed when the run suspended
        token: String,

        /// Your reply to the plan review
        reply: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // The appender guard must outlive main or buffered logs are lost
    let _log_guard = match &cli.log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or(std::path::Path::new("."));
            let name = path.file_name().context("log file has no name")?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
            None
        }
    };

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };

    match cli.command {
        Commands::Run {
            request,
            working_dir,
            user,
            run_id,
        } => {
            let user = user
                .or_else(|| std::env::var("USER").ok())
                .unwrap_or_else(|| "local".to_string());
            let run_id = run_id.unwrap_or_else(default_run_id);
            let key = ChannelKey::new(user, run_id);

            let workflow_config = config.workflow.clone().with_working_dir(working_dir);
            let (controller, publisher) = build_controller(&config, workflow_config)?;

            info!(channel = %key.channel_name(), "starting run");
            let events = publisher.register(&key);
            let printer = spawn_event_printer(events, cli.json_events);

            let outcome = controller.start(&key, &request).await?;
            publisher.unregister(&key);
            let _ = printer.await;

            report(outcome)
        }
        Commands::Resume { token, reply } => {
            let token = ResumeToken::decode(&token)?;
            let key = token.channel_key();

            let (controller, publisher) = build_controller(&config, config.workflow.clone())?;

            let events = publisher.register(&key);
            let printer = spawn_event_printer(events, cli.json_events);

            let outcome = controller.resume(&token, &reply).await?;
            publisher.unregister(&key);
            let _ = printer.await;

            report(outcome)
        }
    }
}

fn build_controller(
    config: &FileConfig,
    workflow_config: WorkflowConfig,
) -> Result<(WorkflowController, Arc<RuntimeBridgePublisher>)> {
    // === Dependency Injection ===
    let gateway = Arc::new(CommandLlmGateway::new(
        config.gateway.program.clone(),
        config.gateway.args.clone(),
        config.gateway.model.clone(),
    ));
    let applier = Arc::new(GatewayDiffApplier::new(gateway.clone()));
    let files = Arc::new(LocalFileContext::new());
    let store = Arc::new(JsonStateStore::new(config.storage.resolved_state_dir()));
    let publisher = Arc::new(RuntimeBridgePublisher::new(config.events.capacity));

    let cancellation = CancellationToken::new();
    {
        let cancellation = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupt received, stopping at the next safe point...");
                cancellation.cancel();
            }
        });
    }

    let controller = WorkflowController::new(
        gateway,
        applier,
        files,
        store,
        publisher.clone(),
        workflow_config,
    )
    .with_cancellation(cancellation);

    Ok((controller, publisher))
}

/// Drain the run's event stream to stdout while the controller works.
fn spawn_event_printer(
    mut receiver: tokio::sync::mpsc::Receiver<planwright_application::AgentEvent>,
    json: bool,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            if json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(_) => continue,
                }
            } else {
                println!("[{}] {}", event.stage_name, event.text);
            }
        }
    })
}

fn report(outcome: WorkflowOutcome) -> Result<()> {
    match outcome {
        WorkflowOutcome::Suspended(suspension) => {
            println!();
            println!("{}", suspension.prompt);
            println!();
            println!("Run suspended for review. Resume with:");
            println!("  planwright resume {} \"<your reply>\"", suspension.token);
            Ok(())
        }
        WorkflowOutcome::Completed { state } => {
            println!();
            if state.failed_atomics.is_empty() {
                println!("Run complete: every planned edit applied.");
            } else {
                println!(
                    "Run complete with {} failed edit(s):",
                    state.failed_atomics.len()
                );
                for failure in &state.failed_atomics {
                    println!(
                        "  - {} (task {}, edit {}): {}",
                        failure.file_path,
                        failure.task_index + 1,
                        failure.atomic_index + 1,
                        failure.reason
                    );
                }
            }
            Ok(())
        }
        WorkflowOutcome::Failed { error, .. } => {
            bail!("run failed: {error}")
        }
    }
}

fn default_run_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("run-{millis}")
}
