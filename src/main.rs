//! flowkit - event-driven agent runner.
//!
//! `flowkit run` wires the demo agents into a runner, emits events for one
//! session and prints the resulting trace. `flowkit trace` prints a trace
//! file from an earlier run.

mod cli;
mod demo;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use flowkit_core::{build_orchestrator, CallbackRegistry, OrchestrationMode, OrchestratorConfig};
use flowkit_protocols::{CancellationToken, Event, TraceLogger};
use flowkit_runloop::{RetryConfig, Runner, RunnerConfig};
use flowkit_runtime::{FileTraceLogger, InMemoryTraceLogger, MemorySessionStore};

use crate::cli::{Cli, Commands, RunArgs};

/// Console logging on stderr, plus a daily-rotated file when `log_dir` is
/// set. The returned guard flushes the file writer on drop.
fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("flowkit")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Trace { trace_dir, session } => print_trace(&trace_dir, &session).await,
    }
}

fn orchestrator_config(args: &RunArgs) -> OrchestratorConfig {
    let config = OrchestratorConfig::new(args.mode).with_max_iterations(args.max_iterations);
    match args.mode {
        OrchestrationMode::Mixed => config
            .with_collaborative_agents(args.agents.clone())
            .with_sequential_agents(args.then.clone()),
        _ => config.with_agents(args.agents.clone()),
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let Some(target) = args.agents.first().cloned() else {
        bail!("--agents needs at least one agent");
    };

    let orchestrator = build_orchestrator(
        &orchestrator_config(&args),
        Arc::new(CallbackRegistry::new()),
    );
    let logger: Arc<dyn TraceLogger> = match &args.trace_dir {
        Some(dir) => Arc::new(FileTraceLogger::new(dir)),
        None => Arc::new(InMemoryTraceLogger::new()),
    };

    let mut config = RunnerConfig::default()
        .with_queue_size(args.queue_size)
        .with_retry(RetryConfig {
            max_retries: args.max_retries,
            ..RetryConfig::default()
        });
    if let Some(handler) = &args.error_handler {
        config = config.with_error_handler(handler.clone());
    }
    let runner = Runner::builder(orchestrator)
        .config(config)
        .trace_logger(logger)
        .session_store(Arc::new(MemorySessionStore::new()))
        .build()?;

    for name in demo::AGENTS {
        if let Some(handler) = demo::handler(name) {
            runner.register_agent(name, handler)?;
        }
    }
    for name in args.agents.iter().chain(&args.then) {
        if demo::handler(name).is_none() {
            warn!(agent = %name, known = ?demo::AGENTS, "Not a demo agent; dispatch will fail");
        }
    }

    let ctx = CancellationToken::new();
    {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling dispatch");
                ctx.cancel();
            }
        });
    }

    info!(mode = %args.mode, agents = ?args.agents, events = args.events, "Starting flowkit");
    runner.start(ctx)?;
    for i in 0..args.events {
        let event = Event::to(target.clone())
            .with_data(demo::TEXT, format!("event {i}"))
            .with_session(args.session.clone());
        runner.emit(event).await?;
    }
    runner.stop().await?;

    let snapshot = runner.metrics().snapshot();
    info!(
        processed = snapshot.processed,
        failures = snapshot.dispatch_failures,
        follow_ups = snapshot.follow_ups,
        "Run finished"
    );

    let trace = runner.dump_trace(&args.session).await?;
    println!("{}", serde_json::to_string_pretty(&trace)?);
    Ok(())
}

async fn print_trace(trace_dir: &Path, session: &str) -> anyhow::Result<()> {
    let logger = FileTraceLogger::new(trace_dir);
    let trace = logger
        .get_trace(session)
        .await
        .with_context(|| format!("reading trace for session {session}"))?;
    if trace.is_empty() {
        warn!(session = %session, dir = %trace_dir.display(), "No trace entries found");
    }
    println!("{}", serde_json::to_string_pretty(&trace)?);
    Ok(())
}
