//! CLI definitions for flowkit.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use flowkit_core::OrchestrationMode;
use flowkit_runloop::DEFAULT_ERROR_HANDLER;

/// flowkit CLI.
#[derive(Parser)]
#[command(name = "flowkit")]
#[command(about = "Event-driven agent runner")]
#[command(version)]
pub(crate) struct Cli {
    /// Directory for daily-rotated log files
    #[arg(long, env = "FLOWKIT_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Emit demo events through a runner and print the session trace
    Run(RunArgs),

    /// Print a trace file written by a previous run
    Trace {
        /// Directory holding `<session>.trace.json` files
        #[arg(long)]
        trace_dir: PathBuf,

        /// Session to print
        #[arg(long)]
        session: String,
    },
}

#[derive(clap::Args)]
pub(crate) struct RunArgs {
    /// Orchestration mode (route, sequential, collaborative, loop, mixed)
    #[arg(long, default_value = "route")]
    pub mode: OrchestrationMode,

    /// Demo agents to use (echo, upper, counter)
    #[arg(long, value_delimiter = ',', default_value = "echo")]
    pub agents: Vec<String>,

    /// Chain run after the parallel group in mixed mode
    #[arg(long, value_delimiter = ',')]
    pub then: Vec<String>,

    /// Number of events to emit
    #[arg(long, default_value_t = 3)]
    pub events: usize,

    /// Event queue capacity
    #[arg(long, default_value_t = 100)]
    pub queue_size: usize,

    /// Write trace files here instead of keeping them in memory
    #[arg(long)]
    pub trace_dir: Option<PathBuf>,

    /// Session id shared by the emitted events
    #[arg(long, default_value = "demo")]
    pub session: String,

    /// Upper bound on loop iterations
    #[arg(long, default_value_t = 5)]
    pub max_iterations: usize,

    /// Agent that receives failure events (`error-handler` if no name given)
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_ERROR_HANDLER)]
    pub error_handler: Option<String>,

    /// Re-dispatches allowed for transient failures
    #[arg(long, default_value_t = 0)]
    pub max_retries: u32,
}
