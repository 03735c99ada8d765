//! Runner: bounded event queue in front of one dispatch task.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use flowkit_core::{CallbackRegistry, Orchestrator};
use flowkit_protocols::{
    AgentHandler, Callback, Event, HookPoint, RunnerError, SessionStore, TraceEntry, TraceLogger,
};
use flowkit_runtime::{register_trace_callbacks, FileTraceLogger, NoOpTraceLogger};

use crate::config::RunnerConfig;
use crate::dispatch::Dispatcher;
use crate::failure::ErrorRouting;
use crate::metrics::RunnerMetrics;
use crate::state::{RunnerState, StateCell};

/// Builder for [`Runner`].
pub struct RunnerBuilder {
    orchestrator: Arc<dyn Orchestrator>,
    config: RunnerConfig,
    trace_logger: Option<Arc<dyn TraceLogger>>,
    session_store: Option<Arc<dyn SessionStore>>,
}

impl RunnerBuilder {
    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Trace logger to use instead of one derived from `trace_dir`.
    pub fn trace_logger(mut self, logger: Arc<dyn TraceLogger>) -> Self {
        self.trace_logger = Some(logger);
        self
    }

    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Build the runner and attach trace callbacks to the orchestrator's
    /// registry when a trace logger is configured.
    pub fn build(self) -> Result<Runner, RunnerError> {
        let trace_logger = self.trace_logger.or_else(|| {
            self.config
                .trace_dir
                .as_ref()
                .map(|dir| Arc::new(FileTraceLogger::new(dir)) as Arc<dyn TraceLogger>)
        });

        let callbacks = self.orchestrator.callback_registry();
        if let Some(logger) = &trace_logger {
            register_trace_callbacks(&callbacks, logger.clone())?;
        }

        let (sender, receiver) = mpsc::channel(self.config.capacity());
        let id = Uuid::new_v4().to_string();
        debug!(runner = %id, mode = %self.orchestrator.mode(), "Runner created");

        Ok(Runner {
            id,
            config: self.config,
            orchestrator: self.orchestrator,
            callbacks,
            trace_logger,
            session_store: self.session_store,
            state: StateCell::new(),
            metrics: Arc::new(RunnerMetrics::new()),
            sender: RwLock::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            task: Mutex::new(None),
            stop_lock: tokio::sync::Mutex::new(()),
        })
    }
}

/// Owns the event queue and the dispatch task.
///
/// Events are handled one at a time in the order they were accepted.
/// `emit` applies backpressure: it waits up to `emit_timeout` for a free
/// slot and fails with [`RunnerError::QueueSaturated`] otherwise.
pub struct Runner {
    id: String,
    config: RunnerConfig,
    orchestrator: Arc<dyn Orchestrator>,
    callbacks: Arc<CallbackRegistry>,
    trace_logger: Option<Arc<dyn TraceLogger>>,
    session_store: Option<Arc<dyn SessionStore>>,
    state: StateCell,
    metrics: Arc<RunnerMetrics>,
    sender: RwLock<Option<mpsc::Sender<Event>>>,
    receiver: Mutex<Option<mpsc::Receiver<Event>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    stop_lock: tokio::sync::Mutex<()>,
}

impl Runner {
    pub fn builder(orchestrator: Arc<dyn Orchestrator>) -> RunnerBuilder {
        RunnerBuilder {
            orchestrator,
            config: RunnerConfig::default(),
            trace_logger: None,
            session_store: None,
        }
    }

    /// Runner with default configuration and no collaborators.
    pub fn new(orchestrator: Arc<dyn Orchestrator>) -> Result<Self, RunnerError> {
        Self::builder(orchestrator).build()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn state(&self) -> RunnerState {
        self.state.get()
    }

    pub fn metrics(&self) -> Arc<RunnerMetrics> {
        self.metrics.clone()
    }

    pub fn orchestrator(&self) -> Arc<dyn Orchestrator> {
        self.orchestrator.clone()
    }

    pub fn callback_registry(&self) -> Arc<CallbackRegistry> {
        self.callbacks.clone()
    }

    /// The configured trace logger, or a no-op one.
    pub fn trace_logger(&self) -> Arc<dyn TraceLogger> {
        match &self.trace_logger {
            Some(logger) => logger.clone(),
            None => Arc::new(NoOpTraceLogger),
        }
    }

    /// Spawn the dispatch task. Cancelling `ctx` ends the loop without
    /// draining the queue and is passed on to every dispatch.
    pub fn start(&self, ctx: CancellationToken) -> Result<(), RunnerError> {
        let mut task = self.task.lock();
        self.state
            .transition(RunnerState::Created, RunnerState::Started)
            .map_err(|_| RunnerError::AlreadyStarted)?;

        let rx = self.receiver.lock().take().ok_or(RunnerError::AlreadyStarted)?;
        let queue = self
            .sender
            .read()
            .as_ref()
            .map(mpsc::Sender::downgrade)
            .ok_or(RunnerError::Stopped)?;

        let dispatcher = Dispatcher {
            orchestrator: self.orchestrator.clone(),
            callbacks: self.callbacks.clone(),
            session_store: self.session_store.clone(),
            routing: ErrorRouting::from_config(&self.config),
            retry: self.config.retry.clone(),
            queue,
            metrics: self.metrics.clone(),
        };

        let span = tracing::info_span!("runner", id = %self.id);
        *task = Some(tokio::spawn(dispatcher.run(ctx, rx).instrument(span)));
        self.metrics.mark_start();

        info!(
            runner = %self.id,
            mode = %self.orchestrator.mode(),
            queue_size = self.config.capacity(),
            "Runner started"
        );
        Ok(())
    }

    /// Enqueue an event for dispatch.
    pub async fn emit(&self, event: Event) -> Result<(), RunnerError> {
        let sender = match self.state.get() {
            RunnerState::Created => Err(RunnerError::NotRunning),
            RunnerState::Started => self.sender.read().clone().ok_or(RunnerError::Stopped),
            RunnerState::Stopping | RunnerState::Stopped => Err(RunnerError::Stopped),
        };
        let sender = match sender {
            Ok(sender) => sender,
            Err(e) => {
                self.metrics.record_rejected();
                return Err(e);
            }
        };

        let timeout = self.config.emit_timeout();
        match sender.send_timeout(event, timeout).await {
            Ok(()) => {
                self.metrics.record_emitted();
                Ok(())
            }
            Err(SendTimeoutError::Timeout(event)) => {
                self.metrics.record_rejected();
                warn!(
                    runner = %self.id,
                    event_id = %event.id(),
                    capacity = self.config.capacity(),
                    "Event queue saturated"
                );
                Err(RunnerError::QueueSaturated {
                    capacity: self.config.capacity(),
                    waited_ms: timeout.as_millis() as u64,
                })
            }
            Err(SendTimeoutError::Closed(_)) => {
                self.metrics.record_rejected();
                Err(RunnerError::Stopped)
            }
        }
    }

    pub fn register_agent(
        &self,
        name: &str,
        handler: Arc<dyn AgentHandler>,
    ) -> Result<(), RunnerError> {
        self.orchestrator.register_agent(name, handler)?;
        Ok(())
    }

    pub fn register_callback(
        &self,
        hook: HookPoint,
        name: &str,
        callback: Arc<dyn Callback>,
    ) -> Result<(), RunnerError> {
        self.callbacks.register(hook, name, callback)?;
        Ok(())
    }

    pub fn unregister_callback(&self, hook: HookPoint, name: &str) {
        self.callbacks.unregister(hook, name);
    }

    /// Close the queue, wait for the dispatch task to drain it, close the
    /// trace logger and stop the orchestrator.
    ///
    /// Safe to call more than once and from several tasks; later calls wait
    /// for the first to finish and then return `Ok`.
    pub async fn stop(&self) -> Result<(), RunnerError> {
        let _guard = self.stop_lock.lock().await;
        let handle = {
            let mut task = self.task.lock();
            if self.state.get() == RunnerState::Stopped {
                return Ok(());
            }
            self.state.set(RunnerState::Stopping);
            task.take()
        };
        info!(runner = %self.id, "Stopping runner");

        // Outstanding emits hold their own clones; the queue closes once
        // they return.
        self.sender.write().take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(runner = %self.id, error = %e, "Dispatch task failed");
            }
        }

        let closed = match &self.trace_logger {
            Some(logger) => logger.close().await.map_err(RunnerError::from),
            None => Ok(()),
        };
        if let Err(e) = &closed {
            warn!(runner = %self.id, error = %e, "Failed to close trace logger");
        }

        self.orchestrator.stop().await;
        self.state.set(RunnerState::Stopped);

        let snapshot = self.metrics.snapshot();
        info!(
            runner = %self.id,
            processed = snapshot.processed,
            failures = snapshot.dispatch_failures,
            "Runner stopped"
        );
        closed
    }

    /// Trace entries recorded for a session, oldest first.
    pub async fn dump_trace(&self, session_id: &str) -> Result<Vec<TraceEntry>, RunnerError> {
        let logger = self
            .trace_logger
            .as_ref()
            .ok_or(RunnerError::TraceUnavailable)?;
        Ok(logger.get_trace(session_id).await?)
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("id", &self.id)
            .field("state", &self.state.get())
            .field("mode", &self.orchestrator.mode())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
