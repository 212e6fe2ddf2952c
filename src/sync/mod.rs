//! Shared polling service
//!
//! One [`SyncHub`] owns every poll against the backend. Front-end pieces
//! subscribe to its [`SyncEvent`] stream instead of running timers of their
//! own. Each [`SyncHub::start`] opens a polling session; dropping or stopping
//! the returned [`PollingHandle`] cancels its tasks and invalidates any
//! response still in flight.

pub mod logs;
pub mod results;
pub mod status;

use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::client::Backend;
use crate::config::PollingConfig;
use crate::models::{ChatMessage, LogEntry, ResultEntry};
use crate::state::{ConsoleState, Generation, StatusChange, View};

pub use logs::{LogPoller, LogTick};
pub use results::ResultsFetcher;
pub use status::StatusPoller;

/// Change notifications published to subscribers
#[derive(Debug, Clone)]
pub enum SyncEvent {
    StatusChanged(StatusChange),
    ResultsReplaced(Vec<ResultEntry>),
    LogsReplaced { count: u64, entries: Vec<LogEntry> },
    ViewChanged(View),
    ChatAppended(ChatMessage),
}

#[derive(Clone)]
pub struct SyncHub {
    backend: Arc<dyn Backend>,
    state: ConsoleState,
    events: broadcast::Sender<SyncEvent>,
    polling: PollingConfig,
}

impl SyncHub {
    pub fn new(backend: Arc<dyn Backend>, state: ConsoleState, polling: PollingConfig) -> Self {
        let (events, _) = broadcast::channel(polling.event_buffer.max(1));
        Self {
            backend,
            state,
            events,
            polling,
        }
    }

    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    /// Subscribers that fall behind receive `Lagged` and skip ahead
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Returns the number of subscribers reached
    pub fn publish(&self, event: SyncEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    pub fn status_poller(&self) -> StatusPoller {
        StatusPoller::new(self.backend.clone(), self.state.clone(), self.events.clone())
    }

    pub fn log_poller(&self) -> LogPoller {
        LogPoller::new(self.backend.clone(), self.state.clone(), self.events.clone())
    }

    pub fn results(&self) -> ResultsFetcher {
        ResultsFetcher::new(self.backend.clone(), self.state.clone(), self.events.clone())
    }

    /// Spawn the status and log pollers for a new session
    pub fn start(&self) -> PollingHandle {
        let generation = self.state.begin_session();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();

        tasks.spawn(self.status_poller().run(
            self.polling.status_interval(),
            generation,
            shutdown_rx.clone(),
        ));
        tasks.spawn(
            self.log_poller()
                .run(self.polling.log_interval(), generation, shutdown_rx),
        );

        info!(
            "🔄 Polling started (status every {}s, logs every {}s)",
            self.polling.status_interval_secs, self.polling.log_interval_secs
        );

        PollingHandle {
            state: self.state.clone(),
            generation,
            shutdown,
            tasks,
        }
    }

    /// One read of the results listing for the view showing now
    pub async fn refresh_results(&self) -> bool {
        match self.results().refresh().await {
            Ok(applied) => applied,
            Err(e) => {
                warn!("Failed to fetch results: {}", e);
                false
            }
        }
    }
}

/// Owns one polling session's tasks
pub struct PollingHandle {
    state: ConsoleState,
    generation: Generation,
    shutdown: watch::Sender<bool>,
    tasks: JoinSet<()>,
}

impl PollingHandle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Signal the pollers and wait for them to finish
    pub async fn stop(mut self) {
        self.state.end_session(self.generation);
        let _ = self.shutdown.send(true);
        while self.tasks.join_next().await.is_some() {}
        info!("⏹️  Polling stopped");
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.state.end_session(self.generation);
        self.tasks.abort_all();
    }
}
