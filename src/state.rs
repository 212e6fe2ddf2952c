use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{ChatMessage, ChatTranscript, LogEntry, ResultEntry, SystemStatus};

/// Which screen the console is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Main,
    Realtime,
}

/// Scope a response was requested in. A response is only applied while
/// its scope is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    /// Lifetime of one polling session
    Session(u64),
    /// Lifetime of one visit to a view
    View(u64),
}

/// Point-in-time copy of everything the console displays
#[derive(Debug, Clone)]
pub struct ConsoleSnapshot {
    /// Screen currently shown
    pub view: View,
    /// Latest status line
    pub status: SystemStatus,
    /// Processed clips and logs, as listed on the last entry to the main view
    pub results: Vec<ResultEntry>,
    /// Event log entries from the last full fetch
    pub logs: Vec<LogEntry>,
    /// Log count the displayed entries were fetched at
    pub last_seen_log_count: u64,
    /// Chat history, starting with the greeting
    pub transcript: ChatTranscript,
    /// Whether a chat question is awaiting its answer
    pub chat_loading: bool,
    /// Phone number used for simulation alerts
    pub phone_number: String,
}

impl ConsoleSnapshot {
    fn new(phone_number: String) -> Self {
        Self {
            view: View::Main,
            status: SystemStatus::standby(),
            results: Vec::new(),
            logs: Vec::new(),
            last_seen_log_count: 0,
            transcript: ChatTranscript::default(),
            chat_loading: false,
            phone_number,
        }
    }
}

/// Result of applying a polled status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before the update
    pub previous: SystemStatus,
    /// Status now shown
    pub current: SystemStatus,
}

impl StatusChange {
    pub fn category_changed(&self) -> bool {
        self.previous.category() != self.current.category()
    }
}

/// Shared console state (cheap to clone, thread-safe)
#[derive(Debug, Clone)]
pub struct ConsoleState {
    inner: Arc<RwLock<ConsoleSnapshot>>,
    session: Arc<AtomicU64>,
    view_epoch: Arc<AtomicU64>,
}

impl ConsoleState {
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ConsoleSnapshot::new(phone_number.into()))),
            session: Arc::new(AtomicU64::new(0)),
            view_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn snapshot(&self) -> ConsoleSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn status(&self) -> SystemStatus {
        self.inner.read().await.status.clone()
    }

    pub async fn view(&self) -> View {
        self.inner.read().await.view
    }

    pub async fn last_seen_log_count(&self) -> u64 {
        self.inner.read().await.last_seen_log_count
    }

    pub async fn phone_number(&self) -> String {
        self.inner.read().await.phone_number.clone()
    }

    pub async fn set_phone_number(&self, phone_number: impl Into<String>) {
        self.inner.write().await.phone_number = phone_number.into();
    }

    /// Start a new polling session; earlier session tokens go stale
    pub fn begin_session(&self) -> Generation {
        Generation::Session(self.session.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Invalidate a session's in-flight responses. A session that has
    /// already been superseded is left alone.
    pub fn end_session(&self, generation: Generation) {
        if let Generation::Session(value) = generation {
            let _ = self.session.compare_exchange(
                value,
                value + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            );
        }
    }

    /// Token for the view that is showing right now
    pub fn view_token(&self) -> Generation {
        Generation::View(self.view_epoch.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        match generation {
            Generation::Session(value) => self.session.load(Ordering::SeqCst) == value,
            Generation::View(value) => self.view_epoch.load(Ordering::SeqCst) == value,
        }
    }

    /// Switch view. Every call starts a fresh view visit, even when the
    /// view is unchanged, so responses from the previous visit are dropped.
    pub async fn set_view(&self, view: View) -> bool {
        let mut inner = self.inner.write().await;
        self.view_epoch.fetch_add(1, Ordering::SeqCst);
        let changed = inner.view != view;
        inner.view = view;
        changed
    }

    /// Local status write from an operator action
    pub async fn set_status(&self, status: SystemStatus) -> Option<StatusChange> {
        let mut inner = self.inner.write().await;
        if inner.status == status {
            return None;
        }
        let previous = std::mem::replace(&mut inner.status, status.clone());
        Some(StatusChange {
            previous,
            current: status,
        })
    }

    /// Apply a polled status. Returns the change when the text differs.
    pub async fn apply_status(
        &self,
        generation: Generation,
        status: SystemStatus,
    ) -> Option<StatusChange> {
        let mut inner = self.inner.write().await;
        if !self.is_current(generation) {
            debug!("Discarding stale status response");
            return None;
        }
        if inner.status == status {
            return None;
        }

        let previous = std::mem::replace(&mut inner.status, status.clone());
        Some(StatusChange {
            previous,
            current: status,
        })
    }

    /// Replace the results listing if the view visit is still current
    pub async fn apply_results(&self, generation: Generation, results: Vec<ResultEntry>) -> bool {
        let mut inner = self.inner.write().await;
        if !self.is_current(generation) || inner.view != View::Main {
            debug!("Discarding stale results response");
            return false;
        }
        inner.results = results;
        true
    }

    /// Replace the log collection and record the count it corresponds to
    pub async fn apply_logs(&self, generation: Generation, count: u64, logs: Vec<LogEntry>) -> bool {
        let mut inner = self.inner.write().await;
        if !self.is_current(generation) {
            debug!("Discarding stale log response");
            return false;
        }
        inner.logs = logs;
        inner.last_seen_log_count = count;
        true
    }

    pub async fn push_chat(&self, message: ChatMessage) {
        self.inner.write().await.transcript.push(message);
    }

    pub async fn set_chat_loading(&self, loading: bool) {
        self.inner.write().await.chat_loading = loading;
    }
}
