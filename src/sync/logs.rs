use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::SyncEvent;
use crate::client::Backend;
use crate::error::Result;
use crate::state::{ConsoleState, Generation};

/// What one log poll did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTick {
    /// Remote count did not exceed the last seen count
    Unchanged { count: u64 },
    /// Full log collection fetched and adopted
    Replaced { count: u64, entries: usize },
    /// Count went up but the body held no log array
    Malformed { count: u64 },
    /// Session ended while the fetch was in flight
    Stale,
}

/// Two-phase log poll: cheap count check, full fetch only when it grew.
///
/// Entries removed or rewritten without the count going up are not noticed.
#[derive(Clone)]
pub struct LogPoller {
    backend: Arc<dyn Backend>,
    state: ConsoleState,
    events: broadcast::Sender<SyncEvent>,
}

impl LogPoller {
    pub fn new(
        backend: Arc<dyn Backend>,
        state: ConsoleState,
        events: broadcast::Sender<SyncEvent>,
    ) -> Self {
        Self {
            backend,
            state,
            events,
        }
    }

    pub async fn poll_once(&self, generation: Generation) -> Result<LogTick> {
        let count = self.backend.log_count().await?;
        let last_seen = self.state.last_seen_log_count().await;
        if count <= last_seen {
            return Ok(LogTick::Unchanged { count });
        }

        debug!("Log count {} -> {}, fetching all logs", last_seen, count);
        let Some(entries) = self.backend.all_logs().await? else {
            debug!("Log response had no log array, keeping {} entries", last_seen);
            return Ok(LogTick::Malformed { count });
        };

        let len = entries.len();
        if !self.state.apply_logs(generation, count, entries.clone()).await {
            return Ok(LogTick::Stale);
        }

        info!("📋 {} event log entries", len);
        let _ = self.events.send(SyncEvent::LogsReplaced { count, entries });
        Ok(LogTick::Replaced {
            count,
            entries: len,
        })
    }

    /// Polls immediately, then every `period`. Ticks run one at a time so
    /// two overlapping checks can never both act on the same count.
    pub async fn run(
        self,
        period: Duration,
        generation: Generation,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                result = self.poll_once(generation) => {
                    if let Err(e) = result {
                        warn!("Log polling failed: {}", e);
                    }
                }
            }
        }
    }
}
