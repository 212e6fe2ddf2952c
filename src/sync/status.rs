use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::SyncEvent;
use crate::client::Backend;
use crate::state::{ConsoleState, Generation, StatusChange};

/// Periodic read of `/status`
#[derive(Clone)]
pub struct StatusPoller {
    backend: Arc<dyn Backend>,
    state: ConsoleState,
    events: broadcast::Sender<SyncEvent>,
}

impl StatusPoller {
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

    /// Read the status once. Failures keep the previous status.
    pub async fn poll_once(&self, generation: Generation) -> Option<StatusChange> {
        match self.backend.status().await {
            Ok(Some(status)) => {
                let change = self.state.apply_status(generation, status).await?;
                if change.category_changed() {
                    debug!(
                        "Status category {:?} -> {:?}",
                        change.previous.category(),
                        change.current.category()
                    );
                }
                let _ = self.events.send(SyncEvent::StatusChanged(change.clone()));
                Some(change)
            }
            Ok(None) => {
                debug!("Status response carried no status text");
                None
            }
            Err(e) => {
                warn!("Failed to fetch status: {}", e);
                None
            }
        }
    }

    /// The first read happens one full period after start. Each tick's
    /// request runs on its own, so a slow response never delays the next
    /// tick; whichever response lands last wins.
    pub async fn run(
        self,
        period: Duration,
        generation: Generation,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    let poller = self.clone();
                    in_flight.spawn(async move {
                        poller.poll_once(generation).await;
                    });
                }
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        }

        in_flight.abort_all();
    }
}
