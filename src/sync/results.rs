use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use super::SyncEvent;
use crate::client::Backend;
use crate::error::Result;
use crate::state::ConsoleState;

/// One-shot read of `/results`, run on entry into the main view
#[derive(Clone)]
pub struct ResultsFetcher {
    backend: Arc<dyn Backend>,
    state: ConsoleState,
    events: broadcast::Sender<SyncEvent>,
}

impl ResultsFetcher {
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

    /// Returns false when the view changed before the listing arrived
    pub async fn refresh(&self) -> Result<bool> {
        let token = self.state.view_token();
        let entries = self.backend.results().await?;
        debug!("Backend listed {} result files", entries.len());

        if !self.state.apply_results(token, entries.clone()).await {
            return Ok(false);
        }

        let _ = self.events.send(SyncEvent::ResultsReplaced(entries));
        Ok(true)
    }
}
