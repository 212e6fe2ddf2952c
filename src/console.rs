//! Operator actions
//!
//! [`Console`] is the single writer of local state for everything the
//! operator does: uploads, simulation start/stop, chat and view changes.
//! Polled state arrives through the [`SyncHub`] it owns.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::client::Backend;
use crate::config::Config;
use crate::models::{ChatMessage, SystemStatus, VideoUpload, CHAT_ERROR_PLACEHOLDER};
use crate::state::{ConsoleState, View};
use crate::sync::{PollingHandle, SyncEvent, SyncHub};
use crate::validation::{SimulationRequest, ValidationError};

pub const UPLOAD_FAILED_STATUS: &str = "Error: Upload failed.";
pub const SIMULATION_FAILED_STATUS: &str = "Error: Could not start simulation.";

/// Outcome of an operator submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Request went out; the status shown afterwards
    Sent(SystemStatus),
    /// Blocked before any network call
    Rejected(ValidationError),
    /// Transport failure; the status shown afterwards
    Failed(SystemStatus),
    /// Nothing to submit
    Ignored,
}

impl Submission {
    pub fn is_sent(&self) -> bool {
        matches!(self, Submission::Sent(_))
    }
}

#[derive(Clone)]
pub struct Console {
    backend: Arc<dyn Backend>,
    state: ConsoleState,
    hub: SyncHub,
}

impl Console {
    pub fn new(backend: Arc<dyn Backend>, config: &Config) -> Self {
        let state = ConsoleState::new(config.console.default_phone_number.clone());
        let hub = SyncHub::new(backend.clone(), state.clone(), config.polling.clone());
        Self {
            backend,
            state,
            hub,
        }
    }

    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    pub fn hub(&self) -> &SyncHub {
        &self.hub
    }

    /// Start polling and show the main view
    pub async fn mount(&self) -> PollingHandle {
        let handle = self.hub.start();
        if self.state.view().await == View::Main {
            self.hub.refresh_results().await;
        }
        handle
    }

    /// Enter the main view and refresh the results listing for it
    pub async fn enter_main_view(&self) {
        self.change_view(View::Main).await;
        self.hub.refresh_results().await;
    }

    async fn change_view(&self, view: View) {
        if self.state.set_view(view).await {
            info!("🖥️  View: {:?}", view);
            self.hub.publish(SyncEvent::ViewChanged(view));
        }
    }

    async fn set_status(&self, status: SystemStatus) -> SystemStatus {
        if let Some(change) = self.state.set_status(status.clone()).await {
            self.hub.publish(SyncEvent::StatusChanged(change));
        }
        status
    }

    /// Submit a video for offline analysis. The status flips to
    /// "Processing: <file>" as soon as the request completes.
    pub async fn upload(&self, video: Option<VideoUpload>) -> Submission {
        let Some(video) = video else {
            return Submission::Ignored;
        };

        let file_name = video.file_name().to_string();
        info!("📤 Uploading {} ({} bytes)", file_name, video.bytes().len());
        match self.backend.upload(video).await {
            Ok(()) => {
                let status = self.set_status(SystemStatus::processing(&file_name)).await;
                Submission::Sent(status)
            }
            Err(e) => {
                error!("Upload failed: {}", e);
                let status = self.set_status(SystemStatus::new(UPLOAD_FAILED_STATUS)).await;
                Submission::Failed(status)
            }
        }
    }

    /// Validate and start the live simulation; switches to the realtime view
    pub async fn start_simulation(&self, video: Option<VideoUpload>, phone_number: &str) -> Submission {
        self.state.set_phone_number(phone_number).await;

        let request = match SimulationRequest::new(video, phone_number) {
            Ok(request) => request,
            Err(e) => {
                warn!("Simulation not started: {}", e);
                return Submission::Rejected(e);
            }
        };

        info!(
            "🎬 Starting simulation with {}, alerts to {}",
            request.video().file_name(),
            request.phone_number()
        );
        match self.backend.start_simulation(request).await {
            Ok(()) => {
                self.change_view(View::Realtime).await;
                Submission::Sent(self.state.status().await)
            }
            Err(e) => {
                error!("Failed to start simulation: {}", e);
                let status = self.set_status(SystemStatus::new(SIMULATION_FAILED_STATUS)).await;
                Submission::Failed(status)
            }
        }
    }

    /// Stop the simulation, return to the main view and reset the status.
    /// On failure nothing changes.
    pub async fn stop_realtime(&self) -> Submission {
        match self.backend.stop_realtime().await {
            Ok(()) => {
                self.change_view(View::Main).await;
                let status = self.set_status(SystemStatus::standby()).await;
                info!("⏹️  Simulation stopped");
                self.hub.refresh_results().await;
                Submission::Sent(status)
            }
            Err(e) => {
                error!("Failed to stop real-time feed: {}", e);
                Submission::Failed(self.state.status().await)
            }
        }
    }

    /// Ask the assistant. The question is recorded right away; the answer
    /// (or an error placeholder) is appended when the request settles.
    /// Blank input is ignored.
    pub async fn ask(&self, input: &str) -> Option<ChatMessage> {
        if input.trim().is_empty() {
            return None;
        }

        self.append_chat(ChatMessage::user(input)).await;
        self.state.set_chat_loading(true).await;

        let reply = match self.backend.chat(input).await {
            Ok(answer) => ChatMessage::system(answer),
            Err(e) => {
                error!("Chat request failed: {}", e);
                ChatMessage::system(CHAT_ERROR_PLACEHOLDER)
            }
        };

        self.append_chat(reply.clone()).await;
        self.state.set_chat_loading(false).await;
        Some(reply)
    }

    async fn append_chat(&self, message: ChatMessage) {
        self.state.push_chat(message.clone()).await;
        self.hub.publish(SyncEvent::ChatAppended(message));
    }

    /// Feed URL with a fresh cache-busting timestamp
    pub fn live_feed_url(&self) -> String {
        self.backend.feed_url(Utc::now().timestamp_millis())
    }

    pub fn artifact_url(&self, file: &str) -> String {
        self.backend.artifact_url(file)
    }
}
