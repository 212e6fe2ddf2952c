/// CCTV Console - operator client for the anomaly-detection backend
///
/// Keeps a local view of the backend's status, processed results and event
/// logs in sync by polling, and drives uploads, live simulations and the
/// assistant chat.

pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod render;
pub mod state;
pub mod sync;
pub mod validation;

// Re-export main types for easy access
pub use crate::client::{Backend, BackendClient};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::console::{Console, Submission};
pub use crate::error::{ConsoleError, Result};
pub use crate::models::{
    ChatMessage, ChatRole, ChatTranscript, LogEntry, ResultEntry, Severity, StatusCategory,
    SystemStatus, VideoUpload,
};
pub use crate::state::{ConsoleSnapshot, ConsoleState, View};
pub use crate::sync::{PollingHandle, SyncEvent, SyncHub};
pub use crate::validation::{SimulationRequest, ValidationError};
