//! Backend data models
//!
//! Every response type here decodes leniently: missing or null fields fall
//! back to empty defaults instead of failing the whole response.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::Result;

/// Status shown before the backend reports anything and after a stop
pub const STANDBY_STATUS: &str = "System Standby";

pub const CHAT_GREETING: &str = "Hello 👋 Ask me anything!";
pub const CHAT_NO_RESPONSE: &str = "No response.";
pub const CHAT_ERROR_PLACEHOLDER: &str = "⚠️ Error contacting server.";

/// Coarse meaning of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Anomaly,
    Processing,
    Normal,
}

impl StatusCategory {
    /// Infer a category from free-form status text
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();

        if lower.contains("anomaly") || lower.contains("error") {
            StatusCategory::Anomaly
        } else if (lower.contains("processing") || lower.contains("step"))
            && !lower.contains("complete")
        {
            StatusCategory::Processing
        } else {
            StatusCategory::Normal
        }
    }

    /// Map a structured status code, when the backend sends one
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "anomaly" | "alert" | "error" => Some(StatusCategory::Anomaly),
            "processing" | "busy" => Some(StatusCategory::Processing),
            "normal" | "ok" | "idle" | "standby" => Some(StatusCategory::Normal),
            _ => None,
        }
    }
}

/// System status as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    text: String,
    code: Option<StatusCategory>,
}

impl SystemStatus {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    pub fn standby() -> Self {
        Self::new(STANDBY_STATUS)
    }

    /// Optimistic status after an upload request went out
    pub fn processing(filename: &str) -> Self {
        Self::new(format!("Processing: {}", filename))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Structured code wins; otherwise fall back to keyword matching
    pub fn category(&self) -> StatusCategory {
        self.code
            .unwrap_or_else(|| StatusCategory::classify(&self.text))
    }

    /// The realtime banner only reacts to the upper-case alarm word
    pub fn is_live_alarm(&self) -> bool {
        self.text.contains("ANOMALY")
    }
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self::standby()
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// `GET /status`
#[derive(Debug, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl StatusResponse {
    /// `None` when the backend omitted the status text
    pub fn into_status(self) -> Option<SystemStatus> {
        let text = self.status?;
        let code = self.code.as_deref().and_then(StatusCategory::from_code);
        Some(SystemStatus { text, code })
    }
}

/// What kind of artifact a result file is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Log,
    Clip,
}

impl ResultKind {
    pub fn action_label(&self) -> &'static str {
        match self {
            ResultKind::Log => "View Log",
            ResultKind::Clip => "Play Clip",
        }
    }
}

/// A processed clip or log file on the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultEntry(String);

impl ResultEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> ResultKind {
        if self.0.ends_with(".txt") {
            ResultKind::Log
        } else {
            ResultKind::Clip
        }
    }
}

/// `GET /results`
#[derive(Debug, Default, Deserialize)]
pub struct ResultsResponse {
    #[serde(default)]
    pub files: Option<Vec<String>>,
}

impl ResultsResponse {
    pub fn into_entries(self) -> Vec<ResultEntry> {
        self.files
            .unwrap_or_default()
            .into_iter()
            .map(ResultEntry)
            .collect()
    }
}

/// Log severity; anything unrecognised is kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Info,
    Warn,
    Alert,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Alert => "ALERT",
            Severity::Other(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Severity::Other(_))
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Other(String::new())
    }
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "INFO" => Severity::Info,
            "WARN" => Severity::Warn,
            "ALERT" => Severity::Alert,
            _ => Severity::Other(raw),
        }
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

/// Decode a field on its own: null or a value of the wrong type becomes
/// the field's default instead of failing the surrounding entry.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// One event log entry written by the backend for a detected clip
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    /// Sequence number of the clip that triggered the entry
    #[serde(deserialize_with = "lenient")]
    pub clip_number: i64,
    /// Backend-formatted time of the event, shown verbatim
    #[serde(deserialize_with = "lenient")]
    pub timestamp: String,
    /// Severity label
    #[serde(deserialize_with = "lenient")]
    pub severity: Severity,
    /// Human-readable description of what was detected
    #[serde(deserialize_with = "lenient")]
    pub summary: String,
}

/// `GET /logs/count`
#[derive(Debug, Default, Deserialize)]
pub struct LogCountResponse {
    #[serde(default)]
    pub count: Option<u64>,
}

impl LogCountResponse {
    pub fn count(&self) -> u64 {
        self.count.unwrap_or(0)
    }
}

/// `GET /logs/all`
#[derive(Debug, Default, Deserialize)]
pub struct LogsResponse {
    #[serde(default)]
    pub logs: Option<serde_json::Value>,
}

impl LogsResponse {
    /// `None` unless `logs` is an array. Entries that are not objects
    /// degrade to an empty entry so positions stay aligned.
    pub fn into_entries(self) -> Option<Vec<LogEntry>> {
        match self.logs {
            Some(serde_json::Value::Array(items)) => Some(
                items
                    .into_iter()
                    .map(|item| serde_json::from_value::<LogEntry>(item).unwrap_or_default())
                    .collect(),
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    System,
}

/// One line of the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message
    pub role: ChatRole,
    /// Message body
    pub text: String,
    /// When the message was appended locally
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Append-only conversation with the backend assistant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

impl Default for ChatTranscript {
    fn default() -> Self {
        Self {
            messages: vec![ChatMessage::system(CHAT_GREETING)],
        }
    }
}

/// `POST /chat` body
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub question: &'a str,
}

/// `POST /chat` response
#[derive(Debug, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub answer: Option<String>,
}

impl ChatResponse {
    pub fn answer_or_default(self) -> String {
        match self.answer {
            Some(answer) if !answer.is_empty() => answer,
            _ => CHAT_NO_RESPONSE.to_string(),
        }
    }
}

/// A video file read into memory for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUpload {
    file_name: String,
    bytes: Vec<u8>,
}

impl VideoUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Ok(Self { file_name, bytes })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hand over the file name and contents without copying
    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.file_name, self.bytes)
    }

    pub fn mime_type(&self) -> &'static str {
        match Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("mp4") | Some("m4v") => "video/mp4",
            Some("mov") => "video/quicktime",
            Some("avi") => "video/x-msvideo",
            Some("mkv") => "video/x-matroska",
            Some("webm") => "video/webm",
            _ => "application/octet-stream",
        }
    }
}
