//! Plain-text panels for the terminal console

use std::fmt::Write;

use crate::models::{ChatRole, ChatTranscript, LogEntry, ResultEntry, Severity, StatusCategory, SystemStatus};
use crate::state::ConsoleSnapshot;

pub const EMPTY_RESULTS: &str = "No processed files yet. Upload a video to begin.";
pub const EMPTY_LOGS: &str = "No events detected yet. Upload or simulate a video to begin.";

/// Display style of the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStyle {
    Alert,
    InProgress,
    Neutral,
}

impl From<StatusCategory> for StatusStyle {
    fn from(category: StatusCategory) -> Self {
        match category {
            StatusCategory::Anomaly => StatusStyle::Alert,
            StatusCategory::Processing => StatusStyle::InProgress,
            StatusCategory::Normal => StatusStyle::Neutral,
        }
    }
}

pub fn status_style(status: &SystemStatus) -> StatusStyle {
    status.category().into()
}

/// Badge for a log severity; unknown values get the plain badge
pub fn severity_badge(severity: &Severity) -> &'static str {
    match severity {
        Severity::Info => "🟢",
        Severity::Warn => "🟡",
        Severity::Alert => "🔴",
        Severity::Other(_) => "⚪",
    }
}

pub fn status_line(status: &SystemStatus) -> String {
    match status_style(status) {
        StatusStyle::Alert => format!("⚠️  {}", status),
        StatusStyle::InProgress => format!("✅ {} ⏳", status),
        StatusStyle::Neutral => format!("✅ {}", status),
    }
}

pub fn results_panel(results: &[ResultEntry], link: impl Fn(&str) -> String) -> String {
    let mut out = String::from("── Processed Clips & Logs ──\n");
    if results.is_empty() {
        out.push_str(EMPTY_RESULTS);
        out.push('\n');
        return out;
    }

    for entry in results {
        let _ = writeln!(
            out,
            "  {}  [{}] {}",
            entry.name(),
            entry.kind().action_label(),
            link(entry.name())
        );
    }
    out
}

pub fn log_entry(entry: &LogEntry) -> String {
    format!(
        "{} Clip #{} • {}\n   {} {}",
        severity_badge(&entry.severity),
        entry.clip_number,
        entry.timestamp,
        entry.severity.as_str(),
        entry.summary
    )
}

pub fn log_panel(logs: &[LogEntry]) -> String {
    let mut out = String::from("── Live Event Logs ──\n");
    if logs.is_empty() {
        out.push_str(EMPTY_LOGS);
        out.push('\n');
        return out;
    }

    for entry in logs {
        out.push_str(&log_entry(entry));
        out.push('\n');
    }
    out
}

pub fn chat_panel(transcript: &ChatTranscript, loading: bool) -> String {
    let mut out = String::from("── Assistant ──\n");
    for message in transcript.messages() {
        let speaker = match message.role {
            ChatRole::User => "you",
            ChatRole::System => "assistant",
        };
        let _ = writeln!(out, "  {} › {}", speaker, message.text);
    }
    if loading {
        out.push_str("  assistant › Typing...\n");
    }
    out
}

pub fn main_view(snapshot: &ConsoleSnapshot, link: impl Fn(&str) -> String) -> String {
    let mut out = String::from("AI Anomaly Detection System\n\n");
    out.push_str(&status_line(&snapshot.status));
    out.push_str("\n\n");
    out.push_str(&results_panel(&snapshot.results, link));
    out.push('\n');
    out.push_str(&log_panel(&snapshot.logs));
    out
}

/// Realtime screen. `feed_url` should be freshly built for every render.
pub fn realtime_view(snapshot: &ConsoleSnapshot, feed_url: &str) -> String {
    let banner = if snapshot.status.is_live_alarm() {
        format!("🚨 {}", snapshot.status)
    } else {
        format!("🟩 {}", snapshot.status)
    };

    format!(
        "Live Simulation Active\nAlerts will be sent to: {}\nLive feed: {}\n\n{}\n",
        snapshot.phone_number, feed_url, banner
    )
}
