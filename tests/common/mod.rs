//! Scripted in-memory backend shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use cctv_console::{
    Backend, Config, ConfigBuilder, ConsoleError, LogEntry, Result, ResultEntry, Severity,
    SimulationRequest, SystemStatus, VideoUpload,
};

fn unavailable(endpoint: &str) -> ConsoleError {
    ConsoleError::Status {
        endpoint: endpoint.to_string(),
        status: 503,
    }
}

#[derive(Default)]
pub struct Calls {
    pub status: AtomicUsize,
    pub results: AtomicUsize,
    pub log_count: AtomicUsize,
    pub all_logs: AtomicUsize,
    pub upload: AtomicUsize,
    pub start_simulation: AtomicUsize,
    pub stop: AtomicUsize,
    pub chat: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct ScriptedBackend {
    pub calls: Calls,

    /// Successive status replies; `Err(())` is a failed request. When the
    /// queue runs dry the last reply repeats.
    pub statuses: Mutex<VecDeque<std::result::Result<Option<SystemStatus>, ()>>>,
    last_status: Mutex<Option<SystemStatus>>,
    /// Per-call gates for status replies, consumed in call order. A gated
    /// call holds its reply until notified.
    pub status_gates: Mutex<VecDeque<Option<Arc<Notify>>>>,

    /// Successive log counts; the last one repeats
    pub log_counts: Mutex<VecDeque<u64>>,
    last_count: Mutex<u64>,
    pub logs: Mutex<Vec<LogEntry>>,
    pub logs_malformed: AtomicBool,

    pub results: Mutex<Vec<ResultEntry>>,
    pub results_gate: Mutex<Option<Arc<Notify>>>,

    pub fail_upload: AtomicBool,
    pub fail_simulation: AtomicBool,
    pub fail_stop: AtomicBool,
    pub fail_chat: AtomicBool,
    pub chat_answer: Mutex<String>,

    pub uploaded: Mutex<Vec<String>>,
    pub simulations: Mutex<Vec<(String, String)>>,
    pub questions: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_statuses(&self, replies: Vec<std::result::Result<Option<&str>, ()>>) {
        let mut queue = self.statuses.lock().unwrap();
        for reply in replies {
            queue.push_back(reply.map(|text| text.map(SystemStatus::new)));
        }
    }

    pub fn script_log_counts(&self, counts: &[u64]) {
        self.log_counts.lock().unwrap().extend(counts.iter().copied());
    }

    pub fn set_logs(&self, count: usize) {
        *self.logs.lock().unwrap() = sample_logs(count);
    }

    pub fn set_results(&self, names: &[&str]) {
        *self.results.lock().unwrap() = names.iter().map(|n| ResultEntry::new(*n)).collect();
    }
}

pub fn sample_logs(count: usize) -> Vec<LogEntry> {
    (0..count)
        .map(|i| LogEntry {
            clip_number: i as i64 + 1,
            timestamp: format!("2024-05-01 10:00:{:02}", i),
            severity: if i % 2 == 0 { Severity::Info } else { Severity::Alert },
            summary: format!("Event {}", i + 1),
        })
        .collect()
}

pub fn test_config() -> Config {
    ConfigBuilder::new()
        .with_base_url("http://backend.test")
        .with_status_interval(20)
        .with_log_interval(5)
        .build()
}

pub fn video(name: &str) -> VideoUpload {
    VideoUpload::new(name, vec![0, 0, 0, 24, 102, 116, 121, 112])
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn status(&self) -> Result<Option<SystemStatus>> {
        self.calls.status.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        let reply = match next {
            Some(Ok(status)) => {
                *self.last_status.lock().unwrap() = status.clone();
                Ok(status)
            }
            Some(Err(())) => Err(unavailable("status")),
            None => Ok(self.last_status.lock().unwrap().clone()),
        };

        let gate = self.status_gates.lock().unwrap().pop_front().flatten();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        reply
    }

    async fn results(&self) -> Result<Vec<ResultEntry>> {
        self.calls.results.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.results.lock().unwrap().clone();
        let gate = self.results_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(snapshot)
    }

    async fn result_artifact(&self, file: &str) -> Result<Vec<u8>> {
        Ok(file.as_bytes().to_vec())
    }

    async fn upload(&self, video: VideoUpload) -> Result<()> {
        self.calls.upload.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(unavailable("upload"));
        }
        self.uploaded.lock().unwrap().push(video.file_name().to_string());
        Ok(())
    }

    async fn start_simulation(&self, request: SimulationRequest) -> Result<()> {
        self.calls.start_simulation.fetch_add(1, Ordering::SeqCst);
        if self.fail_simulation.load(Ordering::SeqCst) {
            return Err(unavailable("start_simulation"));
        }
        self.simulations.lock().unwrap().push((
            request.video().file_name().to_string(),
            request.phone_number().to_string(),
        ));
        Ok(())
    }

    async fn stop_realtime(&self) -> Result<()> {
        self.calls.stop.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(unavailable("stop_realtime"));
        }
        Ok(())
    }

    async fn log_count(&self) -> Result<u64> {
        self.calls.log_count.fetch_add(1, Ordering::SeqCst);
        let next = self.log_counts.lock().unwrap().pop_front();
        let mut last = self.last_count.lock().unwrap();
        if let Some(count) = next {
            *last = count;
        }
        Ok(*last)
    }

    async fn all_logs(&self) -> Result<Option<Vec<LogEntry>>> {
        self.calls.all_logs.fetch_add(1, Ordering::SeqCst);
        if self.logs_malformed.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(self.logs.lock().unwrap().clone()))
    }

    async fn chat(&self, question: &str) -> Result<String> {
        self.calls.chat.fetch_add(1, Ordering::SeqCst);
        self.questions.lock().unwrap().push(question.to_string());
        if self.fail_chat.load(Ordering::SeqCst) {
            return Err(unavailable("chat"));
        }
        Ok(self.chat_answer.lock().unwrap().clone())
    }

    fn artifact_url(&self, file: &str) -> String {
        format!("http://backend.test/results/{}", file)
    }

    fn feed_url(&self, timestamp_millis: i64) -> String {
        format!("http://backend.test/video_feed?t={}", timestamp_millis)
    }
}
