//! HTTP client for the anomaly-detection backend

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::BackendConfig;
use crate::error::{ConsoleError, Result};
use crate::models::{
    ChatRequest, ChatResponse, LogCountResponse, LogEntry, LogsResponse, ResultEntry,
    ResultsResponse, StatusResponse, SystemStatus, VideoUpload,
};
use crate::validation::SimulationRequest;

/// Everything the console needs from the backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// `None` when the response carried no status text
    async fn status(&self) -> Result<Option<SystemStatus>>;
    async fn results(&self) -> Result<Vec<ResultEntry>>;
    async fn result_artifact(&self, file: &str) -> Result<Vec<u8>>;
    async fn upload(&self, video: VideoUpload) -> Result<()>;
    async fn start_simulation(&self, request: SimulationRequest) -> Result<()>;
    async fn stop_realtime(&self) -> Result<()>;
    async fn log_count(&self) -> Result<u64>;
    /// `None` when the body did not contain a log array
    async fn all_logs(&self) -> Result<Option<Vec<LogEntry>>>;
    async fn chat(&self, question: &str) -> Result<String>;

    fn artifact_url(&self, file: &str) -> String;
    fn feed_url(&self, timestamp_millis: i64) -> String;
}

/// reqwest-backed [`Backend`]
#[derive(Debug, Clone)]
pub struct BackendClient {
    base: Url,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut base = Url::parse(&config.base_url)?;
        if base.cannot_be_a_base() {
            return Err(ConsoleError::Config(format!(
                "backend URL cannot be used as a base: {}",
                config.base_url
            )));
        }
        // keep any path prefix when joining endpoint paths
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConsoleError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_bytes(&self, url: Url, label: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConsoleError::Status {
                endpoint: label.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Fire-and-forget POST: only transport failures are errors
    async fn post_and_forget(&self, path: &str, form: Option<Form>) -> Result<()> {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);

        let request = self.client.post(url);
        let request = match form {
            Some(form) => request.multipart(form),
            None => request,
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            warn!("Backend answered {} to {}", response.status(), path);
        }
        Ok(())
    }

    fn video_part(video: VideoUpload) -> Result<Part> {
        let mime = video.mime_type();
        let (file_name, bytes) = video.into_parts();
        Ok(Part::bytes(bytes).file_name(file_name).mime_str(mime)?)
    }

    /// Download the current live-feed frame
    pub async fn video_frame(&self, timestamp_millis: i64) -> Result<Vec<u8>> {
        let url = Url::parse(&self.feed_url(timestamp_millis))?;
        self.get_bytes(url, "video_feed").await
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn status(&self) -> Result<Option<SystemStatus>> {
        let response: StatusResponse = self.get_json("status").await?;
        Ok(response.into_status())
    }

    async fn results(&self) -> Result<Vec<ResultEntry>> {
        let response: ResultsResponse = self.get_json("results").await?;
        Ok(response.into_entries())
    }

    async fn result_artifact(&self, file: &str) -> Result<Vec<u8>> {
        let url = Url::parse(&self.artifact_url(file))?;
        self.get_bytes(url, &format!("results/{}", file)).await
    }

    async fn upload(&self, video: VideoUpload) -> Result<()> {
        let form = Form::new().part("video", Self::video_part(video)?);
        self.post_and_forget("upload", Some(form)).await
    }

    async fn start_simulation(&self, request: SimulationRequest) -> Result<()> {
        let (video, phone_number) = request.into_parts();
        let form = Form::new()
            .part("demo_video", Self::video_part(video)?)
            .text("phone_number", phone_number);
        self.post_and_forget("start_simulation", Some(form)).await
    }

    async fn stop_realtime(&self) -> Result<()> {
        self.post_and_forget("stop_realtime", None).await
    }

    async fn log_count(&self) -> Result<u64> {
        let response: LogCountResponse = self.get_json("logs/count").await?;
        Ok(response.count())
    }

    async fn all_logs(&self) -> Result<Option<Vec<LogEntry>>> {
        let response: LogsResponse = self.get_json("logs/all").await?;
        Ok(response.into_entries())
    }

    async fn chat(&self, question: &str) -> Result<String> {
        let url = self.endpoint("chat")?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(&ChatRequest { question })
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Backend answered {} to chat", response.status());
        }

        let body = response.text().await?;
        let response: ChatResponse = serde_json::from_str(&body)?;
        Ok(response.answer_or_default())
    }

    fn artifact_url(&self, file: &str) -> String {
        format!("{}results/{}", self.base, urlencoding::encode(file))
    }

    fn feed_url(&self, timestamp_millis: i64) -> String {
        format!("{}video_feed?t={}", self.base, timestamp_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> BackendClient {
        let config = BackendConfig {
            base_url: base_url.to_string(),
            request_timeout_secs: 5,
        };
        BackendClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joining() {
        let client = client("http://127.0.0.1:5001");
        assert_eq!(
            client.endpoint("logs/count").unwrap().as_str(),
            "http://127.0.0.1:5001/logs/count"
        );
    }

    #[test]
    fn test_base_path_prefix_is_kept() {
        let client = client("http://cctv.local/api");
        assert_eq!(
            client.endpoint("status").unwrap().as_str(),
            "http://cctv.local/api/status"
        );
    }

    #[test]
    fn test_feed_url_carries_timestamp() {
        let client = client("http://127.0.0.1:5001");
        assert_eq!(
            client.feed_url(1700000000123),
            "http://127.0.0.1:5001/video_feed?t=1700000000123"
        );
    }

    #[test]
    fn test_artifact_url_is_encoded() {
        let client = client("http://127.0.0.1:5001/");
        assert_eq!(
            client.artifact_url("clip 1.mp4"),
            "http://127.0.0.1:5001/results/clip%201.mp4"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = BackendConfig {
            base_url: "mailto:ops@example.com".to_string(),
            request_timeout_secs: 5,
        };
        assert!(BackendClient::new(&config).is_err());
    }
}
