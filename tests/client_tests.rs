//! BackendClient against a mock backend served by axum on an ephemeral port

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cctv_console::config::BackendConfig;
use cctv_console::{
    Backend, BackendClient, ConsoleError, Severity, SimulationRequest, StatusCategory, VideoUpload,
};

#[derive(Default)]
struct Recorded {
    requests: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl Recorded {
    fn find(&self, path: &str) -> Option<(String, String)> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _, _)| p == path)
            .map(|(_, content_type, body)| {
                (content_type.clone(), String::from_utf8_lossy(body).to_string())
            })
    }
}

async fn record(
    State(recorded): State<Arc<Recorded>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    recorded
        .requests
        .lock()
        .unwrap()
        .push((uri.path().to_string(), content_type, body.to_vec()));

    if uri.path() == "/upload" {
        // answer with an error page; uploads are fire-and-forget
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn chat(Json(body): Json<Value>) -> Json<Value> {
    let question = body["question"].as_str().unwrap_or_default();
    Json(json!({ "answer": format!("You asked: {}", question) }))
}

async fn artifact(Path(file): Path<String>) -> impl IntoResponse {
    if file == "missing.mp4" {
        return (StatusCode::NOT_FOUND, Vec::new());
    }
    (StatusCode::OK, format!("contents of {}", file).into_bytes())
}

async fn frame(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let stamp = params.get("t").cloned().unwrap_or_default();
    ([(header::CONTENT_TYPE, "image/jpeg")], format!("frame@{}", stamp))
}

async fn spawn_backend(router: Router) -> BackendClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    BackendClient::new(&BackendConfig {
        base_url: format!("http://{}", addr),
        request_timeout_secs: 5,
    })
    .unwrap()
}

fn healthy_backend(recorded: Arc<Recorded>) -> Router {
    Router::new()
        .route(
            "/status",
            get(|| async { Json(json!({ "status": "Processing: Step 2 of 5" })) }),
        )
        .route(
            "/results",
            get(|| async { Json(json!({ "files": ["clip_1.mp4", "clip_1_log.txt"] })) }),
        )
        .route("/results/:file", get(artifact))
        .route("/logs/count", get(|| async { Json(json!({ "count": 2 })) }))
        .route(
            "/logs/all",
            get(|| async {
                Json(json!({ "logs": [
                    { "clip_number": 1, "timestamp": "10:00:01", "severity": "WARN", "summary": "Loitering" },
                    { "clip_number": 2, "timestamp": "10:00:09", "severity": "PANIC", "summary": "Fight" }
                ]}))
            }),
        )
        .route("/video_feed", get(frame))
        .route("/chat", post(chat))
        .route("/upload", post(record))
        .route("/start_simulation", post(record))
        .route("/stop_realtime", post(record))
        .with_state(recorded)
}

#[tokio::test]
async fn test_reads_status_results_and_logs() {
    let client = spawn_backend(healthy_backend(Arc::default())).await;

    let status = client.status().await.unwrap().unwrap();
    assert_eq!(status.as_str(), "Processing: Step 2 of 5");
    assert_eq!(status.category(), StatusCategory::Processing);

    let results = client.results().await.unwrap();
    let names: Vec<&str> = results.iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["clip_1.mp4", "clip_1_log.txt"]);

    assert_eq!(client.log_count().await.unwrap(), 2);
    let logs = client.all_logs().await.unwrap().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].severity, Severity::Warn);
    assert_eq!(logs[1].severity, Severity::Other("PANIC".to_string()));
}

#[tokio::test]
async fn test_multipart_submissions() {
    let recorded = Arc::new(Recorded::default());
    let client = spawn_backend(healthy_backend(recorded.clone())).await;

    let video = VideoUpload::new("cam1.mp4", b"fake-mp4-bytes".to_vec());
    // the 500 from /upload is not an error
    client.upload(video).await.unwrap();

    let request = SimulationRequest::new(
        Some(VideoUpload::new("demo.mp4", b"demo-bytes".to_vec())),
        "+1234567890",
    )
    .unwrap();
    client.start_simulation(request).await.unwrap();
    client.stop_realtime().await.unwrap();

    let (content_type, body) = recorded.find("/upload").unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    assert!(body.contains(r#"name="video"; filename="cam1.mp4""#));
    assert!(body.contains("fake-mp4-bytes"));

    let (_, body) = recorded.find("/start_simulation").unwrap();
    assert!(body.contains(r#"name="demo_video"; filename="demo.mp4""#));
    assert!(body.contains(r#"name="phone_number""#));
    assert!(body.contains("+1234567890"));

    assert!(recorded.find("/stop_realtime").is_some());
}

#[tokio::test]
async fn test_chat_round_trip() {
    let client = spawn_backend(healthy_backend(Arc::default())).await;
    let answer = client.chat("hello").await.unwrap();
    assert_eq!(answer, "You asked: hello");
}

#[tokio::test]
async fn test_artifacts_and_frames() {
    let client = spawn_backend(healthy_backend(Arc::default())).await;

    let bytes = client.result_artifact("clip 1.mp4").await.unwrap();
    assert_eq!(bytes, b"contents of clip 1.mp4");

    let err = client.result_artifact("missing.mp4").await.unwrap_err();
    assert!(matches!(err, ConsoleError::Status { status: 404, .. }));

    let frame = client.video_frame(1234).await.unwrap();
    assert_eq!(frame, b"frame@1234");
}

#[tokio::test]
async fn test_missing_fields_fall_back_to_defaults() {
    let router = Router::new()
        .route("/status", get(|| async { Json(json!({})) }))
        .route("/results", get(|| async { Json(json!({ "files": null })) }))
        .route("/logs/count", get(|| async { Json(json!({})) }))
        .route("/logs/all", get(|| async { Json(json!({ "logs": {} })) }))
        .route("/chat", post(|| async { Json(json!({})) }));
    let client = spawn_backend(router).await;

    assert!(client.status().await.unwrap().is_none());
    assert!(client.results().await.unwrap().is_empty());
    assert_eq!(client.log_count().await.unwrap(), 0);
    assert!(client.all_logs().await.unwrap().is_none());
    assert_eq!(client.chat("hi").await.unwrap(), "No response.");
}

#[tokio::test]
async fn test_malformed_and_failed_reads() {
    let router = Router::new()
        .route("/status", get(|| async { "<html>oops</html>" }))
        .route(
            "/results",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        );
    let client = spawn_backend(router).await;

    let err = client.status().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Decode(_)));

    let err = client.results().await.unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = BackendClient::new(&BackendConfig {
        base_url: format!("http://{}", addr),
        request_timeout_secs: 2,
    })
    .unwrap();

    let err = client.upload(VideoUpload::new("cam1.mp4", vec![1])).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Http(_)));
}
