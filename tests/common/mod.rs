//! In-process stand-in for the trim, download and merge services

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use yt_trimmer::adapters::UpstreamEndpoints;
use yt_trimmer::relay::{self, RelayState};

pub const MEDIA_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42fake-media-payload";

#[derive(Default)]
pub struct StubState {
    pub status_calls: AtomicUsize,
    pub received: Mutex<Vec<(String, Value)>>,
}

impl StubState {
    fn record(&self, route: &str, body: Value) {
        self.received.lock().unwrap().push((route.to_string(), body));
    }

    pub fn bodies(&self, route: &str) -> Vec<Value> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == route)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

pub struct StubUpstream {
    pub addr: SocketAddr,
    pub state: Arc<StubState>,
}

impl StubUpstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn endpoints(&self) -> UpstreamEndpoints {
        UpstreamEndpoints {
            trim_url: self.url("/api/trim"),
            download_url: self.url("/download/"),
            merge_url: self.url("/api/merge"),
            file_check_url: self.url("/api/file-check"),
        }
    }
}

#[derive(Deserialize)]
struct IdQuery {
    id: String,
}

#[derive(Deserialize)]
struct FileQuery {
    file: String,
}

async fn trim(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Json<Value> {
    state.record("trim", body);
    Json(json!({
        "formats": [
            { "ext": "m4a", "resolution": "audio only", "format_id": "140" },
            { "ext": "mp4", "resolution": "1280x720", "note": "720p", "format_id": "22" },
            { "ext": "mp4", "resolution": "640x360", "note": "360p", "format_id": "18" }
        ]
    }))
}

async fn download(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    state.record("download", body.clone());
    if body.get("format_id").and_then(Value::as_str) == Some("bad") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "format not available" })),
        )
            .into_response();
    }
    Json(json!({ "data": { "downloadable_url": "https://cdn.example/clip.mp4" } }))
        .into_response()
}

/// Video id whose merge job fails during encoding
pub const CRASHING_VIDEO_ID: &str = "crashcrash1";

async fn start_merge(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Json<Value> {
    let job = if body["videos"][0]["videoId"] == CRASHING_VIDEO_ID {
        "/crashed.mp4"
    } else {
        "/job42.mp4"
    };
    state.record("merge", body);
    Json(json!({
        "status": "processing",
        "progress": 0,
        "stage": "queued",
        "url": job
    }))
}

async fn merge_status(
    State(state): State<Arc<StubState>>,
    Query(query): Query<IdQuery>,
) -> Response {
    state.record("status", json!({ "id": query.id }));
    let call = state.status_calls.fetch_add(1, Ordering::SeqCst);
    if query.id == "crashed" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "stage": "encoding", "error": "ffmpeg crashed" })),
        )
            .into_response();
    }
    if call == 0 {
        Json(json!({ "status": "processing", "progress": 40, "stage": "merging" })).into_response()
    } else {
        Json(json!({ "status": "completed", "progress": 100 })).into_response()
    }
}

async fn file_check(
    State(state): State<Arc<StubState>>,
    Query(query): Query<FileQuery>,
) -> Json<Value> {
    state.record("file-check", json!({ "file": query.file }));
    Json(json!({ "exists": true, "path": format!("/{}", query.file) }))
}

async fn media() -> Response {
    (
        [(header::CONTENT_TYPE, "video/mp4")],
        MEDIA_BYTES.to_vec(),
    )
        .into_response()
}

async fn untyped_media() -> Response {
    let mut response = MEDIA_BYTES.to_vec().into_response();
    response.headers_mut().remove(header::CONTENT_TYPE);
    response
}

async fn not_json() -> &'static str {
    "<html>maintenance</html>"
}

/// Start the stub on an ephemeral port
pub async fn spawn_upstream() -> StubUpstream {
    let state = Arc::new(StubState::default());
    let app = Router::new()
        .route("/api/trim", post(trim))
        .route("/download/", post(download))
        .route("/api/merge", post(start_merge).get(merge_status))
        .route("/api/file-check", get(file_check))
        .route("/media.mp4", get(media))
        .route("/blob", get(untyped_media))
        .route("/not-json", post(not_json))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubUpstream { addr, state }
}

/// Start the relay on an ephemeral port, forwarding to `endpoints`
pub async fn spawn_relay(endpoints: UpstreamEndpoints) -> SocketAddr {
    let state = RelayState::new(endpoints, Duration::from_secs(5)).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(relay::run(listener, state, std::future::pending()));
    addr
}
