// Relay handlers - validate, forward to a fixed upstream, mirror the answer

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::TryStreamExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::error::{RelayError, RelayResult, PROCESSING_FAILED};
use super::RelayState;

/// Download fields passed through to the upstream
const DOWNLOAD_FIELDS: [&str; 6] = [
    "audio_format_id",
    "end_time",
    "format_id",
    "is_trim",
    "start_time",
    "url",
];

#[derive(Debug, Deserialize)]
pub struct JobQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

/// `POST /api/trim` with `{ videoUrl }`
pub async fn trim(
    State(state): State<RelayState>,
    body: Result<Json<Value>, JsonRejection>,
) -> RelayResult<Response> {
    let body = json_body(body)?;
    let video_url = required_str(&body, "videoUrl")
        .ok_or_else(|| RelayError::bad_request("Video URL is required"))?;

    let payload = serde_json::json!({ "videoUrl": video_url });
    let request = state.client.post(&state.endpoints.trim_url).json(&payload);
    forward_json(&state.endpoints.trim_url, request).await
}

/// `POST /api/download` with `{ url, audio_format_id, end_time, format_id, start_time, is_trim }`
pub async fn download(
    State(state): State<RelayState>,
    body: Result<Json<Value>, JsonRejection>,
) -> RelayResult<Response> {
    let body = json_body(body)?;
    if required_str(&body, "url").is_none() {
        return Err(RelayError::bad_request("Video URL is required"));
    }

    let payload: Map<String, Value> = DOWNLOAD_FIELDS
        .iter()
        .filter_map(|key| body.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect();
    let request = state
        .client
        .post(&state.endpoints.download_url)
        .json(&payload);
    forward_json(&state.endpoints.download_url, request).await
}

/// `POST /api/merge` with a non-empty `videos` list
pub async fn start_merge(
    State(state): State<RelayState>,
    body: Result<Json<Value>, JsonRejection>,
) -> RelayResult<Response> {
    let body = json_body(body)?;
    let videos = body
        .get("videos")
        .and_then(Value::as_array)
        .filter(|videos| !videos.is_empty())
        .ok_or_else(|| RelayError::bad_request("At least one video is required"))?;

    info!(clips = videos.len(), "Relaying merge submission");
    let payload = serde_json::json!({ "videos": videos });
    let request = state.client.post(&state.endpoints.merge_url).json(&payload);
    forward_json(&state.endpoints.merge_url, request).await
}

/// `GET /api/merge?id=`
pub async fn merge_status(
    State(state): State<RelayState>,
    Query(query): Query<JobQuery>,
) -> RelayResult<Response> {
    let id = non_empty(query.id).ok_or_else(|| RelayError::bad_request("Job id is required"))?;
    debug!(job_id = %id, "Relaying status check");
    let request = state
        .client
        .get(&state.endpoints.merge_url)
        .query(&[("id", id.as_str())]);
    forward_json(&state.endpoints.merge_url, request).await
}

/// `GET /api/file-check?file=`
pub async fn file_check(
    State(state): State<RelayState>,
    Query(query): Query<FileQuery>,
) -> RelayResult<Response> {
    let file =
        non_empty(query.file).ok_or_else(|| RelayError::bad_request("File name is required"))?;
    let request = state
        .client
        .get(&state.endpoints.file_check_url)
        .query(&[("file", file.as_str())]);
    forward_json(&state.endpoints.file_check_url, request).await
}

/// `GET /api/proxy?url=` streams any http(s) resource back with CORS opened
pub async fn proxy(
    State(state): State<RelayState>,
    Query(query): Query<ProxyQuery>,
) -> RelayResult<Response> {
    let url = query
        .url
        .filter(|url| url.starts_with("http"))
        .ok_or_else(|| RelayError::bad_request("Missing or invalid `url`"))?;

    let request = state.proxy_client.get(&url).build().map_err(|e| {
        warn!(upstream = %url, error = %e, "Proxy request could not be built");
        RelayError::internal("Internal proxy error")
    })?;
    let upstream = state.proxy_client.execute(request).await.map_err(|e| {
        warn!(upstream = %url, error = %e, "Proxy fetch failed");
        RelayError::bad_gateway("Upstream fetch failed")
    })?;
    if !upstream.status().is_success() {
        warn!(upstream = %url, status = upstream.status().as_u16(), "Proxy upstream refused");
        return Err(RelayError::bad_gateway("Upstream fetch failed"));
    }

    let mut headers = HeaderMap::new();
    for (name, value) in upstream.headers() {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
    }

    debug!(upstream = %url, "Streaming proxied body");
    let stream = upstream.bytes_stream().inspect_err(move |e| {
        warn!(upstream = %url, error = %e, "Proxied stream broke off");
    });
    let body = Body::from_stream(stream);
    Ok((StatusCode::OK, headers, body).into_response())
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    [
        header::CONNECTION,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
    ]
    .contains(name)
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> RelayResult<Value> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!(error = %rejection, "Rejected request body");
        RelayError::bad_request(rejection.body_text())
    })
}

fn required_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Send `request` and hand back the upstream status with its JSON body
async fn forward_json(upstream: &str, request: reqwest::RequestBuilder) -> RelayResult<Response> {
    let response = request.send().await.map_err(|e| {
        warn!(upstream, error = %e, "Upstream request failed");
        RelayError::internal(PROCESSING_FAILED)
    })?;

    let status = response.status();
    let body = response.json::<Value>().await.map_err(|e| {
        warn!(upstream, status = status.as_u16(), error = %e, "Upstream body is not JSON");
        RelayError::internal(PROCESSING_FAILED)
    })?;

    info!(upstream, status = status.as_u16(), "Relayed upstream response");
    Ok((status, Json(body)).into_response())
}
