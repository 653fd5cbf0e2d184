// HTTP upstream adapter - reqwest client for the trim, download and merge services

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapters::toml_config::AppConfig;
use crate::domain::errors::*;
use crate::ports::*;

/// Fixed upstream URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEndpoints {
    pub trim_url: String,
    pub download_url: String,
    pub merge_url: String,
    pub file_check_url: String,
}

impl UpstreamEndpoints {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            trim_url: config.trim_url.clone(),
            download_url: config.download_url.clone(),
            merge_url: config.merge_url.clone(),
            file_check_url: config.file_check_url.clone(),
        }
    }
}

/// Shared client construction for the adapter and the relay
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, DomainError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DomainError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Typed HTTP client for the upstream services
pub struct HttpUpstreamAdapter {
    client: reqwest::Client,
    endpoints: UpstreamEndpoints,
}

impl HttpUpstreamAdapter {
    pub fn new(endpoints: UpstreamEndpoints, timeout: Duration) -> Result<Self, DomainError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoints,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        Self::new(
            UpstreamEndpoints::from_config(config),
            config.request_timeout(),
        )
    }

    pub fn endpoints(&self) -> &UpstreamEndpoints {
        &self.endpoints
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, DomainError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(upstream = url, "POST upstream");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;
        read_json(url, response).await
    }

    async fn get_json<T>(&self, url: &str, query: &[(&str, &str)]) -> Result<T, DomainError>
    where
        T: DeserializeOwned,
    {
        debug!(upstream = url, "GET upstream");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;
        read_json(url, response).await
    }
}

fn network_error(url: &str, err: reqwest::Error) -> DomainError {
    warn!(upstream = url, error = %err, "Upstream request failed");
    DomainError::Network(err.to_string())
}

/// Decode a success body, or turn an error status into `DomainError::Upstream`
/// carrying the envelope's `error` field when there is one.
async fn read_json<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T, DomainError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        return Err(upstream_error(url, status, &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| DomainError::Network(format!("Invalid response from {}: {}", url, e)))
}

/// Like `read_json`, except that a failed job may come back under an error
/// status with the regular status envelope. That envelope is returned as is.
async fn read_status(url: &str, response: reqwest::Response) -> Result<StatusReport, DomainError> {
    let status = response.status();
    if status.is_success() {
        return read_json(url, response).await;
    }

    let body = response.bytes().await.unwrap_or_default();
    match serde_json::from_slice::<StatusReport>(&body) {
        Ok(report) if report.status != RemoteJobState::Unknown => {
            warn!(
                upstream = url,
                status = status.as_u16(),
                state = ?report.status,
                "Status envelope under error status"
            );
            Ok(report)
        }
        _ => Err(upstream_error(url, status, &body)),
    }
}

fn upstream_error(url: &str, status: reqwest::StatusCode, body: &[u8]) -> DomainError {
    warn!(upstream = url, status = status.as_u16(), "Upstream returned error status");
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string));
    DomainError::Upstream {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl MediaApiPort for HttpUpstreamAdapter {
    async fn fetch_formats(&self, video_url: &str) -> Result<TrimInfo, DomainError> {
        let body = serde_json::json!({ "videoUrl": video_url });
        self.post_json(&self.endpoints.trim_url, &body).await
    }

    async fn request_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, DomainError> {
        self.post_json(&self.endpoints.download_url, request).await
    }
}

#[async_trait]
impl JobApiPort for HttpUpstreamAdapter {
    async fn start_job(&self, request: &MergeRequest) -> Result<JobEnvelope, DomainError> {
        self.post_json(&self.endpoints.merge_url, request).await
    }

    async fn check_status(&self, job_id: &str) -> Result<StatusReport, DomainError> {
        let url = &self.endpoints.merge_url;
        debug!(upstream = %url, job_id, "GET job status");
        let response = self
            .client
            .get(url)
            .query(&[("id", job_id)])
            .send()
            .await
            .map_err(|e| network_error(url, e))?;
        read_status(url, response).await
    }

    async fn check_file(&self, file_name: &str) -> Result<FileCheck, DomainError> {
        self.get_json(&self.endpoints.file_check_url, &[("file", file_name)])
            .await
    }
}
