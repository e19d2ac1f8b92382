use async_trait::async_trait;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    DownloadRequest, HealthStatus, ListRequest, ListResponse, Operation, PreviewRequest,
    PreviewResult, RawDownload, TranscriptApi,
};
use crate::{ClientError, ClientResult};

const LIST_PATH: &str = "/api/transcripts/list";
const PREVIEW_PATH: &str = "/api/transcripts/preview";
const DOWNLOAD_PATH: &str = "/api/transcripts/download";
const HEALTH_PATH: &str = "/api/health";

/// Error body sent with non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// `TranscriptApi` over HTTP
pub struct HttpTranscriptApi {
    client: Client,
    base_url: String,
}

impl HttpTranscriptApi {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::from)?;

        Ok(Self::with_client(client, base_url))
    }

    /// Wrap an existing client; trailing slashes on the base URL are dropped
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        operation: Operation,
        path: &str,
        body: &B,
    ) -> ClientResult<Response> {
        let url = self.endpoint(path);
        tracing::debug!("POST {} ({})", url, operation);

        let response = self.client.post(&url).json(body).send().await?;
        check_status(&operation.to_string(), operation.fallback_message(), response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Turn a non-2xx response into a `Remote` error carrying the service's `detail`
async fn check_status(
    label: &str,
    fallback: &str,
    response: Response,
) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let message = remote_detail(&body).unwrap_or_else(|| fallback.to_string());
    tracing::warn!("{} request failed with HTTP {}: {}", label, status, message);

    Err(ClientError::Remote {
        status: status.as_u16(),
        message,
    })
}

/// The `detail` string of an error body, if there is one
fn remote_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(detail) if !detail.trim().is_empty() => Some(detail),
        _ => None,
    }
}

fn header_string(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    let value = response.headers().get(&name)?;
    match value.to_str() {
        Ok(s) => Some(s.to_string()),
        Err(_) => {
            tracing::debug!("Ignoring non-UTF-8 {} header", name);
            None
        }
    }
}

#[async_trait]
impl TranscriptApi for HttpTranscriptApi {
    async fn list_transcripts(&self, request: &ListRequest) -> ClientResult<ListResponse> {
        let response = self
            .post_json(Operation::Discovery, LIST_PATH, request)
            .await?;
        Self::decode(response).await
    }

    async fn fetch_preview(&self, request: &PreviewRequest) -> ClientResult<PreviewResult> {
        let response = self
            .post_json(Operation::Preview, PREVIEW_PATH, request)
            .await?;
        Self::decode(response).await
    }

    async fn download(&self, request: &DownloadRequest) -> ClientResult<RawDownload> {
        let response = self
            .post_json(Operation::Download, DOWNLOAD_PATH, request)
            .await?;

        let content_disposition = header_string(&response, CONTENT_DISPOSITION);
        let content_type = header_string(&response, CONTENT_TYPE);
        let bytes = response.bytes().await?.to_vec();

        tracing::debug!("Received {} bytes ({:?})", bytes.len(), content_type);

        Ok(RawDownload {
            bytes,
            content_disposition,
            content_type,
        })
    }

    async fn health(&self) -> ClientResult<HealthStatus> {
        let url = self.endpoint(HEALTH_PATH);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let response = check_status("health", "Service is not healthy", response).await?;
        Self::decode(response).await
    }
}
