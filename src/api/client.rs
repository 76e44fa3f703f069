use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

use super::error::ApiError;
use super::model::{Asset, AssetRequest, Envelope, UploadHandle, UploadRequest};
use super::VideoApi;

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token_id: String,
    token_secret: String,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(
        base_url: &str,
        token_id: &str,
        token_secret: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        // Per-request timeouts only, file transfers are unbounded.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("muxcli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_id: token_id.to_string(),
            token_secret: token_secret.to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .timeout(self.timeout)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.authed(self.client.get(self.url(path))).send().await?;
        decode(check(response).await?).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let response = self
            .authed(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await?;
        decode(check(response).await?).await
    }
}

fn segment(id: &str) -> String {
    utf8_percent_encode(id, NON_ALPHANUMERIC).to_string()
}

async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: error_message(&text, status.canonical_reason().unwrap_or("request failed")),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
    Ok(envelope.data)
}

/// Pulls a readable message out of an `{"error": {"type", "messages"}}` body,
/// falling back to the raw text or the HTTP reason phrase.
fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let error = &json["error"];
        let messages: Vec<&str> = error["messages"]
            .as_array()
            .map(|m| m.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let kind = error["type"].as_str();

        match (kind, messages.is_empty()) {
            (Some(kind), false) => return format!("{}: {}", kind, messages.join("; ")),
            (None, false) => return messages.join("; "),
            (Some(kind), true) => return kind.to_string(),
            (None, true) => {}
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl VideoApi for HttpClient {
    #[instrument(skip(self, request), fields(policy = ?request.new_asset_settings.playback_policy))]
    async fn create_upload(&self, request: &UploadRequest) -> Result<UploadHandle, ApiError> {
        self.post("/video/v1/uploads", request).await
    }

    async fn get_upload(&self, id: &str) -> Result<UploadHandle, ApiError> {
        self.get(&format!("/video/v1/uploads/{}", segment(id))).await
    }

    async fn get_asset(&self, id: &str) -> Result<Asset, ApiError> {
        self.get(&format!("/video/v1/assets/{}", segment(id))).await
    }

    #[instrument(skip(self, url, path), fields(path = %path.display()))]
    async fn upload_file(&self, url: &str, path: &Path) -> Result<(), ApiError> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let body = Body::wrap_stream(ReaderStream::new(file));

        let start_time = coarsetime::Instant::now();
        let response = self
            .client
            .put(url)
            .header(CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await?;
        check(response).await?;

        debug!(bytes = len, duration = ?start_time.elapsed(), "file transferred");
        Ok(())
    }

    async fn create_asset(&self, request: &AssetRequest) -> Result<Asset, ApiError> {
        self.post("/video/v1/assets", request).await
    }

    async fn list_assets(&self, limit: u32, page: u32) -> Result<Vec<Asset>, ApiError> {
        self.get(&format!("/video/v1/assets?limit={}&page={}", limit, page))
            .await
    }

    async fn delete_asset(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .authed(self.client.delete(self.url(&format!("/video/v1/assets/{}", segment(id)))))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
