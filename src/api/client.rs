//! HTTP client for the Fomolt service.
//!
//! One request primitive serves two identities: a reader that never sends a
//! credential (public data such as another agent's trades) and a trader that
//! attaches the operator's bearer key (order submission, portfolio).

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::types::Envelope;
use super::ApiError;

pub const DEFAULT_API_URL: &str = "https://fomolt.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Client for the service's `/api/v1` endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl ApiClient {
    /// Create a client. `api_key` decides whether requests are authenticated.
    pub fn new(api_url: &str, api_key: Option<String>) -> Result<Self> {
        let base_url = Url::parse(api_url).with_context(|| format!("Invalid API URL: {}", api_url))?;
        if base_url.cannot_be_a_base() {
            bail!("Invalid API URL: {}", api_url);
        }

        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// Unauthenticated client, for reading public data.
    pub fn reader(api_url: &str) -> Result<Self> {
        Self::new(api_url, None)
    }

    /// Authenticated client acting as the operator's agent.
    pub fn trader(api_url: &str, api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_url, Some(api_key.into()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build `{base}/api/v1/{segments...}`. Each segment is percent-encoded,
    /// so a name containing `/` stays a single segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    /// Issue a GET and return the envelope's `response` payload.
    pub async fn get(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(url = %url, authenticated = self.is_authenticated(), "GET");

        let mut request = self.http.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        self.send(request).await
    }

    /// Issue a POST with a JSON body and return the envelope's `response` payload.
    pub async fn post<B>(&self, segments: &[&str], body: &B) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        debug!(url = %url, authenticated = self.is_authenticated(), "POST");

        self.send(self.http.post(url).json(body)).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let request = match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response.headers();
        let request_id = headers
            .get("X-Request-Id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let retry_after = headers
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| ApiError::Parse {
            status,
            reason: e.to_string(),
        })?;

        if !envelope.success {
            let message = envelope.failure_message();
            let code = ApiError::service_code(status, envelope.error.and_then(|e| e.code));
            debug!(status, code = %code, request_id = %request_id, "Service returned an error");
            return Err(ApiError::Service {
                status,
                code,
                message,
                request_id,
                retry_after,
            });
        }

        Ok(envelope.response)
    }
}
