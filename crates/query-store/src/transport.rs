//! HTTP transport seam and action URL construction.
//!
//! The store never talks to the network directly: it hands an [`HttpRequest`]
//! to a [`Transport`] and interprets the [`HttpResponse`]. [`ReqwestTransport`]
//! is the production implementation; tests substitute their own.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use crate::config::ConnectionConfig;
use crate::error::{is_json_content_type, RequestFailure, TransportError};
use crate::params::ParamMap;

// ============================================================================
// Request / Response
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// JSON body for POST requests.
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            body: Some(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    /// A response carrying `body` as `application/json`.
    pub fn json(status: u16, status_text: impl Into<String>, body: &Value) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            content_type: Some("application/json".to_string()),
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        is_json_content_type(self.content_type.as_deref())
    }

    /// Decode the body, but only when the server declared it as JSON.
    pub fn decode_json(&self) -> Option<Value> {
        if !self.is_json() {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }

    pub fn into_failure(self) -> RequestFailure {
        RequestFailure {
            status: self.status,
            status_text: self.status_text,
            content_type: self.content_type,
            body: self.body,
        }
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Network layer used by every store operation.
///
/// Implementations return `Ok` for any response with a status line,
/// including 4xx/5xx; `Err` is reserved for requests that never completed.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ConnectionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::InvalidUrl {
            url: err.url().map(Url::to_string).unwrap_or_default(),
            message: err.to_string(),
        }
    } else {
        TransportError::Connection(err.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => {
                let builder = self.client.post(&request.url);
                match &request.body {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            }
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            body,
        })
    }
}

// ============================================================================
// ActionUrlBuilder
// ============================================================================

/// Builds `{base}{context}/{controller}{container}/{action}?{params}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionUrlBuilder {
    base_url: String,
    context_path: String,
}

impl ActionUrlBuilder {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            context_path: normalize_path(&config.context_path),
        }
    }

    pub fn build(
        &self,
        controller: &str,
        action: &str,
        container_path: Option<&str>,
        params: &ParamMap,
    ) -> Result<String, TransportError> {
        let container = container_path.map(normalize_path).unwrap_or_default();
        let raw = format!(
            "{}{}/{}{}/{}",
            self.base_url, self.context_path, controller, container, action
        );
        let mut url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
            url: raw.clone(),
            message: e.to_string(),
        })?;

        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params {
                for v in value.values() {
                    pairs.append_pair(name, v);
                }
            }
        }
        Ok(url.to_string())
    }
}

/// Leading slash, no trailing slash, empty stays empty.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
