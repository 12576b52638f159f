//! HTTP transport for the rates API and the remote history mirror.
//!
//! Both callers speak JSON over GET/POST; the mirror additionally authenticates with a
//! PostgREST key. The transport is a trait so tests and offline runs can replace it.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Default request timeout for the rates API and the remote mirror.
pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;

/// Upper bound on response text copied into error messages.
const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Lower-cased header names.
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn accepting_json(self) -> Self {
        self.with_header("accept", "application/json")
    }

    pub fn with_json_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.with_header("content-type", "application/json")
    }

    /// PostgREST expects the project key both as `apikey` and as a bearer token.
    pub fn with_postgrest_key(self, key: &str) -> Self {
        self.with_header("apikey", key)
            .with_header("authorization", format!("Bearer {key}"))
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Leading part of the body, trimmed, for log and error messages.
    pub fn body_excerpt(&self) -> String {
        let body = self.body.trim();
        match body.char_indices().nth(BODY_EXCERPT_CHARS) {
            Some((cut, _)) => format!("{}...", &body[..cut]),
            None => body.to_owned(),
        }
    }
}

/// Transport failure before a status code was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("request to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },
    #[error("could not connect to {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
}

impl HttpError {
    pub fn connect(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connect {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

pub trait HttpClient: Send + Sync {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a>;
}

/// Offline transport: every request answers `200 {}`.
///
/// The rate services treat that body as a malformed payload, so an offline run walks the
/// fallback chain without touching the network.
#[derive(Debug, Default)]
pub struct NoopHttpClient;

impl HttpClient for NoopHttpClient {
    fn execute<'a>(&'a self, _request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async { Ok(HttpResponse::ok_json("{}")) })
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fintec/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let HttpRequest {
                method,
                url,
                headers,
                body,
                timeout_ms,
            } = request;

            let mut builder = match method {
                HttpMethod::Get => self.client.get(&url),
                HttpMethod::Post => self.client.post(&url),
            };
            for (name, value) in &headers {
                builder = builder.header(name, value);
            }
            builder = builder.timeout(Duration::from_millis(timeout_ms));
            if let Some(body) = body {
                builder = builder.body(body);
            }

            let classify = |error: reqwest::Error| {
                if error.is_timeout() {
                    HttpError::Timeout {
                        url: url.clone(),
                        timeout_ms,
                    }
                } else if error.is_connect() {
                    HttpError::connect(url.clone(), error.to_string())
                } else {
                    HttpError::Request {
                        url: url.clone(),
                        reason: error.to_string(),
                    }
                }
            };

            let response = builder.send().await.map_err(classify)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(classify)?;
            Ok(HttpResponse { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgrest_key_travels_as_apikey_and_bearer_token() {
        let request = HttpRequest::post("https://mirror.test/rest/v1/bcv_rate_history")
            .with_postgrest_key("anon-key")
            .with_json_body("[]");

        assert_eq!(request.headers.get("apikey").map(String::as_str), Some("anon-key"));
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Bearer anon-key")
        );
        assert_eq!(
            request.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(request.body.as_deref(), Some("[]"));
        assert_eq!(request.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn header_names_are_lower_cased() {
        let request = HttpRequest::get("http://localhost:3000/api/bcv-rates")
            .with_header("Prefer", "resolution=merge-duplicates")
            .accepting_json();

        assert_eq!(
            request.headers.get("prefer").map(String::as_str),
            Some("resolution=merge-duplicates")
        );
        assert_eq!(
            request.headers.get("accept").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn long_bodies_are_cut_for_error_messages() {
        let html = format!("  <html>{}</html>", "é".repeat(500));
        let excerpt = HttpResponse::with_status(502, html).body_excerpt();

        assert_eq!(excerpt.chars().count(), BODY_EXCERPT_CHARS + 3);
        assert!(excerpt.starts_with("<html>"));
        assert!(excerpt.ends_with("..."));
        assert_eq!(HttpResponse::with_status(401, " denied\n").body_excerpt(), "denied");
    }

    #[test]
    fn transport_errors_name_the_url() {
        let timeout = HttpError::Timeout {
            url: String::from("http://localhost:3000/api/bcv-rates"),
            timeout_ms: 3_000,
        };

        assert_eq!(
            timeout.to_string(),
            "request to http://localhost:3000/api/bcv-rates timed out after 3000 ms"
        );
        assert_eq!(
            HttpError::connect("http://localhost:3000", "connection refused").to_string(),
            "could not connect to http://localhost:3000: connection refused"
        );
    }

    #[tokio::test]
    async fn noop_client_answers_empty_object() {
        let response = NoopHttpClient
            .execute(HttpRequest::get("http://localhost:3000/api/bcv-rates"))
            .await
            .expect("noop never fails");

        assert!(response.is_success());
        assert_eq!(response.body, "{}");
    }
}
