//! REST gateway and the reqwest-backed HTTP client.
//!
//! The gateway is transport-only: it builds the URI, sends the body with the
//! JSON content type and hands the response text back verbatim. Parsing is
//! the caller's job, so the same gateway serves any document shape.

use crate::config::RestConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::{
    HttpClient, HttpClientError, HttpMethod, HttpRequest, HttpResponse, ACCEPT_JSON,
    CONTENT_TYPE_JSON,
};
use firerating_codec::encode_path_segment;
use std::time::Duration;
use tracing::debug;

/// Blocking HTTP client backed by `reqwest`.
///
/// The inner client pools connections, so one instance should be shared by
/// all calls of a session.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client whose connect phase is bounded by `timeout`.
    pub fn new(timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                SyncError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpClientError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .header(reqwest::header::ACCEPT, request.accept)
            .timeout(request.timeout);

        if let Some(body) = &request.body {
            builder = builder
                .header(
                    reqwest::header::CONTENT_TYPE,
                    request.content_type.unwrap_or(CONTENT_TYPE_JSON),
                )
                .body(body.clone());
        }

        let response = builder.send().map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(classify)?;
        Ok(HttpResponse { status, body })
    }
}

fn classify(error: reqwest::Error) -> HttpClientError {
    let message = error_chain(&error);
    if error.is_timeout() {
        HttpClientError::Timeout(message)
    } else if error.is_connect() {
        HttpClientError::Connect(message)
    } else {
        HttpClientError::Other(message)
    }
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Synchronous REST access to the remote document store.
///
/// The endpoint is fixed at construction and never changes for the
/// lifetime of the gateway.
pub struct RestGateway<C: HttpClient> {
    /// `base_url + "/" + api_version`, without a trailing slash.
    api_root: String,
    timeout: Duration,
    client: C,
}

impl<C: HttpClient> RestGateway<C> {
    /// Creates a gateway, validating the configured base URL.
    pub fn new(config: &RestConfig, client: C) -> SyncResult<Self> {
        let base_url = config.endpoint.base_url().trim_end_matches('/');
        let parsed = url::Url::parse(base_url).map_err(|e| {
            SyncError::Configuration(format!("malformed base URL {base_url:?}: {e}"))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(SyncError::Configuration(format!(
                "base URL {base_url:?} must be an absolute http(s) URL"
            )));
        }

        let api_version = config.api_version.trim_matches('/');
        let api_root = if api_version.is_empty() {
            base_url.to_string()
        } else {
            format!("{base_url}/{api_version}")
        };

        Ok(Self {
            api_root,
            timeout: config.timeout,
            client,
        })
    }

    /// Returns `base_url/api_version`.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Performs one request against `api_root/path_segment`.
    ///
    /// A 404 answers an empty string (absent document); any other non-2xx
    /// status is a [`SyncError::Server`].
    pub fn call(&self, path_segment: &str, body: &str, method: HttpMethod) -> SyncResult<String> {
        debug_assert!(
            method != HttpMethod::Get || body.is_empty(),
            "content is not allowed with GET"
        );
        if method == HttpMethod::Get && !body.is_empty() {
            return Err(SyncError::InvalidRequest(
                "content is not allowed with GET".into(),
            ));
        }

        let url = format!("{}/{}", self.api_root, path_segment);
        let (body, content_type) = if body.is_empty() {
            (None, None)
        } else {
            (Some(body.to_string()), Some(CONTENT_TYPE_JSON))
        };
        let request = HttpRequest {
            method,
            url,
            body,
            content_type,
            accept: ACCEPT_JSON,
            timeout: self.timeout,
        };

        debug!(method = %method, url = %request.url, "rest call");

        let response = self.client.send(&request).map_err(|e| match e {
            HttpClientError::Timeout(message) => SyncError::Timeout(message),
            HttpClientError::Connect(message) => SyncError::transport_retryable(message),
            HttpClientError::Other(message) => SyncError::transport_fatal(message),
        })?;

        debug!(method = %method, url = %request.url, status = response.status, "rest response");

        if response.is_success() {
            Ok(response.body)
        } else if response.status == 404 && method == HttpMethod::Get {
            Ok(String::new())
        } else {
            Err(SyncError::Server {
                status: response.status,
                body: response.body,
            })
        }
    }

    /// Reads `collection/id`; empty when absent.
    pub fn get_document(&self, collection: &str, id: &str) -> SyncResult<String> {
        self.call(&document_path(collection, id), "", HttpMethod::Get)
    }

    /// Upserts `collection/id`.
    pub fn put_document(&self, collection: &str, id: &str, json: &str) -> SyncResult<String> {
        self.call(&document_path(collection, id), json, HttpMethod::Put)
    }

    /// Creates a document in `collection`.
    pub fn post_document(&self, collection: &str, json: &str) -> SyncResult<String> {
        self.call(collection, json, HttpMethod::Post)
    }
}

impl RestGateway<ReqwestClient> {
    /// Creates a gateway backed by a pooled reqwest client.
    pub fn connect(config: &RestConfig) -> SyncResult<Self> {
        let client = ReqwestClient::new(config.timeout)?;
        Self::new(config, client)
    }
}

fn document_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, encode_path_segment(id))
}
