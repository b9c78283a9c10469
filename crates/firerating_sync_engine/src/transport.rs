//! HTTP client abstraction and an in-memory document store.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Content type sent with every request body.
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Accept header sent with every request.
pub const ACCEPT_JSON: &str = "application/json, text/javascript, */*";

/// HTTP methods used by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// Read a document.
    Get,
    /// Create a document.
    Post,
    /// Create or replace a document.
    Put,
}

impl HttpMethod {
    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// JSON payload, absent for GET.
    pub body: Option<String>,
    /// Content type of the payload.
    pub content_type: Option<&'static str>,
    /// Accept header value.
    pub accept: &'static str,
    /// Timeout for the whole exchange.
    pub timeout: Duration,
}

/// A response with its body fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Body as text.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP status level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpClientError {
    /// The exchange did not finish in time.
    #[error("timed out: {0}")]
    Timeout(String),
    /// No connection could be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Any other I/O or protocol failure.
    #[error("{0}")]
    Other(String),
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. The gateway
/// only needs a blocking request/response exchange.
pub trait HttpClient: Send + Sync {
    /// Sends a request and reads the whole response body.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpClientError>;
}

impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpClientError> {
        (**self).send(request)
    }
}

/// Scripted failure for one document id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryFailure {
    /// Fail with a timeout.
    Timeout,
    /// Fail to connect.
    Refused,
    /// Answer with this status and body.
    Status(u16, String),
    /// Answer 200 with this raw body.
    Body(String),
}

/// An in-memory JSON document store that speaks the REST surface.
///
/// Useful for testing without a server: `GET/PUT {collection}/{id}` and
/// `POST {collection}` behave like the remote store, last write wins.
#[derive(Debug)]
pub struct MemoryDocumentStore {
    api_root: String,
    documents: RwLock<BTreeMap<(String, String), Value>>,
    requests: RwLock<Vec<HttpRequest>>,
    failures: RwLock<HashMap<String, MemoryFailure>>,
    latency: RwLock<Duration>,
}

impl MemoryDocumentStore {
    /// Creates a store answering below `api_root`, e.g.
    /// `http://127.0.0.1:3001/api/v1`.
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into().trim_end_matches('/').to_string(),
            documents: RwLock::new(BTreeMap::new()),
            requests: RwLock::new(Vec::new()),
            failures: RwLock::new(HashMap::new()),
            latency: RwLock::new(Duration::ZERO),
        }
    }

    /// Makes every request for `id` fail.
    ///
    /// A POST carries no id and is matched by its collection name instead.
    pub fn fail_with(&self, id: impl Into<String>, failure: MemoryFailure) {
        self.failures.write().insert(id.into(), failure);
    }

    /// Clears a scripted failure.
    pub fn clear_failure(&self, id: &str) {
        self.failures.write().remove(id);
    }

    /// Delays every response.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write() = latency;
    }

    /// Stores a document directly.
    pub fn insert(&self, collection: &str, id: &str, document: Value) {
        self.documents
            .write()
            .insert((collection.to_string(), id.to_string()), document);
    }

    /// Returns a stored document.
    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        self.documents
            .read()
            .get(&(collection.to_string(), id.to_string()))
            .cloned()
    }

    /// Returns the number of documents in a collection.
    pub fn document_count(&self, collection: &str) -> usize {
        self.documents
            .read()
            .keys()
            .filter(|(c, _)| c == collection)
            .count()
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.read().clone()
    }

    /// Counts received requests with the given method.
    pub fn request_count(&self, method: HttpMethod) -> usize {
        self.requests
            .read()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    fn route(&self, url: &str) -> Option<(String, Option<String>)> {
        let path = url.strip_prefix(&self.api_root)?.strip_prefix('/')?;
        let mut parts = path.splitn(2, '/');
        let collection = parts.next().filter(|c| !c.is_empty())?.to_string();
        let id = match parts.next() {
            Some(raw) => Some(urlencoding::decode(raw).ok()?.into_owned()),
            None => None,
        };
        Some((collection, id))
    }

    fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, HttpClientError> {
        let Some((collection, id)) = self.route(&request.url) else {
            return Ok(HttpResponse::new(404, "no route"));
        };

        let target = id.as_deref().unwrap_or(&collection);
        if let Some(failure) = self.failures.read().get(target).cloned() {
            return match failure {
                MemoryFailure::Timeout => Err(HttpClientError::Timeout(request.url.clone())),
                MemoryFailure::Refused => Err(HttpClientError::Connect(request.url.clone())),
                MemoryFailure::Status(status, body) => Ok(HttpResponse::new(status, body)),
                MemoryFailure::Body(body) => Ok(HttpResponse::new(200, body)),
            };
        }

        match (request.method, id) {
            (HttpMethod::Get, Some(id)) => {
                if request.body.is_some() {
                    return Ok(HttpResponse::new(400, "content is not allowed with GET"));
                }
                Ok(match self.document(&collection, &id) {
                    Some(doc) => HttpResponse::new(200, doc.to_string()),
                    None => HttpResponse::new(404, ""),
                })
            }
            (HttpMethod::Put, Some(id)) => {
                let mut doc = match parse_object(request.body.as_deref()) {
                    Ok(doc) => doc,
                    Err(response) => return Ok(response),
                };
                doc.insert("_id".to_string(), Value::String(id.clone()));
                let doc = Value::Object(doc);
                self.insert(&collection, &id, doc.clone());
                Ok(HttpResponse::new(200, doc.to_string()))
            }
            (HttpMethod::Post, None) => {
                let mut doc = match parse_object(request.body.as_deref()) {
                    Ok(doc) => doc,
                    Err(response) => return Ok(response),
                };
                let id = match doc.get("_id").and_then(Value::as_str) {
                    Some(id) if !id.is_empty() => id.to_string(),
                    _ => uuid::Uuid::new_v4().simple().to_string(),
                };
                doc.insert("_id".to_string(), Value::String(id.clone()));
                let doc = Value::Object(doc);
                self.insert(&collection, &id, doc.clone());
                Ok(HttpResponse::new(201, doc.to_string()))
            }
            (method, _) => Ok(HttpResponse::new(
                405,
                format!("{method} not supported on this path"),
            )),
        }
    }
}

fn parse_object(body: Option<&str>) -> Result<serde_json::Map<String, Value>, HttpResponse> {
    match body.map(serde_json::from_str::<Value>) {
        Some(Ok(Value::Object(map))) => Ok(map),
        _ => Err(HttpResponse::new(400, "expected a JSON object")),
    }
}

impl HttpClient for MemoryDocumentStore {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpClientError> {
        self.requests.write().push(request.clone());
        let latency = *self.latency.read();
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }
        self.handle(request)
    }
}
