//! # FireRating Sync Engine
//!
//! REST transport and batch orchestration for door fire rating sync.
//!
//! This crate provides:
//! - `RestGateway`: blocking GET/POST/PUT against `base_url/api_version`
//! - `HttpClient` abstraction with a pooled `reqwest` implementation
//! - `SyncOrchestrator`: per-entity upsert or query with partial-failure
//!   semantics, optional worker pool, cancellation and retry
//! - `MemoryDocumentStore`: an in-memory REST document store for tests
//!
//! ## Architecture
//!
//! ```text
//! SyncOrchestrator ─► ProjectIdentityCache (once per batch)
//!                 ─► RecordMapper (per entity)
//!                 ─► RestGateway ─► HttpClient ─► remote store
//! ```
//!
//! ## Key Invariants
//!
//! - Every input entity yields exactly one result
//! - One entity's failure never aborts or corrupts another's
//! - The project id is resolved before any entity call and never mutated
//! - A cancelled entity is never reported as a success
//! - Upserts are keyed by the stable entity id, last write wins

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod orchestrator;
mod transport;

pub use config::{
    Endpoint, RestConfig, RetryConfig, SyncConfig, SyncMode, DEFAULT_API_VERSION,
    DEFAULT_COLLECTION, DEFAULT_TIMEOUT, HOSTED_BASE_URL, LOCAL_BASE_URL,
};
pub use error::{FailureKind, SyncError, SyncResult};
pub use http::{ReqwestClient, RestGateway};
pub use orchestrator::{
    EntitySyncResult, SyncAction, SyncOrchestrator, SyncOutcome, SyncStats, SyncSummary,
};
pub use transport::{
    HttpClient, HttpClientError, HttpMethod, HttpRequest, HttpResponse, MemoryDocumentStore,
    MemoryFailure, ACCEPT_JSON, CONTENT_TYPE_JSON,
};
