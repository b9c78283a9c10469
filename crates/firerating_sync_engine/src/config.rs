//! Configuration for the REST gateway and the sync orchestrator.

use firerating_core::{AttributeRef, IdentityScheme};
use std::time::Duration;

/// Base URL of the local development server.
pub const LOCAL_BASE_URL: &str = "http://127.0.0.1:3001";

/// Base URL of the hosted server.
pub const HOSTED_BASE_URL: &str = "https://fireratingdb.herokuapp.com";

/// REST API version prefix.
pub const DEFAULT_API_VERSION: &str = "api/v1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default document collection for doors.
pub const DEFAULT_COLLECTION: &str = "doors";

/// Remote server the gateway talks to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Endpoint {
    /// Local development server.
    #[default]
    Local,
    /// Hosted server.
    Hosted,
    /// Any other base URL.
    Custom(String),
}

impl Endpoint {
    /// Maps the local/hosted switch onto an endpoint.
    pub fn from_switch(use_local_server: bool) -> Self {
        if use_local_server {
            Endpoint::Local
        } else {
            Endpoint::Hosted
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        match self {
            Endpoint::Local => LOCAL_BASE_URL,
            Endpoint::Hosted => HOSTED_BASE_URL,
            Endpoint::Custom(url) => url,
        }
    }
}

/// Configuration for the REST gateway.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Server selection.
    pub endpoint: Endpoint,
    /// API version path prefix.
    pub api_version: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl RestConfig {
    /// Creates a gateway configuration for the given endpoint.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the API version prefix.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self::new(Endpoint::default())
    }
}

/// What the orchestrator does for each entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// PUT by id, or POST when the entity has no id yet.
    #[default]
    Upsert,
    /// GET by id only.
    Query,
}

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Remote collection holding door documents.
    pub collection: String,
    /// Per-entity operation.
    pub mode: SyncMode,
    /// Project id substitution scheme.
    pub identity_scheme: IdentityScheme,
    /// Attribute holding the fire rating.
    pub attribute: AttributeRef,
    /// Maximum entities in flight at once.
    pub max_workers: usize,
    /// GET before PUT and skip the write when nothing changed.
    pub verify_before_write: bool,
    /// Entities not finished within this bound are reported cancelled.
    pub batch_deadline: Option<Duration>,
    /// Retry configuration for transient transport failures.
    pub retry: RetryConfig,
}

impl SyncConfig {
    /// Creates a new sync configuration.
    pub fn new() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            mode: SyncMode::Upsert,
            identity_scheme: IdentityScheme::default(),
            attribute: AttributeRef::fire_rating(),
            max_workers: 1,
            verify_before_write: false,
            batch_deadline: None,
            retry: RetryConfig::no_retry(),
        }
    }

    /// Sets the collection name.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Sets the sync mode.
    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the identity scheme.
    pub fn with_identity_scheme(mut self, scheme: IdentityScheme) -> Self {
        self.identity_scheme = scheme;
        self
    }

    /// Sets the attribute reference.
    pub fn with_attribute(mut self, attribute: AttributeRef) -> Self {
        self.attribute = attribute;
        self
    }

    /// Sets the worker count. Zero is treated as one.
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }

    /// Enables GET-before-PUT change detection.
    pub fn with_verify_before_write(mut self, verify: bool) -> Self {
        self.verify_before_write = verify;
        self
    }

    /// Sets the batch deadline.
    pub fn with_batch_deadline(mut self, deadline: Duration) -> Self {
        self.batch_deadline = Some(deadline);
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Retry policy for one entity's call.
///
/// Only idempotent calls are retried, and the pause before a retry never
/// exceeds the request timeout the gateway was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts per call, the first one included. Never below one.
    pub max_attempts: u32,
    /// Pause before the first retry; doubled for each further retry.
    pub base_delay: Duration,
    /// Adds up to a quarter of the pause at random.
    pub jitter: bool,
}

impl RetryConfig {
    /// Allows up to `max_attempts` calls per entity.
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(50),
            jitter: true,
        }
    }

    /// A single attempt per entity.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Sets the pause before the first retry.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Disables jitter.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Returns true if another call is allowed after `attempts_made`.
    pub fn allows_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Pause before retry number `retry` (1-based), capped at `request_timeout`.
    pub fn backoff(&self, retry: u32, request_timeout: Duration) -> Duration {
        let doublings = retry.saturating_sub(1).min(16);
        let pause = self
            .base_delay
            .saturating_mul(1 << doublings)
            .min(request_timeout);
        if self.jitter {
            pause + pause.mul_f64(0.25 * unit_jitter())
        } else {
            pause
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::no_retry()
    }
}

/// Fraction in `[0, 1)` taken from a random v4 uuid.
fn unit_jitter() -> f64 {
    (uuid::Uuid::new_v4().as_u128() % 1024) as f64 / 1024.0
}
