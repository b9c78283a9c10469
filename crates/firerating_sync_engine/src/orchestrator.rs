//! Batch synchronization of host entities.

use crate::config::{RestConfig, SyncConfig, SyncMode};
use crate::error::{FailureKind, SyncError, SyncResult};
use crate::http::{ReqwestClient, RestGateway};
use crate::transport::HttpClient;
use firerating_core::{
    EntityHost, EntityPatch, ProjectId, ProjectIdentityCache, RecordMapper, SessionContext,
    TransferRecord,
};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Remote effect of one call and the document the server returned.
type Exchange = (SyncAction, Option<TransferRecord>);

/// Outcome of one entity's sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The call completed.
    Success,
    /// The call failed; the tag names the error category.
    Failed(FailureKind),
}

impl SyncOutcome {
    /// Returns true on success.
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Success)
    }
}

/// What happened remotely for a successful entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// POST created a new document.
    Created,
    /// PUT stored the document.
    Updated,
    /// The remote document already matched; no write issued.
    Unchanged,
    /// GET found the document.
    Found,
    /// GET found nothing.
    Absent,
}

/// Result for one input entity.
#[derive(Debug, Clone)]
pub struct EntitySyncResult {
    /// Stable host id of the entity.
    pub entity_id: String,
    /// Success or failure tag.
    pub outcome: SyncOutcome,
    /// Remote effect, for successful entities.
    pub action: Option<SyncAction>,
    /// Human-readable detail (error message on failure).
    pub detail: String,
    /// The document as returned by the server.
    pub remote: Option<TransferRecord>,
}

impl EntitySyncResult {
    fn success(entity_id: String, action: SyncAction, remote: Option<TransferRecord>) -> Self {
        let detail = match (&action, &remote) {
            (SyncAction::Created, Some(doc)) => format!("created as {}", doc.id),
            (SyncAction::Absent, _) => "no remote document".to_string(),
            (action, _) => format!("{action:?}").to_lowercase(),
        };
        Self {
            entity_id,
            outcome: SyncOutcome::Success,
            action: Some(action),
            detail,
            remote,
        }
    }

    fn failed(entity_id: String, error: &SyncError) -> Self {
        Self {
            entity_id,
            outcome: SyncOutcome::Failed(error.kind()),
            action: None,
            detail: error.to_string(),
            remote: None,
        }
    }

    /// Returns true on success.
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// The server-assigned id of a document this batch created.
    pub fn assigned_id(&self) -> Option<&str> {
        match (self.action, &self.remote) {
            (Some(SyncAction::Created), Some(remote)) => Some(remote.id.as_str()),
            _ => None,
        }
    }

    /// Host fields to write back from the remote document.
    pub fn patch(&self) -> Option<EntityPatch> {
        self.remote.as_ref().map(EntityPatch::from)
    }
}

/// Aggregate counts over a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Entities processed.
    pub total: usize,
    /// Successful entities.
    pub succeeded: usize,
    /// Failed entities, cancellations included.
    pub failed: usize,
    /// Cancelled entities.
    pub cancelled: usize,
    /// Documents created.
    pub created: usize,
    /// Documents written by PUT.
    pub updated: usize,
    /// Writes skipped because nothing changed.
    pub unchanged: usize,
    /// Documents found by GET.
    pub found: usize,
    /// Documents missing on GET.
    pub absent: usize,
}

impl SyncSummary {
    /// Tallies a result sequence.
    pub fn from_results(results: &[EntitySyncResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.outcome {
                SyncOutcome::Success => summary.succeeded += 1,
                SyncOutcome::Failed(kind) => {
                    summary.failed += 1;
                    if kind == FailureKind::Cancelled {
                        summary.cancelled += 1;
                    }
                }
            }
            match result.action {
                Some(SyncAction::Created) => summary.created += 1,
                Some(SyncAction::Updated) => summary.updated += 1,
                Some(SyncAction::Unchanged) => summary.unchanged += 1,
                Some(SyncAction::Found) => summary.found += 1,
                Some(SyncAction::Absent) => summary.absent += 1,
                None => {}
            }
        }
        summary
    }
}

/// Cumulative statistics over the orchestrator's lifetime.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Batches completed.
    pub batches_completed: u64,
    /// Entities that synced successfully.
    pub entities_succeeded: u64,
    /// Entities that failed.
    pub entities_failed: u64,
    /// Retries issued.
    pub retries: u64,
    /// Duration of the last batch.
    pub last_batch_duration: Option<Duration>,
    /// Last per-entity error message.
    pub last_error: Option<String>,
}

/// Synchronizes host entities with the remote document store.
///
/// Each entity is mapped and sent independently; one failure never aborts
/// the batch and there is no rollback across entities.
pub struct SyncOrchestrator<C: HttpClient> {
    config: SyncConfig,
    gateway: RestGateway<C>,
    mapper: RecordMapper,
    identity: ProjectIdentityCache,
    cancelled: AtomicBool,
    stats: RwLock<SyncStats>,
}

impl<C: HttpClient> SyncOrchestrator<C> {
    /// Creates an orchestrator over an existing gateway.
    pub fn new(config: SyncConfig, gateway: RestGateway<C>) -> Self {
        Self {
            mapper: RecordMapper::new(config.attribute.clone()),
            identity: ProjectIdentityCache::new(config.identity_scheme),
            config,
            gateway,
            cancelled: AtomicBool::new(false),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the gateway.
    pub fn gateway(&self) -> &RestGateway<C> {
        &self.gateway
    }

    /// Returns the session identity cache.
    pub fn identity(&self) -> &ProjectIdentityCache {
        &self.identity
    }

    /// Gets the cumulative stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Cancels queued and in-flight entities of any running batch.
    ///
    /// Stays in effect until [`reset_cancel`](Self::reset_cancel).
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Resets the cancelled flag.
    pub fn reset_cancel(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Returns true if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn check_cancelled(&self, deadline: Option<Instant>) -> SyncResult<()> {
        if self.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d) {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Synchronizes every entity and returns one result per entity, in
    /// input order.
    pub fn sync_entities<H>(
        &self,
        host: &H,
        entities: &[H::Entity],
        session: &SessionContext,
    ) -> Vec<EntitySyncResult>
    where
        H: EntityHost + ?Sized,
    {
        let start = Instant::now();
        let deadline = self.config.batch_deadline.map(|d| start + d);

        // Resolved before any entity call; read-only afterwards.
        let project_id = self.identity.resolve(session);

        let workers = self.config.max_workers.max(1).min(entities.len().max(1));
        debug!(
            entities = entities.len(),
            workers,
            project_id = %project_id,
            mode = ?self.config.mode,
            "starting batch"
        );

        let results: Vec<EntitySyncResult> = if workers == 1 {
            entities
                .iter()
                .map(|entity| self.sync_one(host, entity, &project_id, deadline))
                .collect()
        } else {
            let next = AtomicUsize::new(0);
            let slots: Vec<Mutex<Option<EntitySyncResult>>> =
                entities.iter().map(|_| Mutex::new(None)).collect();

            std::thread::scope(|scope| {
                for _ in 0..workers {
                    scope.spawn(|| loop {
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(entity) = entities.get(index) else {
                            break;
                        };
                        let result = self.sync_one(host, entity, &project_id, deadline);
                        *slots[index].lock() = Some(result);
                    });
                }
            });

            slots
                .into_iter()
                .zip(entities)
                .map(|(slot, entity)| {
                    slot.into_inner().unwrap_or_else(|| {
                        EntitySyncResult::failed(host.id_of(entity), &SyncError::Cancelled)
                    })
                })
                .collect()
        };

        let summary = SyncSummary::from_results(&results);
        let duration = start.elapsed();
        {
            let mut stats = self.stats.write();
            stats.batches_completed += 1;
            stats.entities_succeeded += summary.succeeded as u64;
            stats.entities_failed += summary.failed as u64;
            stats.last_batch_duration = Some(duration);
            if let Some(failure) = results.iter().rev().find(|r| !r.is_success()) {
                stats.last_error = Some(failure.detail.clone());
            }
        }

        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            elapsed_ms = duration.as_millis() as u64,
            "batch finished"
        );

        results
    }

    fn sync_one<H>(
        &self,
        host: &H,
        entity: &H::Entity,
        project_id: &ProjectId,
        deadline: Option<Instant>,
    ) -> EntitySyncResult
    where
        H: EntityHost + ?Sized,
    {
        let entity_id = host.id_of(entity);

        let exchanged = self
            .check_cancelled(deadline)
            .and_then(|()| match self.config.mode {
                // Reads only need the id; the local attribute may be unset.
                SyncMode::Query => {
                    self.with_retry(&entity_id, true, deadline, || self.query(&entity_id))
                }
                SyncMode::Upsert => {
                    let record = self.mapper.to_transfer_record(host, entity, project_id)?;
                    // A POST may have been applied before the failure surfaced.
                    let idempotent = !record.is_new();
                    self.with_retry(&entity_id, idempotent, deadline, || self.upsert(&record))
                }
            });

        // A call that returns after cancellation is never reported as a success.
        let exchanged = exchanged.and_then(|done| {
            self.check_cancelled(deadline)?;
            Ok(done)
        });

        match exchanged {
            Ok((action, remote)) => {
                debug!(entity = %entity_id, ?action, "entity synced");
                EntitySyncResult::success(entity_id, action, remote)
            }
            Err(error) => {
                warn!(entity = %entity_id, kind = %error.kind(), %error, "entity sync failed");
                EntitySyncResult::failed(entity_id, &error)
            }
        }
    }

    fn with_retry<T>(
        &self,
        entity_id: &str,
        idempotent: bool,
        deadline: Option<Instant>,
        mut op: impl FnMut() -> SyncResult<T>,
    ) -> SyncResult<T> {
        let retry = &self.config.retry;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if idempotent && e.is_retryable() && retry.allows_retry(attempts) => {
                    debug!(entity = %entity_id, attempts, error = %e, "retrying");
                    self.stats.write().retries += 1;
                    std::thread::sleep(retry.backoff(attempts, self.gateway.timeout()));
                    self.check_cancelled(deadline)?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn query(&self, entity_id: &str) -> SyncResult<Exchange> {
        if entity_id.is_empty() {
            return Err(SyncError::InvalidRequest(
                "entity has no id to query".into(),
            ));
        }
        let body = self
            .gateway
            .get_document(&self.config.collection, entity_id)?;
        Ok(match parse_document(&body)? {
            Some(remote) => (SyncAction::Found, Some(remote)),
            None => (SyncAction::Absent, None),
        })
    }

    fn upsert(&self, record: &TransferRecord) -> SyncResult<Exchange> {
        let collection = &self.config.collection;
        let json = record.to_json()?;

        if record.is_new() {
            let body = self.gateway.post_document(collection, &json)?;
            return Ok((SyncAction::Created, Some(parse_stored(&body)?)));
        }

        if self.config.verify_before_write {
            let body = self.gateway.get_document(collection, &record.id)?;
            if let Some(remote) = parse_document(&body)? {
                if remote.same_content(record) {
                    return Ok((SyncAction::Unchanged, Some(remote)));
                }
            }
        }
        let body = self.gateway.put_document(collection, &record.id, &json)?;
        Ok((SyncAction::Updated, Some(parse_stored(&body)?)))
    }
}

impl SyncOrchestrator<ReqwestClient> {
    /// Creates an orchestrator talking HTTP to the configured endpoint.
    ///
    /// Fails if the base URL is malformed.
    pub fn connect(config: SyncConfig, rest: &RestConfig) -> SyncResult<Self> {
        Ok(Self::new(config, RestGateway::connect(rest)?))
    }
}

/// Parses a GET body; empty or `null` means the document is absent.
fn parse_document(body: &str) -> SyncResult<Option<TransferRecord>> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    TransferRecord::from_json(trimmed)
        .map(Some)
        .map_err(|e| SyncError::ResponseFormat(e.to_string()))
}

/// Parses the stored document returned by PUT or POST.
fn parse_stored(body: &str) -> SyncResult<TransferRecord> {
    parse_document(body)?
        .ok_or_else(|| SyncError::ResponseFormat("empty response body".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpMethod, MemoryDocumentStore, MemoryFailure};
    use firerating_core::{derive_project_id, AttributeRef};
    use std::sync::Arc;

    struct Door {
        id: &'static str,
        rating: Option<f64>,
    }

    struct Host;

    impl EntityHost for Host {
        type Entity = Door;

        fn id_of(&self, entity: &Door) -> String {
            entity.id.to_string()
        }

        fn level_of(&self, _entity: &Door) -> String {
            "Level 1".to_string()
        }

        fn tag_of(&self, entity: &Door) -> Option<String> {
            Some(format!("T-{}", entity.id))
        }

        fn numeric_attribute_of(&self, entity: &Door, _attribute: &AttributeRef) -> Option<f64> {
            entity.rating
        }
    }

    fn session() -> SessionContext {
        SessionContext::new("WS-01", "C:/proj/model.ext")
    }

    fn door(id: &'static str, rating: f64) -> Door {
        Door {
            id,
            rating: Some(rating),
        }
    }

    fn unrated(id: &'static str) -> Door {
        Door { id, rating: None }
    }

    fn orchestrator(
        config: SyncConfig,
    ) -> (
        Arc<MemoryDocumentStore>,
        SyncOrchestrator<Arc<MemoryDocumentStore>>,
    ) {
        let rest = RestConfig::default();
        let store = Arc::new(MemoryDocumentStore::new("http://127.0.0.1:3001/api/v1"));
        let gateway = RestGateway::new(&rest, Arc::clone(&store)).unwrap();
        (store, SyncOrchestrator::new(config, gateway))
    }

    #[test]
    fn upsert_puts_by_id() {
        let (store, orch) = orchestrator(SyncConfig::new());
        let doors = [door("d1", 60.0)];

        let results = orch.sync_entities(&Host, &doors, &session());

        assert_eq!(results.len(), 1);
        assert!(results[0].is_success());
        assert_eq!(results[0].action, Some(SyncAction::Updated));
        let doc = store.document("doors", "d1").unwrap();
        assert_eq!(doc["firerating"], 60.0);
        assert_eq!(
            doc["project_id"],
            derive_project_id("WS-01", "C:/proj/model.ext").as_str()
        );
        assert_eq!(store.request_count(HttpMethod::Put), 1);
    }

    #[test]
    fn entity_without_id_is_posted() {
        let (store, orch) = orchestrator(SyncConfig::new());
        let doors = [door("", 30.0)];

        let results = orch.sync_entities(&Host, &doors, &session());

        assert_eq!(results[0].action, Some(SyncAction::Created));
        let assigned = results[0].assigned_id().unwrap();
        assert!(!assigned.is_empty());
        assert!(store.document("doors", assigned).is_some());
        assert_eq!(store.request_count(HttpMethod::Post), 1);
    }

    #[test]
    fn query_reports_found_and_absent() {
        let (store, orch) = orchestrator(SyncConfig::new().with_mode(SyncMode::Query));
        store.insert(
            "doors",
            "d1",
            serde_json::json!({
                "_id": "d1",
                "project_id": "p",
                "level": "L1",
                "tag": "X",
                "firerating": 45.0
            }),
        );
        let doors = [door("d1", 1.0), door("d2", 1.0)];

        let results = orch.sync_entities(&Host, &doors, &session());

        assert_eq!(results[0].action, Some(SyncAction::Found));
        let patch = results[0].patch().unwrap();
        assert_eq!(patch.tag, "X");
        assert_eq!(patch.firerating, 45.0);
        assert_eq!(results[1].action, Some(SyncAction::Absent));
        assert!(results[1].patch().is_none());
        assert_eq!(store.request_count(HttpMethod::Put), 0);
    }

    #[test]
    fn query_needs_only_the_entity_id() {
        let (store, orch) = orchestrator(SyncConfig::new().with_mode(SyncMode::Query));
        store.insert(
            "doors",
            "d3",
            serde_json::json!({
                "_id": "d3",
                "project_id": "p",
                "level": "L2",
                "tag": "D201",
                "firerating": 60.0
            }),
        );
        let doors = [unrated("d3"), unrated("")];

        let results = orch.sync_entities(&Host, &doors, &session());

        assert_eq!(results[0].action, Some(SyncAction::Found));
        assert_eq!(results[0].patch().unwrap().firerating, 60.0);
        assert_eq!(
            results[1].outcome,
            SyncOutcome::Failed(FailureKind::Rejected)
        );
        assert_eq!(store.request_count(HttpMethod::Get), 1);
    }

    #[test]
    fn posts_are_never_retried() {
        let config = SyncConfig::new().with_retry(
            crate::config::RetryConfig::attempts(3)
                .with_base_delay(Duration::from_millis(1))
                .without_jitter(),
        );
        let (store, orch) = orchestrator(config);
        store.fail_with("doors", MemoryFailure::Refused);

        let results = orch.sync_entities(&Host, &[door("", 1.0)], &session());

        assert_eq!(
            results[0].outcome,
            SyncOutcome::Failed(FailureKind::Transport)
        );
        assert_eq!(store.request_count(HttpMethod::Post), 1);
        assert_eq!(orch.stats().retries, 0);
    }

    #[test]
    fn malformed_response_fails_only_that_entity() {
        let (store, orch) = orchestrator(SyncConfig::new());
        store.fail_with("bad", MemoryFailure::Body("<html>oops</html>".into()));
        let doors = [door("ok", 1.0), door("bad", 1.0)];

        let results = orch.sync_entities(&Host, &doors, &session());

        assert!(results[0].is_success());
        assert_eq!(
            results[1].outcome,
            SyncOutcome::Failed(FailureKind::ResponseFormat)
        );
        assert_eq!(orch.stats().entities_failed, 1);
    }

    #[test]
    fn verify_before_write_skips_identical_documents() {
        let config = SyncConfig::new().with_verify_before_write(true);
        let (store, orch) = orchestrator(config);
        let doors = [door("d1", 90.0)];

        let first = orch.sync_entities(&Host, &doors, &session());
        assert_eq!(first[0].action, Some(SyncAction::Updated));

        let second = orch.sync_entities(&Host, &doors, &session());
        assert_eq!(second[0].action, Some(SyncAction::Unchanged));

        let methods: Vec<HttpMethod> = store.requests().iter().map(|r| r.method).collect();
        assert_eq!(
            methods,
            vec![HttpMethod::Get, HttpMethod::Put, HttpMethod::Get]
        );
    }

    #[test]
    fn retries_transient_failures_for_puts() {
        let config = SyncConfig::new().with_retry(
            crate::config::RetryConfig::attempts(3)
                .with_base_delay(Duration::from_millis(1))
                .without_jitter(),
        );
        let (store, orch) = orchestrator(config);
        store.fail_with("d1", MemoryFailure::Refused);
        let doors = [door("d1", 1.0)];

        let results = orch.sync_entities(&Host, &doors, &session());

        assert_eq!(
            results[0].outcome,
            SyncOutcome::Failed(FailureKind::Transport)
        );
        assert_eq!(store.request_count(HttpMethod::Put), 3);
        assert_eq!(orch.stats().retries, 2);
    }

    #[test]
    fn cancelled_batch_never_succeeds() {
        let (store, orch) = orchestrator(SyncConfig::new());
        orch.cancel();
        let doors = [door("d1", 1.0)];

        let results = orch.sync_entities(&Host, &doors, &session());
        assert_eq!(
            results[0].outcome,
            SyncOutcome::Failed(FailureKind::Cancelled)
        );
        assert!(store.requests().is_empty());

        orch.reset_cancel();
        let results = orch.sync_entities(&Host, &doors, &session());
        assert!(results[0].is_success());
    }

    #[test]
    fn summary_counts() {
        let (_store, orch) = orchestrator(SyncConfig::new());
        let doors = [
            door("d1", 1.0),
            door("", 2.0),
            unrated("d3"),
        ];
        let results = orch.sync_entities(&Host, &doors, &session());
        let summary = SyncSummary::from_results(&results);
        assert_eq!(
            summary,
            SyncSummary {
                total: 3,
                succeeded: 2,
                failed: 1,
                cancelled: 0,
                created: 1,
                updated: 1,
                unchanged: 0,
                found: 0,
                absent: 0,
            }
        );
    }
}
