//! CLI command implementations.

pub mod codec;
pub mod project_id;
pub mod pull;
pub mod sync;

use firerating_core::ProjectId;
use firerating_sync_engine::{EntitySyncResult, SyncOutcome, SyncSummary};
use serde::Serialize;

/// Per-door line of a batch report.
#[derive(Debug, Serialize)]
pub struct EntityReport {
    /// Door id.
    pub entity_id: String,
    /// `Success` or the failure category.
    pub outcome: String,
    /// Remote effect, for successful doors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Result detail.
    pub detail: String,
}

/// Result of a sync or pull batch.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    /// Project id the batch ran under.
    pub project_id: String,
    /// Doors processed.
    pub total: usize,
    /// Successful doors.
    pub succeeded: usize,
    /// Failed doors.
    pub failed: usize,
    /// Cancelled doors.
    pub cancelled: usize,
    /// Doors updated in the door file: patches on pull, assigned ids on sync.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_back: Option<usize>,
    /// Per-door results in input order.
    pub entities: Vec<EntityReport>,
}

impl BatchReport {
    /// Builds a report from orchestrator results.
    pub fn new(project_id: &ProjectId, results: &[EntitySyncResult]) -> Self {
        let summary = SyncSummary::from_results(results);
        let entities = results
            .iter()
            .map(|r| EntityReport {
                entity_id: r.entity_id.clone(),
                outcome: match r.outcome {
                    SyncOutcome::Success => "Success".to_string(),
                    SyncOutcome::Failed(kind) => kind.to_string(),
                },
                action: r.action.map(|a| format!("{a:?}").to_lowercase()),
                detail: r.detail.clone(),
            })
            .collect();

        Self {
            project_id: project_id.to_string(),
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            cancelled: summary.cancelled,
            written_back: None,
            entities,
        }
    }

    /// Prints the report as `text` or `json`.
    pub fn print(&self, format: &str) -> Result<(), Box<dyn std::error::Error>> {
        match format {
            "json" => println!("{}", serde_json::to_string_pretty(self)?),
            "text" => {
                println!("Project: {}", self.project_id);
                for entity in &self.entities {
                    println!(
                        "  {:<40} {:<24} {}",
                        entity.entity_id, entity.outcome, entity.detail
                    );
                }
                println!(
                    "Total: {}  succeeded: {}  failed: {}  cancelled: {}",
                    self.total, self.succeeded, self.failed, self.cancelled
                );
                if let Some(written) = self.written_back {
                    println!("Written back: {written}");
                }
            }
            other => return Err(format!("unknown output format: {other}").into()),
        }
        Ok(())
    }

    /// Fails if any door failed.
    pub fn check(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.failed > 0 {
            let message = format!("{} of {} doors failed", self.failed, self.total);
            return Err(message.into());
        }
        Ok(())
    }
}
