//! Sync command implementation.

use super::BatchReport;
use crate::host::DoorFile;
use firerating_core::{CoreResult, EntityHost, SessionContext};
use firerating_sync_engine::{HttpClient, RestConfig, SyncConfig, SyncOrchestrator};
use std::path::Path;
use tracing::info;

/// Runs the sync command.
pub fn run(
    doors: &Path,
    session: &SessionContext,
    rest: &RestConfig,
    config: SyncConfig,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = DoorFile::load(doors)?;
    let orchestrator = SyncOrchestrator::connect(config, rest)?;

    let report = execute(&orchestrator, &mut file, session)?;
    if report.written_back.is_some() {
        file.save()?;
        info!(path = %doors.display(), "assigned ids saved");
    }
    report.print(format)?;
    report.check()
}

/// Upserts every door in the file.
///
/// Ids assigned by the server to new doors are stored on the file so the
/// next run updates those documents instead of creating them again; the
/// caller saves the file.
pub fn execute<C: HttpClient>(
    orchestrator: &SyncOrchestrator<C>,
    file: &mut DoorFile,
    session: &SessionContext,
) -> CoreResult<BatchReport> {
    let results = orchestrator.sync_entities(&*file, file.doors(), session);
    let project_id = orchestrator.identity().resolve(session);
    let mut report = BatchReport::new(&project_id, &results);

    let mut assigned = 0;
    for (position, result) in results.iter().enumerate() {
        if let Some(id) = result.assigned_id() {
            file.assign_id(position, id)?;
            assigned += 1;
        }
    }
    report.written_back = (assigned > 0).then_some(assigned);
    Ok(report)
}
