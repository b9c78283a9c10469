//! Pull command implementation.

use super::BatchReport;
use crate::host::DoorFile;
use firerating_core::{CoreResult, EntityHost, SessionContext};
use firerating_sync_engine::{HttpClient, RestConfig, SyncConfig, SyncMode, SyncOrchestrator};
use std::path::Path;
use tracing::info;

/// Runs the pull command.
pub fn run(
    doors: &Path,
    session: &SessionContext,
    rest: &RestConfig,
    config: SyncConfig,
    write: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = DoorFile::load(doors)?;
    let orchestrator = SyncOrchestrator::connect(config.with_mode(SyncMode::Query), rest)?;

    let report = execute(&orchestrator, &mut file, session, write)?;
    if write {
        file.save()?;
        info!(path = %doors.display(), "door file updated");
    }
    report.print(format)?;
    report.check()
}

/// Fetches every door's remote document and optionally applies it locally.
///
/// Only doors with a remote document are patched; the caller saves the file.
pub fn execute<C: HttpClient>(
    orchestrator: &SyncOrchestrator<C>,
    file: &mut DoorFile,
    session: &SessionContext,
    write: bool,
) -> CoreResult<BatchReport> {
    let results = orchestrator.sync_entities(&*file, file.doors(), session);
    let project_id = orchestrator.identity().resolve(session);
    let mut report = BatchReport::new(&project_id, &results);

    if write {
        let attribute = orchestrator.config().attribute.clone();
        let mut written = 0;
        for result in &results {
            if let Some(patch) = result.patch() {
                file.apply_patch(&result.entity_id, &attribute, &patch)?;
                written += 1;
            }
        }
        report.written_back = Some(written);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{door_file, orchestrator, session};
    use firerating_sync_engine::HttpMethod;
    use serde_json::json;

    #[test]
    fn writes_remote_values_back() {
        let dir = tempfile::tempdir().unwrap();
        let (path, mut file) = door_file(&dir);
        let (store, orch) = orchestrator(SyncConfig::new().with_mode(SyncMode::Query));
        store.insert(
            "doors",
            "d1",
            json!({
                "_id": "d1",
                "project_id": "p",
                "level": "Level 1",
                "tag": "D101-A",
                "firerating": 120.0
            }),
        );

        let report = execute(&orch, &mut file, &session(), true).unwrap();
        file.save().unwrap();

        assert_eq!(report.written_back, Some(1));
        assert_eq!(report.entities[0].action.as_deref(), Some("found"));
        assert_eq!(report.entities[1].action.as_deref(), Some("absent"));

        let reloaded = DoorFile::load(&path).unwrap();
        let d1 = &reloaded.doors()[0];
        assert_eq!(d1.mark.as_deref(), Some("D101-A"));
        assert_eq!(d1.parameters["API FireRating"], 120.0);
        let d2 = &reloaded.doors()[1];
        assert_eq!(d2.parameters["API FireRating"], 60.0);
    }

    #[test]
    fn fills_doors_without_a_local_rating() {
        let dir = tempfile::tempdir().unwrap();
        let (path, mut file) = door_file(&dir);
        let (store, orch) = orchestrator(SyncConfig::new().with_mode(SyncMode::Query));
        store.insert(
            "doors",
            "d3",
            json!({
                "_id": "d3",
                "project_id": "p",
                "level": "Level 2",
                "tag": "D201",
                "firerating": 45.0
            }),
        );

        let report = execute(&orch, &mut file, &session(), true).unwrap();
        file.save().unwrap();

        assert_eq!(report.failed, 0);
        assert_eq!(report.entities[2].action.as_deref(), Some("found"));
        assert_eq!(store.request_count(HttpMethod::Get), 3);

        let reloaded = DoorFile::load(&path).unwrap();
        assert_eq!(reloaded.doors()[2].parameters["API FireRating"], 45.0);
    }

    #[test]
    fn without_write_the_file_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (_path, mut file) = door_file(&dir);
        let (store, orch) = orchestrator(SyncConfig::new().with_mode(SyncMode::Query));
        store.insert(
            "doors",
            "d2",
            json!({
                "_id": "d2",
                "project_id": "p",
                "level": "Level 1",
                "tag": "X",
                "firerating": 30.0
            }),
        );

        let report = execute(&orch, &mut file, &session(), false).unwrap();

        assert_eq!(report.written_back, None);
        assert_eq!(file.doors()[1].mark.as_deref(), Some("D102"));
    }
}
