//! Project id command implementation.

use firerating_core::{derive_project_id_with, IdentityScheme, ProjectId, SessionContext};

/// Runs the project-id command.
pub fn run(session: &SessionContext, scheme: IdentityScheme) {
    println!("{}", execute(session, scheme));
}

/// Derives the project id for a session.
pub fn execute(session: &SessionContext, scheme: IdentityScheme) -> ProjectId {
    derive_project_id_with(scheme, &session.machine_name, &session.file_path)
}
