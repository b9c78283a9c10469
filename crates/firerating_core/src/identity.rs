//! Project identity derivation.
//!
//! A project id is a one-way hash of the machine name and the model file
//! path, so the same authoring environment always addresses the same remote
//! document collection without asking the server first:
//!
//! 1. key = `machine_name + ":" + file_path`
//! 2. SHA-256 over the UTF-16LE bytes of the key
//! 3. standard padded Base64 of the 32-byte digest (44 characters)
//! 4. substitution of path-unsafe characters, per [`IdentityScheme`]

use crate::record::ProjectId;
use crate::session::SessionContext;
use firerating_codec::standard_encode;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Character substitution applied to the Base64 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityScheme {
    /// Replaces `/` with `_` and `+` with `-`.
    #[default]
    UrlSafe,
    /// Replaces `/` with `_` only.
    ///
    /// Matches identifiers already deployed by earlier add-in releases.
    Legacy,
}

/// Derives the project id with the default [`IdentityScheme::UrlSafe`].
#[must_use]
pub fn derive_project_id(machine_name: &str, file_path: &str) -> ProjectId {
    derive_project_id_with(IdentityScheme::default(), machine_name, file_path)
}

/// Derives the project id with an explicit substitution scheme.
///
/// An empty `file_path` (unsaved model) is valid input.
#[must_use]
pub fn derive_project_id_with(
    scheme: IdentityScheme,
    machine_name: &str,
    file_path: &str,
) -> ProjectId {
    let key = format!("{machine_name}:{file_path}");
    let bytes: Vec<u8> = key.encode_utf16().flat_map(u16::to_le_bytes).collect();
    let digest = Sha256::digest(&bytes);
    let encoded = standard_encode(&digest);

    let id = match scheme {
        IdentityScheme::UrlSafe => encoded.replace('/', "_").replace('+', "-"),
        IdentityScheme::Legacy => encoded.replace('/', "_"),
    };
    ProjectId::new(id)
}

#[derive(Debug)]
struct CachedIdentity {
    machine_name: String,
    file_path: String,
    project_id: ProjectId,
}

/// Session-scoped cache of the derived project id.
///
/// The id is computed on first use and reused until the session's machine
/// name or file path changes (for example after "Save As").
#[derive(Debug, Default)]
pub struct ProjectIdentityCache {
    scheme: IdentityScheme,
    cached: Mutex<Option<CachedIdentity>>,
}

impl ProjectIdentityCache {
    /// Creates an empty cache using the given scheme.
    pub fn new(scheme: IdentityScheme) -> Self {
        Self {
            scheme,
            cached: Mutex::new(None),
        }
    }

    /// Returns the scheme used for derivation.
    pub fn scheme(&self) -> IdentityScheme {
        self.scheme
    }

    /// Returns the project id for the session, deriving it if needed.
    pub fn resolve(&self, session: &SessionContext) -> ProjectId {
        let mut cached = self.cached.lock();
        if let Some(entry) = cached.as_ref() {
            if entry.machine_name == session.machine_name && entry.file_path == session.file_path
            {
                return entry.project_id.clone();
            }
        }

        let project_id =
            derive_project_id_with(self.scheme, &session.machine_name, &session.file_path);
        debug!(
            machine = %session.machine_name,
            path = %session.file_path,
            project_id = %project_id,
            "derived project identity"
        );
        *cached = Some(CachedIdentity {
            machine_name: session.machine_name.clone(),
            file_path: session.file_path.clone(),
            project_id: project_id.clone(),
        });
        project_id
    }

    /// Returns the cached id without deriving.
    pub fn current(&self) -> Option<ProjectId> {
        self.cached.lock().as_ref().map(|e| e.project_id.clone())
    }

    /// Drops the cached id.
    pub fn invalidate(&self) {
        *self.cached.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_vector_url_safe() {
        let id = derive_project_id("WS-01", "C:/proj/model.ext");
        assert_eq!(id.as_str(), "yjUAIL-ifLEaMvkyzWa8mCLop45a9IGYMlc--PxnkPg=");
        assert_eq!(id.as_str().len(), 44);
    }

    #[test]
    fn known_vector_legacy() {
        let id = derive_project_id_with(IdentityScheme::Legacy, "WS-01", "C:/proj/model.ext");
        assert_eq!(id.as_str(), "yjUAIL+ifLEaMvkyzWa8mCLop45a9IGYMlc++PxnkPg=");

        let id = derive_project_id_with(IdentityScheme::Legacy, "WS-01", "C:/proj/model1.ext");
        assert_eq!(id.as_str(), "SY5X9T76iijgoWo_O6w9NX19UnJBRyebBigRd8GjT+U=");
    }

    #[test]
    fn url_safe_replaces_both_characters() {
        let id = derive_project_id("WS-01", "C:/proj/model1.ext");
        assert_eq!(id.as_str(), "SY5X9T76iijgoWo_O6w9NX19UnJBRyebBigRd8GjT-U=");
    }

    #[test]
    fn empty_path_is_valid() {
        let id = derive_project_id("WS-01", "");
        assert_eq!(id.as_str(), "U3VouUr79h46s1H8laaSI0hq-MaTxZqo3Q6uz24vcuE=");
    }

    #[test]
    fn differing_machine_changes_id() {
        assert_ne!(
            derive_project_id("WS-01", "C:/proj/model.ext"),
            derive_project_id("WS-02", "C:/proj/model.ext")
        );
    }

    #[test]
    fn cache_reuses_until_path_changes() {
        let cache = ProjectIdentityCache::new(IdentityScheme::UrlSafe);
        assert!(cache.current().is_none());

        let session = SessionContext::new("WS-01", "C:/proj/model.ext");
        let first = cache.resolve(&session);
        assert_eq!(cache.current(), Some(first.clone()));
        assert_eq!(cache.resolve(&session), first);

        let moved = SessionContext::new("WS-01", "C:/proj/renamed.ext");
        let second = cache.resolve(&moved);
        assert_ne!(first, second);
        assert_eq!(second, derive_project_id("WS-01", "C:/proj/renamed.ext"));

        cache.invalidate();
        assert!(cache.current().is_none());
    }

    proptest! {
        #[test]
        fn deterministic_and_path_safe(machine in ".{0,24}", path in ".{0,64}") {
            let a = derive_project_id(&machine, &path);
            let b = derive_project_id(&machine, &path);
            prop_assert_eq!(&a, &b);
            prop_assert!(!a.as_str().contains('/'));
            prop_assert!(!a.as_str().contains('+'));

            let legacy = derive_project_id_with(IdentityScheme::Legacy, &machine, &path);
            prop_assert!(!legacy.as_str().contains('/'));
        }
    }
}
