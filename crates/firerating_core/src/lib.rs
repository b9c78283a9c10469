//! # FireRating Core
//!
//! Identity resolution and record mapping for door fire rating sync.
//!
//! This crate provides:
//! - Deterministic project identity derivation (SHA-256 + URL-safe Base64)
//! - A session-scoped identity cache
//! - The `TransferRecord` wire document and `EntityPatch` write-back
//! - The `EntityHost` capability trait implemented by host adapters
//! - `RecordMapper` between host entities and transfer records
//!
//! ## Key Invariants
//!
//! - Identical session inputs always yield the identical project id
//! - Project ids never contain `/`
//! - A record's `_id` is assigned once and never rewritten
//! - Only `tag` and `firerating` are ever written back to the host
//!
//! This is a pure crate with no network I/O.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod identity;
mod mapper;
mod record;
mod session;

pub use error::{CoreError, CoreResult};
pub use identity::{
    derive_project_id, derive_project_id_with, IdentityScheme, ProjectIdentityCache,
};
pub use mapper::{EntityHost, RecordMapper};
pub use record::{EntityPatch, ProjectId, TransferRecord};
pub use session::{AttributeRef, SessionContext, FIRE_RATING_GROUP, FIRE_RATING_NAME};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
