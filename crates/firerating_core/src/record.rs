//! Transfer records and write-back patches.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of the remote project a door belongs to.
///
/// Always derived from the authoring session, never read back from the
/// server as authoritative state.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Wraps an already derived identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectId({})", self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The JSON document exchanged with the remote store for one door.
///
/// Wire shape:
/// `{"_id": string, "project_id": string, "level": string, "tag": string, "firerating": number}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Stable host id; empty until the document exists remotely.
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Owning project.
    pub project_id: String,
    /// Display-only grouping label.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub level: String,
    /// User-assigned mark, possibly empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tag: String,
    /// The synchronized fire rating.
    pub firerating: f64,
}

impl TransferRecord {
    /// Returns true if the server has not assigned an id yet.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }

    /// Serializes the record as a JSON request body.
    ///
    /// Non-finite ratings are rejected here: JSON has no encoding for them.
    pub fn to_json(&self) -> CoreResult<String> {
        if !self.firerating.is_finite() {
            return Err(CoreError::NonFiniteValue {
                entity_id: self.id.clone(),
                value: self.firerating,
            });
        }
        serde_json::to_string(self)
            .map_err(|e| CoreError::invalid_document(e.to_string()))
    }

    /// Parses a response body into a record.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::invalid_document(e.to_string()))
    }

    /// Returns true if `other` carries the same synchronized state.
    ///
    /// `level` is display-only but still compared, since a moved door should
    /// be rewritten.
    #[must_use]
    pub fn same_content(&self, other: &TransferRecord) -> bool {
        self.project_id == other.project_id
            && self.level == other.level
            && self.tag == other.tag
            && self.firerating.to_bits() == other.firerating.to_bits()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// Host fields to write back after reading a remote document.
///
/// Only domain fields travel back; `_id`, `project_id` and `level` are
/// owned by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityPatch {
    /// New mark value.
    pub tag: String,
    /// New fire rating.
    pub firerating: f64,
}

impl From<&TransferRecord> for EntityPatch {
    fn from(record: &TransferRecord) -> Self {
        Self {
            tag: record.tag.clone(),
            firerating: record.firerating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door(id: &str) -> TransferRecord {
        TransferRecord {
            id: id.into(),
            project_id: "yjUAIL-ifLEaMvkyzWa8mCLop45a9IGYMlc--PxnkPg=".into(),
            level: "Level 1".into(),
            tag: "D101".into(),
            firerating: 90.0,
        }
    }

    #[test]
    fn wire_shape_uses_underscore_id() {
        let json = door("abc").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["_id"], "abc");
        assert_eq!(value["tag"], "D101");
        assert_eq!(value["firerating"], 90.0);
        assert!(value.get("id").is_none());
    }

    #[test]
    fn new_record_omits_id() {
        let json = door("").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("_id").is_none());
        assert_eq!(value["project_id"], door("").project_id.as_str());
    }

    #[test]
    fn non_finite_rating_rejected() {
        let mut record = door("abc");
        record.firerating = f64::NAN;
        assert!(matches!(
            record.to_json(),
            Err(CoreError::NonFiniteValue { .. })
        ));
        record.firerating = f64::INFINITY;
        assert!(record.to_json().is_err());
    }

    #[test]
    fn rating_survives_json_exactly() {
        let mut record = door("abc");
        record.firerating = 0.1 + 0.2;
        let json = record.to_json().unwrap();
        let back = TransferRecord::from_json(&json).unwrap();
        assert_eq!(back.firerating.to_bits(), record.firerating.to_bits());
    }

    #[test]
    fn parses_server_document_with_extra_fields() {
        let json = r#"{"_id":"abc","project_id":"p","level":"L1","tag":null,"firerating":45,"__v":0}"#;
        let record = TransferRecord::from_json(json).unwrap();
        assert_eq!(record.id, "abc");
        assert_eq!(record.tag, "");
        assert_eq!(record.firerating, 45.0);
    }

    #[test]
    fn rejects_schema_mismatch() {
        let partial = r#"{"_id":"abc","tag":"D1"}"#;
        let err = TransferRecord::from_json(partial).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDocument { .. }));
        assert!(TransferRecord::from_json("<html>").is_err());
    }

    #[test]
    fn patch_carries_domain_fields_only() {
        let patch = EntityPatch::from(&door("abc"));
        assert_eq!(
            patch,
            EntityPatch {
                tag: "D101".into(),
                firerating: 90.0
            }
        );
    }

    #[test]
    fn same_content_ignores_id() {
        let a = door("abc");
        let b = door("");
        assert!(a.same_content(&b));
        let mut c = door("abc");
        c.firerating = 60.0;
        assert!(!a.same_content(&c));
    }
}
