//! Door export file acting as the authoring host.
//!
//! The file is a JSON array of doors:
//!
//! ```json
//! [
//!   {
//!     "unique_id": "60f91daf-3dd7-4283-a86d-24137b73f3da-0001fd0b",
//!     "level": "Level 1",
//!     "mark": "D101",
//!     "parameters": { "API FireRating": 90.0 }
//!   }
//! ]
//! ```

use firerating_core::{AttributeRef, CoreError, CoreResult, EntityHost, EntityPatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or writing a door file.
#[derive(Debug, Error)]
pub enum DoorFileError {
    /// I/O error.
    #[error("cannot access {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// The file is not a valid door list.
    #[error("invalid door file {path}: {source}")]
    Format {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// One exported door.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorEntry {
    /// Stable element id.
    pub unique_id: String,
    /// Level name.
    #[serde(default)]
    pub level: String,
    /// Mark parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark: Option<String>,
    /// Numeric parameters by name.
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

/// Doors loaded from an export file.
#[derive(Debug)]
pub struct DoorFile {
    path: PathBuf,
    doors: Vec<DoorEntry>,
}

impl DoorFile {
    /// Loads a door file.
    pub fn load(path: &Path) -> Result<Self, DoorFileError> {
        let text = fs::read_to_string(path).map_err(|source| DoorFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doors = serde_json::from_str(&text).map_err(|source| DoorFileError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            doors,
        })
    }

    /// Returns the doors in file order.
    pub fn doors(&self) -> &[DoorEntry] {
        &self.doors
    }

    /// Writes the doors back to the file they were loaded from.
    pub fn save(&self) -> Result<(), DoorFileError> {
        let text = serde_json::to_string_pretty(&self.doors).map_err(|source| {
            DoorFileError::Format {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, text).map_err(|source| DoorFileError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl EntityHost for DoorFile {
    type Entity = DoorEntry;

    fn id_of(&self, entity: &DoorEntry) -> String {
        entity.unique_id.clone()
    }

    fn level_of(&self, entity: &DoorEntry) -> String {
        entity.level.clone()
    }

    fn tag_of(&self, entity: &DoorEntry) -> Option<String> {
        entity.mark.clone()
    }

    fn numeric_attribute_of(&self, entity: &DoorEntry, attribute: &AttributeRef) -> Option<f64> {
        entity.parameters.get(attribute.name()).copied()
    }

    fn apply_patch(
        &mut self,
        entity_id: &str,
        attribute: &AttributeRef,
        patch: &EntityPatch,
    ) -> CoreResult<()> {
        let door = self
            .doors
            .iter_mut()
            .find(|d| d.unique_id == entity_id)
            .ok_or_else(|| CoreError::UnknownEntity(entity_id.to_string()))?;

        door.mark = (!patch.tag.is_empty()).then(|| patch.tag.clone());
        door.parameters
            .insert(attribute.name().to_string(), patch.firerating);
        Ok(())
    }

    fn assign_id(&mut self, position: usize, id: &str) -> CoreResult<()> {
        let door = self
            .doors
            .get_mut(position)
            .ok_or_else(|| CoreError::UnknownEntity(format!("door #{position}")))?;
        door.unique_id = id.to_string();
        Ok(())
    }
}
