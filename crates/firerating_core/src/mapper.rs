//! Mapping between host entities and transfer records.

use crate::error::{CoreError, CoreResult};
use crate::record::{EntityPatch, ProjectId, TransferRecord};
use crate::session::AttributeRef;

/// Capabilities the authoring host exposes for its door entities.
///
/// The core never touches a host SDK directly; an adapter implements this
/// trait for whatever element type the host uses.
pub trait EntityHost: Sync {
    /// The host's entity type.
    type Entity: Sync;

    /// Returns the stable, never reused id of the entity.
    fn id_of(&self, entity: &Self::Entity) -> String;

    /// Returns the grouping label (for example the level name).
    fn level_of(&self, entity: &Self::Entity) -> String;

    /// Returns the user-assigned mark, if any.
    fn tag_of(&self, entity: &Self::Entity) -> Option<String>;

    /// Resolves a numeric attribute on the entity.
    fn numeric_attribute_of(&self, entity: &Self::Entity, attribute: &AttributeRef)
        -> Option<f64>;

    /// Writes a patch back onto the entity with the given id.
    fn apply_patch(
        &mut self,
        entity_id: &str,
        attribute: &AttributeRef,
        patch: &EntityPatch,
    ) -> CoreResult<()> {
        let _ = (entity_id, attribute, patch);
        Err(CoreError::PatchUnsupported)
    }

    /// Stores the id the server assigned to a newly created entity.
    ///
    /// `position` is the entity's index in the batch that was synced.
    fn assign_id(&mut self, position: usize, id: &str) -> CoreResult<()> {
        let _ = (position, id);
        Err(CoreError::PatchUnsupported)
    }
}

/// Converts host entities to transfer records and back.
#[derive(Debug, Clone, Default)]
pub struct RecordMapper {
    attribute: AttributeRef,
}

impl RecordMapper {
    /// Creates a mapper reading the given attribute.
    pub fn new(attribute: AttributeRef) -> Self {
        Self { attribute }
    }

    /// Returns the attribute this mapper reads.
    pub fn attribute(&self) -> &AttributeRef {
        &self.attribute
    }

    /// Builds the transfer record for one entity.
    pub fn to_transfer_record<H: EntityHost + ?Sized>(
        &self,
        host: &H,
        entity: &H::Entity,
        project_id: &ProjectId,
    ) -> CoreResult<TransferRecord> {
        let id = host.id_of(entity);

        let firerating = host
            .numeric_attribute_of(entity, &self.attribute)
            .ok_or_else(|| CoreError::AttributeMissing {
                entity_id: id.clone(),
                attribute: self.attribute.to_string(),
            })?;

        if !firerating.is_finite() {
            return Err(CoreError::NonFiniteValue {
                entity_id: id,
                value: firerating,
            });
        }

        Ok(TransferRecord {
            id,
            project_id: project_id.as_str().to_string(),
            level: host.level_of(entity),
            tag: host.tag_of(entity).unwrap_or_default(),
            firerating,
        })
    }

    /// Describes which host fields a remote record would change.
    pub fn from_transfer_record(&self, record: &TransferRecord) -> EntityPatch {
        EntityPatch::from(record)
    }
}
