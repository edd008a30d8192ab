use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use registry_types::{BaseIdentifier, Channel, Identifier, RegistryContext};
use thiserror::Error;

use crate::records::{BaseEntity, ChannelAcl, Entity, Resource, UploadRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("metadata store unavailable: {0}")]
    Unavailable(String),
}

/// The record store described in SPEC_FULL.md §4.2: indexed lookup, ordered
/// range queries, atomic conditional update, bulk fetch, and
/// unique-constraint enforcement, over the six collections named in §6's
/// persisted state layout.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    // -- entities ---------------------------------------------------------

    /// Fails `DuplicateKey` if an entity with this identifier already
    /// exists.
    async fn insert_entity(&self, ctx: &RegistryContext, entity: Entity) -> Result<(), StoreError>;

    async fn get_entity(
        &self,
        ctx: &RegistryContext,
        id: &Identifier,
    ) -> Result<Option<Entity>, StoreError>;

    /// All revisions of `base`, ordered by revision descending.
    async fn list_entities_by_base(
        &self,
        ctx: &RegistryContext,
        base: &BaseIdentifier,
    ) -> Result<Vec<Entity>, StoreError>;

    /// All promulgated entities sharing `name` across owners, ordered by
    /// promulgated-revision descending.
    async fn list_entities_by_promulgated_name(
        &self,
        ctx: &RegistryContext,
        name: &str,
    ) -> Result<Vec<Entity>, StoreError>;

    async fn bulk_get_entities(
        &self,
        ctx: &RegistryContext,
        ids: &[Identifier],
    ) -> Result<Vec<Option<Entity>>, StoreError>;

    /// Fails `NotFound` if no such entity exists.
    async fn delete_entity(&self, ctx: &RegistryContext, id: &Identifier) -> Result<(), StoreError>;

    // -- base entities ------------------------------------------------------

    async fn get_base_entity(
        &self,
        ctx: &RegistryContext,
        base: &BaseIdentifier,
    ) -> Result<Option<BaseEntity>, StoreError>;

    async fn get_or_create_base_entity(
        &self,
        ctx: &RegistryContext,
        base: &BaseIdentifier,
    ) -> Result<BaseEntity, StoreError>;

    async fn set_can_ingest(
        &self,
        ctx: &RegistryContext,
        base: &BaseIdentifier,
        can_ingest: bool,
    ) -> Result<(), StoreError>;

    async fn set_acl(
        &self,
        ctx: &RegistryContext,
        base: &BaseIdentifier,
        channel: Channel,
        acl: ChannelAcl,
    ) -> Result<(), StoreError>;

    /// No-op if the base entity still has any entity revisions.
    async fn delete_base_entity_if_empty(
        &self,
        ctx: &RegistryContext,
        base: &BaseIdentifier,
    ) -> Result<(), StoreError>;

    // -- publication (atomic across base-entity, entity, resource-pin) ----

    /// Sets `base-entity.published[channel] := resolved_id`, records the
    /// pin, and adds `channel` to the entity's channel-set, as one atomic
    /// write (SPEC_FULL.md §4.5 step 3).
    async fn publish(
        &self,
        ctx: &RegistryContext,
        resolved_id: &Identifier,
        channel: Channel,
        pins: BTreeMap<String, i64>,
    ) -> Result<(), StoreError>;

    async fn get_resource_pin(
        &self,
        ctx: &RegistryContext,
        resolved_id: &Identifier,
        channel: Channel,
    ) -> Result<Option<BTreeMap<String, i64>>, StoreError>;

    // -- resources ----------------------------------------------------------

    /// Fails `DuplicateKey` if `(base, name, revision)` already exists.
    async fn insert_resource(&self, ctx: &RegistryContext, resource: Resource) -> Result<(), StoreError>;

    async fn list_resource_revisions(
        &self,
        ctx: &RegistryContext,
        base: &BaseIdentifier,
        name: &str,
    ) -> Result<Vec<Resource>, StoreError>;

    async fn get_resource(
        &self,
        ctx: &RegistryContext,
        base: &BaseIdentifier,
        name: &str,
        revision: i64,
    ) -> Result<Option<Resource>, StoreError>;

    // -- uploads --------------------------------------------------------------

    async fn upsert_upload_record(
        &self,
        ctx: &RegistryContext,
        record: UploadRecord,
    ) -> Result<(), StoreError>;

    async fn get_upload_record(
        &self,
        ctx: &RegistryContext,
        upload_id: &str,
    ) -> Result<Option<UploadRecord>, StoreError>;

    async fn delete_upload_record(&self, ctx: &RegistryContext, upload_id: &str) -> Result<(), StoreError>;

    // -- migrations -----------------------------------------------------------

    async fn mark_migration_applied(&self, ctx: &RegistryContext, name: &str) -> Result<(), StoreError>;

    async fn is_migration_applied(&self, ctx: &RegistryContext, name: &str) -> Result<bool, StoreError>;

    // -- GC support -----------------------------------------------------------

    /// Every blob-name reachable from a live entity, resource, or
    /// non-finalized upload record; the reference side of the GC
    /// intersection (SPEC_FULL.md §4.1).
    async fn referenced_blob_names(&self, ctx: &RegistryContext) -> Result<HashSet<String>, StoreError>;
}
