use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use registry_types::{BaseIdentifier, Channel, Identifier, RegistryContext};
use parking_lot::RwLock;

use crate::records::{BaseEntity, ChannelAcl, Entity, Resource, ResourcePin, UploadRecord};
use crate::store::{MetadataStore, StoreError};

#[derive(Default)]
struct Tables {
    entities: HashMap<Identifier, Entity>,
    base_entities: HashMap<BaseIdentifier, BaseEntity>,
    resources: HashMap<(BaseIdentifier, String, i64), Resource>,
    resource_pins: HashMap<(Identifier, Channel), ResourcePin>,
    uploads: HashMap<String, UploadRecord>,
    migrations: HashSet<String>,
}

/// Reference `MetadataStore`: one `RwLock` guarding every collection, the
/// same lock-plus-owned-record-map shape the teacher's in-memory test
/// doubles use. A SQL-backed implementation of the same trait is a drop-in
/// replacement for any caller.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    tables: RwLock<Tables>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        InMemoryMetadataStore::default()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn insert_entity(&self, ctx: &RegistryContext, entity: Entity) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if tables.entities.contains_key(&entity.identifier) {
            return Err(StoreError::DuplicateKey(entity.identifier.to_string()));
        }
        slog::debug!(ctx.logger(), "inserted entity"; "identifier" => %entity.identifier);
        tables.entities.insert(entity.identifier.clone(), entity);
        Ok(())
    }

    async fn get_entity(
        &self,
        _ctx: &RegistryContext,
        id: &Identifier,
    ) -> Result<Option<Entity>, StoreError> {
        Ok(self.tables.read().entities.get(id).cloned())
    }

    async fn list_entities_by_base(
        &self,
        _ctx: &RegistryContext,
        base: &BaseIdentifier,
    ) -> Result<Vec<Entity>, StoreError> {
        let tables = self.tables.read();
        let mut entities: Vec<Entity> = tables
            .entities
            .values()
            .filter(|e| &e.base == base)
            .cloned()
            .collect();
        entities.sort_by(|a, b| b.revision().cmp(&a.revision()));
        Ok(entities)
    }

    async fn list_entities_by_promulgated_name(
        &self,
        _ctx: &RegistryContext,
        name: &str,
    ) -> Result<Vec<Entity>, StoreError> {
        let tables = self.tables.read();
        let mut entities: Vec<Entity> = tables
            .entities
            .values()
            .filter(|e| e.base.name == name && e.promulgated_revision >= 0)
            .cloned()
            .collect();
        entities.sort_by(|a, b| b.promulgated_revision.cmp(&a.promulgated_revision));
        Ok(entities)
    }

    async fn bulk_get_entities(
        &self,
        _ctx: &RegistryContext,
        ids: &[Identifier],
    ) -> Result<Vec<Option<Entity>>, StoreError> {
        let tables = self.tables.read();
        Ok(ids.iter().map(|id| tables.entities.get(id).cloned()).collect())
    }

    async fn delete_entity(&self, _ctx: &RegistryContext, id: &Identifier) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        tables
            .entities
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(())
    }

    async fn get_base_entity(
        &self,
        _ctx: &RegistryContext,
        base: &BaseIdentifier,
    ) -> Result<Option<BaseEntity>, StoreError> {
        Ok(self.tables.read().base_entities.get(base).cloned())
    }

    async fn get_or_create_base_entity(
        &self,
        _ctx: &RegistryContext,
        base: &BaseIdentifier,
    ) -> Result<BaseEntity, StoreError> {
        let mut tables = self.tables.write();
        let entry = tables
            .base_entities
            .entry(base.clone())
            .or_insert_with(|| BaseEntity::new(base.clone()));
        Ok(entry.clone())
    }

    async fn set_can_ingest(
        &self,
        _ctx: &RegistryContext,
        base: &BaseIdentifier,
        can_ingest: bool,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let entry = tables
            .base_entities
            .get_mut(base)
            .ok_or_else(|| StoreError::NotFound(base.to_string()))?;
        entry.can_ingest = can_ingest;
        Ok(())
    }

    async fn set_acl(
        &self,
        _ctx: &RegistryContext,
        base: &BaseIdentifier,
        channel: Channel,
        acl: ChannelAcl,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let entry = tables
            .base_entities
            .entry(base.clone())
            .or_insert_with(|| BaseEntity::new(base.clone()));
        entry.acls.insert(channel, acl);
        Ok(())
    }

    async fn delete_base_entity_if_empty(
        &self,
        _ctx: &RegistryContext,
        base: &BaseIdentifier,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let has_revisions = tables.entities.values().any(|e| &e.base == base);
        if !has_revisions {
            tables.base_entities.remove(base);
        }
        Ok(())
    }

    async fn publish(
        &self,
        ctx: &RegistryContext,
        resolved_id: &Identifier,
        channel: Channel,
        pins: BTreeMap<String, i64>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if !tables.entities.contains_key(resolved_id) {
            return Err(StoreError::NotFound(resolved_id.to_string()));
        }
        let base = resolved_id.base();

        let base_entity = tables
            .base_entities
            .entry(base)
            .or_insert_with(|| BaseEntity::new(resolved_id.base()));
        base_entity.published.insert(channel, resolved_id.clone());

        tables.resource_pins.insert(
            (resolved_id.clone(), channel),
            ResourcePin {
                entity: resolved_id.clone(),
                channel,
                pins,
            },
        );

        let entity = tables
            .entities
            .get_mut(resolved_id)
            .expect("checked contains_key above");
        if !entity.channels.contains(&channel) {
            entity.channels.push(channel);
        }
        slog::info!(ctx.logger(), "published entity"; "identifier" => %resolved_id, "channel" => %channel);
        Ok(())
    }

    async fn get_resource_pin(
        &self,
        _ctx: &RegistryContext,
        resolved_id: &Identifier,
        channel: Channel,
    ) -> Result<Option<BTreeMap<String, i64>>, StoreError> {
        Ok(self
            .tables
            .read()
            .resource_pins
            .get(&(resolved_id.clone(), channel))
            .map(|pin| pin.pins.clone()))
    }

    async fn insert_resource(&self, _ctx: &RegistryContext, resource: Resource) -> Result<(), StoreError> {
        let key = (resource.base.clone(), resource.name.clone(), resource.revision);
        let mut tables = self.tables.write();
        if tables.resources.contains_key(&key) {
            return Err(StoreError::DuplicateKey(format!(
                "{}:{}@{}",
                resource.base, resource.name, resource.revision
            )));
        }
        tables.resources.insert(key, resource);
        Ok(())
    }

    async fn list_resource_revisions(
        &self,
        _ctx: &RegistryContext,
        base: &BaseIdentifier,
        name: &str,
    ) -> Result<Vec<Resource>, StoreError> {
        let tables = self.tables.read();
        let mut resources: Vec<Resource> = tables
            .resources
            .values()
            .filter(|r| &r.base == base && r.name == name)
            .cloned()
            .collect();
        resources.sort_by_key(|r| r.revision);
        Ok(resources)
    }

    async fn get_resource(
        &self,
        _ctx: &RegistryContext,
        base: &BaseIdentifier,
        name: &str,
        revision: i64,
    ) -> Result<Option<Resource>, StoreError> {
        Ok(self
            .tables
            .read()
            .resources
            .get(&(base.clone(), name.to_string(), revision))
            .cloned())
    }

    async fn upsert_upload_record(
        &self,
        _ctx: &RegistryContext,
        record: UploadRecord,
    ) -> Result<(), StoreError> {
        self.tables.write().uploads.insert(record.upload_id.clone(), record);
        Ok(())
    }

    async fn get_upload_record(
        &self,
        _ctx: &RegistryContext,
        upload_id: &str,
    ) -> Result<Option<UploadRecord>, StoreError> {
        Ok(self.tables.read().uploads.get(upload_id).cloned())
    }

    async fn delete_upload_record(&self, _ctx: &RegistryContext, upload_id: &str) -> Result<(), StoreError> {
        self.tables.write().uploads.remove(upload_id);
        Ok(())
    }

    async fn mark_migration_applied(&self, _ctx: &RegistryContext, name: &str) -> Result<(), StoreError> {
        self.tables.write().migrations.insert(name.to_string());
        Ok(())
    }

    async fn is_migration_applied(&self, _ctx: &RegistryContext, name: &str) -> Result<bool, StoreError> {
        Ok(self.tables.read().migrations.contains(name))
    }

    async fn referenced_blob_names(&self, _ctx: &RegistryContext) -> Result<HashSet<String>, StoreError> {
        let tables = self.tables.read();
        let mut names: HashSet<String> = tables.entities.values().map(|e| e.blob_name.clone()).collect();
        names.extend(tables.resources.values().map(|r| r.blob_name.clone()));
        Ok(names)
    }
}
