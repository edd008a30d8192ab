use std::collections::HashMap;

use metadata_store::{Entity, MetadataStore, StoreError};
use registry_types::{Identifier, RegistryContext};

use crate::fields::FieldSet;

/// A write-through cache scoped to a single request: never constructed once
/// and reused across requests, to avoid serving a stale read after another
/// request mutates the same entity (SPEC_FULL.md §4.10).
#[derive(Default)]
pub struct RequestCache {
    entries: HashMap<Identifier, (FieldSet, Entity)>,
}

impl RequestCache {
    pub fn new() -> Self {
        RequestCache::default()
    }

    /// Returns the cached entity if it already covers `fields`; otherwise
    /// fetches it fresh and augments the cache with the union of old and
    /// new field coverage.
    pub async fn get(
        &mut self,
        ctx: &RegistryContext,
        store: &dyn MetadataStore,
        id: &Identifier,
        fields: FieldSet,
    ) -> Result<Option<Entity>, StoreError> {
        if let Some((cached_fields, entity)) = self.entries.get(id) {
            if cached_fields.contains(fields) {
                return Ok(Some(entity.clone()));
            }
        }

        match store.get_entity(ctx, id).await? {
            Some(entity) => {
                let coverage = self
                    .entries
                    .get(id)
                    .map(|(existing, _)| existing.union(fields))
                    .unwrap_or(fields);
                self.entries.insert(id.clone(), (coverage, entity.clone()));
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Batches every id not already satisfying `fields` into one
    /// `bulk_get_entities` call.
    pub async fn get_many(
        &mut self,
        ctx: &RegistryContext,
        store: &dyn MetadataStore,
        ids: &[Identifier],
        fields: FieldSet,
    ) -> Result<Vec<Option<Entity>>, StoreError> {
        let misses: Vec<Identifier> = ids
            .iter()
            .filter(|id| {
                !self
                    .entries
                    .get(id)
                    .map(|(cached_fields, _)| cached_fields.contains(fields))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        if !misses.is_empty() {
            let fetched = store.bulk_get_entities(ctx, &misses).await?;
            for (id, entity) in misses.into_iter().zip(fetched) {
                if let Some(entity) = entity {
                    let coverage = self
                        .entries
                        .get(&id)
                        .map(|(existing, _)| existing.union(fields))
                        .unwrap_or(fields);
                    self.entries.insert(id, (coverage, entity));
                }
            }
        }

        Ok(ids
            .iter()
            .map(|id| self.entries.get(id).map(|(_, entity)| entity.clone()))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
