//! Partial-identifier resolution across channels (SPEC_FULL.md §4.6). Never
//! touches BlobStore — it resolves a reference, not the bytes behind it.

mod error;

use acl_engine::allow_read;
use entity_model::pick_best;
use metadata_store::{Entity, MetadataStore};
use registry_types::{Channel, Identifier, RegistryContext};

pub use error::ResolverError;

/// A (possibly partial) query: `channel` pins the search to a single
/// channel instead of walking the configured search order.
pub struct ResolveQuery<'a> {
    pub partial: &'a Identifier,
    pub channel: Option<Channel>,
}

/// Resolves `query` to the single best-matching entity plus the channel it
/// was found on.
pub async fn resolve(
    ctx: &RegistryContext,
    store: &dyn MetadataStore,
    query: ResolveQuery<'_>,
) -> Result<(Entity, Channel), ResolverError> {
    let candidates = gather_candidates(ctx, store, query.partial).await?;

    let owner_specified = query.partial.owner.is_some();
    let series_specified = query.partial.series.is_some();
    let is_admin = ctx.principal().is_admin;

    let search_order: Vec<Channel> = match query.channel {
        Some(channel) => vec![channel],
        None => ctx.config().channel_search_order.clone(),
    };

    for channel in search_order {
        let mut on_channel: Vec<Entity> = Vec::new();
        for entity in &candidates {
            if !entity.is_on_channel(channel) {
                continue;
            }
            if !is_admin {
                let base_entity = store.get_base_entity(ctx, &entity.base).await?;
                let acl = base_entity.and_then(|b| b.acls.get(&channel).cloned()).unwrap_or_default();
                if !allow_read(&acl, ctx.principal()) {
                    continue;
                }
            }
            on_channel.push(entity.clone());
        }
        if let Some(best) = pick_best(&on_channel, owner_specified, series_specified) {
            slog::debug!(ctx.logger(), "resolved query"; "identifier" => %best.identifier, "channel" => %channel);
            return Ok((best.clone(), channel));
        }
    }

    Err(ResolverError::NotFound)
}

/// Every entity sharing the query's base (or, for a promulgated query,
/// sharing its name across owners), narrowed by any series/revision the
/// caller specified.
async fn gather_candidates(
    ctx: &RegistryContext,
    store: &dyn MetadataStore,
    partial: &Identifier,
) -> Result<Vec<Entity>, ResolverError> {
    let mut candidates = if partial.owner.is_some() {
        store.list_entities_by_base(ctx, &partial.base()).await?
    } else {
        store.list_entities_by_promulgated_name(ctx, &partial.name).await?
    };

    if let Some(series) = &partial.series {
        candidates.retain(|e| e.identifier.series.as_deref() == Some(series.as_str()));
    }
    if let Some(revision) = partial.revision {
        candidates.retain(|e| e.identifier.revision == Some(revision));
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use metadata_store::{Artifact, CharmMetadata, ChannelAcl, InMemoryMetadataStore};
    use registry_types::{ContentHash, Principal};

    use super::*;

    fn charm(owner: &str, name: &str, series: &str, revision: i64, channels: Vec<Channel>) -> Entity {
        let identifier = Identifier {
            owner: Some(owner.to_string()),
            name: name.to_string(),
            series: Some(series.to_string()),
            revision: Some(revision),
        };
        Entity {
            base: identifier.base(),
            blob_hash: ContentHash::hash_bytes(b"x"),
            blob_size: 1,
            blob_name: "blobs/x".to_string(),
            uploaded_at: Utc::now(),
            artifact: Artifact::Charm(CharmMetadata {
                name: name.to_string(),
                summary: String::new(),
                series: vec![series.to_string()],
                subordinate: false,
                provides: Default::default(),
                requires: Default::default(),
                peers: Default::default(),
                resources: Default::default(),
            }),
            supported_series: vec![series.to_string()],
            promulgated_id: None,
            promulgated_revision: -1,
            channels,
            uploader: owner.to_string(),
            identifier,
        }
    }

    #[tokio::test]
    async fn resolves_highest_revision_on_stable_by_default() {
        let store = InMemoryMetadataStore::new();
        let ctx = RegistryContext::test_context();
        let low = charm("alice", "demo", "focal", 0, vec![Channel::Stable]);
        let high = charm("alice", "demo", "focal", 1, vec![Channel::Stable]);
        store.insert_entity(&ctx, low).await.unwrap();
        store.insert_entity(&ctx, high.clone()).await.unwrap();

        let query = ResolveQuery {
            partial: &Identifier {
                owner: Some("alice".to_string()),
                name: "demo".to_string(),
                series: None,
                revision: None,
            },
            channel: None,
        };
        let (resolved, channel) = resolve(&ctx, &store, query).await.unwrap();
        assert_eq!(resolved.revision(), 1);
        assert_eq!(channel, Channel::Stable);
    }

    #[tokio::test]
    async fn falls_through_to_less_stable_channel_when_stable_is_empty() {
        let store = InMemoryMetadataStore::new();
        let ctx = RegistryContext::test_context();
        let entity = charm("alice", "demo", "focal", 0, vec![Channel::Edge]);
        store.insert_entity(&ctx, entity).await.unwrap();

        let query = ResolveQuery {
            partial: &Identifier {
                owner: Some("alice".to_string()),
                name: "demo".to_string(),
                series: None,
                revision: None,
            },
            channel: None,
        };
        let (_resolved, channel) = resolve(&ctx, &store, query).await.unwrap();
        assert_eq!(channel, Channel::Edge);
    }

    #[tokio::test]
    async fn denies_non_admin_without_read_acl() {
        let store = InMemoryMetadataStore::new();
        let ctx = RegistryContext::test_context_as(Principal {
            user: "mallory".to_string(),
            groups: vec![],
            is_admin: false,
        });
        let entity = charm("alice", "demo", "focal", 0, vec![Channel::Stable]);
        store.insert_entity(&ctx, entity.clone()).await.unwrap();

        let acl = ChannelAcl {
            read: vec!["alice".to_string()],
            write: vec![],
        };
        store.set_acl(&ctx, &entity.base, Channel::Stable, acl).await.unwrap();

        let query = ResolveQuery {
            partial: &Identifier {
                owner: Some("alice".to_string()),
                name: "demo".to_string(),
                series: None,
                revision: None,
            },
            channel: None,
        };
        let err = resolve(&ctx, &store, query).await.unwrap_err();
        assert!(matches!(err, ResolverError::NotFound));
    }

    #[tokio::test]
    async fn resolves_promulgated_query_across_owners() {
        let store = InMemoryMetadataStore::new();
        let ctx = RegistryContext::test_context();
        let mut low = charm("alice", "demo", "focal", 0, vec![Channel::Stable]);
        low.promulgated_revision = 1;
        let mut high = charm("bob", "demo", "focal", 0, vec![Channel::Stable]);
        high.promulgated_revision = 2;
        store.insert_entity(&ctx, low).await.unwrap();
        store.insert_entity(&ctx, high.clone()).await.unwrap();

        let query = ResolveQuery {
            partial: &Identifier {
                owner: None,
                name: "demo".to_string(),
                series: None,
                revision: None,
            },
            channel: None,
        };
        let (resolved, _channel) = resolve(&ctx, &store, query).await.unwrap();
        assert_eq!(resolved.identifier.owner.as_deref(), Some("bob"));
    }
}
