use acl_engine::allow_write;
use metadata_store::MetadataStore;
use registry_types::{Channel, Identifier, RegistryContext};

use crate::error::ChannelPublisherError;

/// Deletes `resolved_id`, failing `PinnedRevision` if it is still the
/// published revision on any channel (SPEC_FULL.md §4, "Lifecycle").
/// Removes the owning base-entity too once no revisions remain. Gated by
/// the base's `unpublished`-channel ACL, since a delete isn't scoped to any
/// one published channel.
pub async fn delete_entity(
    ctx: &RegistryContext,
    store: &dyn MetadataStore,
    resolved_id: &Identifier,
) -> Result<(), ChannelPublisherError> {
    let base = resolved_id.base();
    let base_entity = store.get_base_entity(ctx, &base).await?;

    let acl = base_entity
        .as_ref()
        .and_then(|b| b.acls.get(&Channel::Unpublished).cloned())
        .unwrap_or_default();
    if !allow_write(ctx.config(), &acl, ctx.principal()) {
        return Err(ChannelPublisherError::Forbidden(ctx.principal().user.clone(), base.to_string()));
    }

    if let Some(base_entity) = base_entity {
        let pinned_on = base_entity
            .published
            .iter()
            .find_map(|(channel, pinned)| (pinned == resolved_id).then_some(*channel));
        if let Some(channel) = pinned_on {
            return Err(ChannelPublisherError::PinnedRevision(resolved_id.to_string(), channel));
        }
    }

    store.delete_entity(ctx, resolved_id).await?;
    store.delete_base_entity_if_empty(ctx, &base).await?;
    slog::info!(ctx.logger(), "deleted entity"; "identifier" => %resolved_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use metadata_store::{Artifact, BundleMetadata, Entity, InMemoryMetadataStore};
    use registry_types::{Channel, ContentHash, Principal};

    use super::*;

    fn admin_context() -> RegistryContext {
        RegistryContext::test_context_as(Principal {
            user: "admin".to_string(),
            groups: Vec::new(),
            is_admin: true,
        })
    }

    fn bundle_entity(revision: i64) -> Entity {
        let identifier = Identifier {
            owner: Some("alice".to_string()),
            name: "foo".to_string(),
            series: None,
            revision: Some(revision),
        };
        Entity {
            base: identifier.base(),
            blob_hash: ContentHash::hash_bytes(format!("archive-{revision}").as_bytes()),
            blob_size: 7,
            blob_name: format!("blobs/foo-{revision}"),
            uploaded_at: Utc::now(),
            artifact: Artifact::Bundle(BundleMetadata {
                applications: BTreeMap::new(),
                series: None,
            }),
            supported_series: Vec::new(),
            promulgated_id: None,
            promulgated_revision: -1,
            channels: Vec::new(),
            uploader: "alice".to_string(),
            identifier,
        }
    }

    #[tokio::test]
    async fn deletes_an_unpinned_revision() {
        let store = InMemoryMetadataStore::new();
        let ctx = admin_context();
        let entity = bundle_entity(0);
        store.insert_entity(&ctx, entity.clone()).await.unwrap();

        delete_entity(&ctx, &store, &entity.identifier).await.unwrap();

        assert!(store.get_entity(&ctx, &entity.identifier).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_deleting_a_pinned_revision() {
        let store = InMemoryMetadataStore::new();
        let ctx = admin_context();
        let entity = bundle_entity(0);
        store.insert_entity(&ctx, entity.clone()).await.unwrap();
        crate::publish(&ctx, &store, &entity.identifier, Channel::Stable, BTreeMap::new())
            .await
            .unwrap();

        let err = delete_entity(&ctx, &store, &entity.identifier).await.unwrap_err();
        assert!(matches!(err, ChannelPublisherError::PinnedRevision(_, Channel::Stable)));
    }

    #[tokio::test]
    async fn deleting_the_last_revision_removes_the_base_entity() {
        let store = InMemoryMetadataStore::new();
        let ctx = admin_context();
        let entity = bundle_entity(0);
        store.insert_entity(&ctx, entity.clone()).await.unwrap();
        store.get_or_create_base_entity(&ctx, &entity.base).await.unwrap();

        delete_entity(&ctx, &store, &entity.identifier).await.unwrap();

        assert!(store.get_base_entity(&ctx, &entity.base).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unpinned_revision_deletable_after_republish_elsewhere() {
        let store = InMemoryMetadataStore::new();
        let ctx = admin_context();
        let rev0 = bundle_entity(0);
        let rev1 = bundle_entity(1);
        store.insert_entity(&ctx, rev0.clone()).await.unwrap();
        store.insert_entity(&ctx, rev1.clone()).await.unwrap();
        crate::publish(&ctx, &store, &rev0.identifier, Channel::Stable, BTreeMap::new())
            .await
            .unwrap();

        let err = delete_entity(&ctx, &store, &rev0.identifier).await.unwrap_err();
        assert!(matches!(err, ChannelPublisherError::PinnedRevision(..)));

        crate::publish(&ctx, &store, &rev1.identifier, Channel::Stable, BTreeMap::new())
            .await
            .unwrap();
        delete_entity(&ctx, &store, &rev0.identifier).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_a_non_admin_principal_with_no_write_acl() {
        let store = InMemoryMetadataStore::new();
        let ctx = RegistryContext::test_context();
        let entity = bundle_entity(0);
        store.insert_entity(&ctx, entity.clone()).await.unwrap();

        let err = delete_entity(&ctx, &store, &entity.identifier).await.unwrap_err();
        assert!(matches!(err, ChannelPublisherError::Forbidden(..)));
    }
}
