use std::collections::BTreeMap;

use acl_engine::allow_write;
use metadata_store::MetadataStore;
use registry_types::{Channel, Identifier, RegistryContext};

use crate::error::ChannelPublisherError;

/// Publishes `resolved_id` on `channel`, pinning each declared resource to
/// the revision named in `resource_pins` (SPEC_FULL.md §4.5). Bundles
/// declare no resources of their own, so an empty map is always valid for
/// them.
pub async fn publish(
    ctx: &RegistryContext,
    store: &dyn MetadataStore,
    resolved_id: &Identifier,
    channel: Channel,
    resource_pins: BTreeMap<String, i64>,
) -> Result<(), ChannelPublisherError> {
    if channel == Channel::Unpublished {
        return Err(ChannelPublisherError::UnpublishableChannel);
    }

    let base = resolved_id.base();
    let acl = store
        .get_base_entity(ctx, &base)
        .await?
        .and_then(|b| b.acls.get(&channel).cloned())
        .unwrap_or_default();
    if !allow_write(ctx.config(), &acl, ctx.principal()) {
        return Err(ChannelPublisherError::Forbidden(
            ctx.principal().user.clone(),
            format!("{base} on channel `{channel}`"),
        ));
    }

    let entity = store
        .get_entity(ctx, resolved_id)
        .await?
        .ok_or_else(|| ChannelPublisherError::EntityNotFound(resolved_id.to_string()))?;

    if let Some(charm) = entity.artifact.as_charm() {
        for name in charm.resources.keys() {
            let revision = resource_pins
                .get(name)
                .ok_or_else(|| ChannelPublisherError::MissingResource(name.clone()))?;
            store
                .get_resource(ctx, &entity.base, name, *revision)
                .await?
                .ok_or_else(|| ChannelPublisherError::UnknownResourceRevision {
                    name: name.clone(),
                    revision: *revision,
                })?;
        }
    }

    store.publish(ctx, resolved_id, channel, resource_pins).await?;
    slog::info!(ctx.logger(), "published entity"; "identifier" => %resolved_id, "channel" => %channel);
    Ok(())
}
