use chrono::Utc;
use metadata_store::{Entity, MetadataStore};
use registry_types::{Channel, ContentHash, Identifier, RegistryContext};

use crate::archive::parse_archive;
use crate::error::EntityModelError;
use crate::revision::{allocate_promulgated_revision, allocate_revision};
use crate::series::check_single_family;

/// Describes a single ingestion attempt. `identifier` may be revisionless
/// (the common case) or fully resolved (a `PUT` that names its own
/// revision); `uploader` and `interactive` feed the supplemented fields
/// from SPEC_FULL.md §3.1. `promulgated_id`, when set on an owned upload,
/// is the ownerless identifier this revision should also be registered
/// under (an explicit promulgation, distinct from uploading directly to an
/// ownerless identifier); its `owner` must be `None`.
pub struct IngestRequest<'a> {
    pub identifier: Identifier,
    pub archive_bytes: &'a [u8],
    pub blob_name: String,
    pub blob_hash: ContentHash,
    pub blob_size: u64,
    pub uploader: String,
    pub interactive: bool,
    pub promulgated_id: Option<Identifier>,
}

/// Builds and inserts the `Entity` record for one ingestion attempt.
///
/// Does not retry on a revision collision: SPEC_FULL.md §4.8's concurrent
/// upload rule belongs to `upload-pipeline`, which calls this in a loop,
/// inspecting the `StoreError::DuplicateKey` case to decide whether to
/// return the existing entity (identical content) or retry with a fresh
/// revision.
pub async fn ingest(
    ctx: &RegistryContext,
    store: &dyn MetadataStore,
    request: IngestRequest<'_>,
) -> Result<Entity, EntityModelError> {
    let artifact = parse_archive(request.archive_bytes)?;

    let supported_series = match (&artifact, request.identifier.series.as_deref()) {
        (_, Some(series)) => vec![series.to_string()],
        (metadata_store::Artifact::Bundle(data), None) => {
            data.series.clone().into_iter().collect::<Vec<_>>()
        }
        (metadata_store::Artifact::Charm(meta), None) => {
            if meta.series.is_empty() {
                return Err(EntityModelError::InvalidMetadata(
                    "multi-series charm must declare at least one series".to_string(),
                ));
            }
            meta.series.clone()
        }
    };

    if let Err((a, b)) = check_single_family(&supported_series) {
        return Err(EntityModelError::EntityIdNotAllowed(format!(
            "series `{a}` and `{b}` belong to different distribution families"
        )));
    }

    if let metadata_store::Artifact::Bundle(data) = &artifact {
        for app in data.applications.values() {
            store
                .get_entity(ctx, &app.charm)
                .await?
                .filter(|e| e.is_on_channel(Channel::Stable))
                .ok_or_else(|| EntityModelError::UnresolvedBundleCharm(app.charm.to_string()))?;
        }
    }

    let base = request.identifier.base();
    let existing = store.list_entities_by_base(ctx, &base).await?;

    if request.identifier.series.is_some() {
        let multi_series_already_present = existing.iter().any(|e| e.identifier.series.is_none());
        if multi_series_already_present {
            return Err(EntityModelError::EntityIdNotAllowed(format!(
                "{} is already a multi-series charm; single-series upload rejected",
                base
            )));
        }
    }

    let revision = match request.identifier.revision {
        Some(revision) => revision,
        None => allocate_revision(&existing, request.identifier.series.is_none()),
    };

    let is_promulgated_upload = request.identifier.owner.is_none();
    if let Some(target) = &request.promulgated_id {
        if is_promulgated_upload {
            return Err(EntityModelError::EntityIdNotAllowed(
                "promulgated-id is only meaningful for an owned upload".to_string(),
            ));
        }
        if target.owner.is_some() {
            return Err(EntityModelError::EntityIdNotAllowed(
                "promulgated-id must be an ownerless identifier".to_string(),
            ));
        }
    }

    let promulgated_name = if is_promulgated_upload {
        Some(request.identifier.name.clone())
    } else {
        request.promulgated_id.as_ref().map(|id| id.name.clone())
    };

    let (promulgated_id, promulgated_revision) = match promulgated_name {
        Some(name) => {
            let existing_promulgated = store.list_entities_by_promulgated_name(ctx, &name).await?;
            let promulgated_revision = allocate_promulgated_revision(&existing_promulgated);
            let promulgated_id = if is_promulgated_upload {
                None
            } else {
                Some(Identifier {
                    owner: None,
                    name,
                    series: request.identifier.series.clone(),
                    revision: Some(promulgated_revision),
                })
            };
            (promulgated_id, promulgated_revision)
        }
        None => (None, -1),
    };

    let resolved_identifier = Identifier {
        owner: request.identifier.owner.clone(),
        name: request.identifier.name.clone(),
        series: request.identifier.series.clone(),
        revision: Some(revision),
    };

    let entity = Entity {
        identifier: resolved_identifier.clone(),
        base: base.clone(),
        blob_hash: request.blob_hash,
        blob_size: request.blob_size,
        blob_name: request.blob_name,
        uploaded_at: Utc::now(),
        artifact,
        supported_series,
        promulgated_id,
        promulgated_revision,
        channels: Vec::new(),
        uploader: request.uploader,
    };

    store.insert_entity(ctx, entity.clone()).await?;
    store.get_or_create_base_entity(ctx, &base).await?;
    if request.interactive {
        store.set_can_ingest(ctx, &base, false).await?;
    }

    slog::info!(ctx.logger(), "ingested entity"; "identifier" => %entity.identifier);
    Ok(entity)
}
