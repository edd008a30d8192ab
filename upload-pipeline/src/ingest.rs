use std::collections::BTreeMap;

use acl_engine::allow_write;
use bytes::Bytes;
use entity_model::{ingest as entity_model_ingest, EntityModelError, IngestRequest as EntityIngestRequest};
use metadata_store::{Entity, MetadataStore, StoreError};
use registry_types::{Channel, ContentHash, Identifier, RegistryContext};

use blobstore::{Blobstore, ContentStore};

use crate::error::UploadPipelineError;

const MAX_RETRY_ATTEMPTS: u32 = 8;

/// Where the archive bytes for this ingestion come from: a fresh stream
/// uploaded in the same call, or a blob a prior multipart upload already
/// finished.
pub enum ArtifactSource {
    Stream { data: Bytes, expected_hash: ContentHash },
    AggregateBlob { blob_name: String },
}

/// `IngestEntity(identifier, aggregate-hash | stream, channels?,
/// promulgated-id?, ingest-flag?) -> resolved-id` (SPEC_FULL.md §4.8).
pub struct IngestEntityRequest<'a> {
    pub identifier: Identifier,
    pub source: ArtifactSource,
    pub uploader: String,
    pub interactive: bool,
    /// Channels to publish onto immediately after a successful ingest.
    /// Fails the whole call if publication fails (e.g. a required resource
    /// is missing) — the ingested entity still exists, only the
    /// publication step is rolled back by the caller seeing the error.
    pub channels: &'a [Channel],
    /// Explicit promulgation target for an owned upload (SPEC_FULL.md
    /// §4.8's `promulgated-id?` parameter).
    pub promulgated_id: Option<Identifier>,
}

/// Resolves the archive bytes, then ingests with the concurrent-upload
/// retry rule: a `DuplicateKey` from a racing insert is resolved by
/// returning the existing entity if its content hash matches, or by
/// retrying with a freshly allocated revision otherwise.
pub async fn ingest_entity<B: Blobstore>(
    ctx: &RegistryContext,
    store: &dyn MetadataStore,
    content_store: &ContentStore<B>,
    request: IngestEntityRequest<'_>,
) -> Result<Entity, UploadPipelineError> {
    let base = request.identifier.base();
    let acl = store
        .get_base_entity(ctx, &base)
        .await?
        .and_then(|b| b.acls.get(&Channel::Unpublished).cloned())
        .unwrap_or_default();
    if !allow_write(ctx.config(), &acl, ctx.principal()) {
        return Err(UploadPipelineError::Forbidden(ctx.principal().user.clone(), base.to_string()));
    }

    let (archive_bytes, blob_name, blob_hash, blob_size) = match request.source {
        ArtifactSource::Stream { data, expected_hash } => {
            let stored = content_store.put(ctx, data.clone(), expected_hash).await?;
            (data, stored.blob_name, stored.hash, stored.size)
        }
        ArtifactSource::AggregateBlob { blob_name } => {
            let (data, size, hash) = content_store.open(ctx, &blob_name).await?;
            (data, blob_name, hash, size)
        }
    };

    let attempt_identifier = request.identifier.clone();

    let entity = 'retry: loop {
        let mut last_err = None;
        for _ in 0..MAX_RETRY_ATTEMPTS {
            let ingest_request = EntityIngestRequest {
                identifier: attempt_identifier.clone(),
                archive_bytes: &archive_bytes,
                blob_name: blob_name.clone(),
                blob_hash,
                blob_size,
                uploader: request.uploader.clone(),
                interactive: request.interactive,
                promulgated_id: request.promulgated_id.clone(),
            };
            match entity_model_ingest(ctx, store, ingest_request).await {
                Ok(entity) => break 'retry entity,
                Err(EntityModelError::Store(StoreError::DuplicateKey(_))) => {
                    let existing = store.list_entities_by_base(ctx, &base).await?;
                    if let Some(same_content) = existing.iter().find(|e| e.blob_hash == blob_hash) {
                        break 'retry same_content.clone();
                    }
                    // Someone else just took the revision we tried; the next
                    // attempt recomputes from the refreshed existing set.
                    continue;
                }
                Err(other) => {
                    last_err = Some(other);
                    break;
                }
            }
        }
        if let Some(err) = last_err {
            return Err(err.into());
        }
        return Err(UploadPipelineError::TooManyRetries(MAX_RETRY_ATTEMPTS));
    };

    for channel in request.channels {
        let pins = BTreeMap::new();
        channel_publisher::publish(ctx, store, &entity.identifier, *channel, pins).await?;
    }

    Ok(entity)
}
