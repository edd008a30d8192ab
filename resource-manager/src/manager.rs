use acl_engine::allow_write;
use bytes::Bytes;
use chrono::Utc;
use metadata_store::{Artifact, MetadataStore, Resource, ResourceKind};
use registry_types::{Channel, ContentHash, Identifier, RegistryContext};

use blobstore::{Blobstore, ContentStore};

use crate::declare::{check_extension, check_kind, declared_resource};
use crate::error::ResourceManagerError;
use crate::manifest::parse_manifest;
use crate::revision::allocate_resource_revision;

/// One resource upload request against an already-resolved charm entity.
pub struct UploadResourceRequest<'a> {
    pub entity: &'a Identifier,
    pub resource_name: &'a str,
    pub data: Bytes,
    pub expected_hash: ContentHash,
    pub filename: Option<&'a str>,
    pub kind: ResourceKind,
}

/// Verifies the declaration, stores the blob, and inserts the next
/// resource revision for `(base, name)` (SPEC_FULL.md §4.4).
pub async fn upload_resource<B: Blobstore>(
    ctx: &RegistryContext,
    store: &dyn MetadataStore,
    content_store: &ContentStore<B>,
    request: UploadResourceRequest<'_>,
) -> Result<Resource, ResourceManagerError> {
    let base = request.entity.base();
    let acl = store
        .get_base_entity(ctx, &base)
        .await?
        .and_then(|b| b.acls.get(&Channel::Unpublished).cloned())
        .unwrap_or_default();
    if !allow_write(ctx.config(), &acl, ctx.principal()) {
        return Err(ResourceManagerError::Forbidden(ctx.principal().user.clone(), base.to_string()));
    }

    let owning_entity = store
        .get_entity(ctx, request.entity)
        .await?
        .ok_or_else(|| ResourceManagerError::Store(metadata_store::StoreError::NotFound(request.entity.to_string())))?;

    let charm = match &owning_entity.artifact {
        Artifact::Charm(meta) => meta,
        Artifact::Bundle(_) => return Err(ResourceManagerError::BundleResourceForbidden),
    };

    let declaration = declared_resource(&request.entity.to_string(), charm, request.resource_name)?;
    check_kind(request.resource_name, declaration, request.kind)?;
    if let Some(filename) = request.filename {
        check_extension(declaration, filename)?;
    }
    if request.kind == ResourceKind::OciImage {
        parse_manifest(&request.data)?;
    }

    let stored = content_store.put(ctx, request.data, request.expected_hash).await?;

    let existing = store
        .list_resource_revisions(ctx, &base, request.resource_name)
        .await?;
    let revision = allocate_resource_revision(&existing);

    let resource = Resource {
        base,
        name: request.resource_name.to_string(),
        revision,
        hash: stored.hash,
        size: stored.size,
        uploaded_at: Utc::now(),
        blob_name: stored.blob_name,
        kind: request.kind,
    };

    store.insert_resource(ctx, resource.clone()).await?;
    slog::info!(
        ctx.logger(), "uploaded resource";
        "entity" => %request.entity, "name" => request.resource_name, "revision" => revision,
    );
    Ok(resource)
}

/// `ResolveResource(resolved-entity, name, revision, channel)`. `revision ==
/// -1` means "look up the channel pin"; everything else is a direct lookup.
pub async fn resolve_resource(
    ctx: &RegistryContext,
    store: &dyn MetadataStore,
    resolved_entity: &Identifier,
    name: &str,
    revision: i64,
    channel: Channel,
) -> Result<Resource, ResourceManagerError> {
    let base = resolved_entity.base();
    let revision = if revision == -1 {
        let pins = store
            .get_resource_pin(ctx, resolved_entity, channel)
            .await?
            .ok_or(ResourceManagerError::NoChannelPin)?;
        *pins.get(name).ok_or(ResourceManagerError::NoChannelPin)?
    } else {
        revision
    };

    store
        .get_resource(ctx, &base, name, revision)
        .await?
        .ok_or_else(|| {
            ResourceManagerError::Store(metadata_store::StoreError::NotFound(format!(
                "resource {name}@{revision} for {base}"
            )))
        })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use blobstore::MemBlobstore;
    use metadata_store::{CharmMetadata, Entity, InMemoryMetadataStore, ResourceDeclaration};
    use registry_types::{ContentHash, Principal};

    use super::*;

    fn charm_entity(owner: &str, name: &str, resource: &str, kind: ResourceKind, path: Option<&str>) -> Entity {
        let identifier = Identifier {
            owner: Some(owner.to_string()),
            name: name.to_string(),
            series: Some("focal".to_string()),
            revision: Some(0),
        };
        let mut resources = BTreeMap::new();
        resources.insert(
            resource.to_string(),
            ResourceDeclaration {
                kind,
                path: path.map(String::from),
                description: None,
            },
        );
        Entity {
            base: identifier.base(),
            blob_hash: ContentHash::hash_bytes(b"archive"),
            blob_size: 7,
            blob_name: "blobs/demo-0".to_string(),
            uploaded_at: chrono::Utc::now(),
            artifact: Artifact::Charm(CharmMetadata {
                name: name.to_string(),
                summary: String::new(),
                series: vec!["focal".to_string()],
                subordinate: false,
                provides: Default::default(),
                requires: Default::default(),
                peers: Default::default(),
                resources,
            }),
            supported_series: vec!["focal".to_string()],
            promulgated_id: None,
            promulgated_revision: -1,
            channels: Vec::new(),
            uploader: owner.to_string(),
            identifier,
        }
    }

    fn setup() -> (InMemoryMetadataStore, ContentStore<MemBlobstore>, RegistryContext) {
        (
            InMemoryMetadataStore::new(),
            ContentStore::new(Arc::new(MemBlobstore::new())),
            RegistryContext::test_context_as(Principal {
                user: "admin".to_string(),
                groups: Vec::new(),
                is_admin: true,
            }),
        )
    }

    #[tokio::test]
    async fn uploads_first_revision_of_declared_resource() {
        let (store, content_store, ctx) = setup();
        let entity = charm_entity("alice", "demo", "cache", ResourceKind::File, Some("cache.bin"));
        store.insert_entity(&ctx, entity.clone()).await.unwrap();

        let data = Bytes::from_static(b"payload");
        let hash = ContentHash::hash_bytes(&data);
        let resource = upload_resource(
            &ctx,
            &store,
            &content_store,
            UploadResourceRequest {
                entity: &entity.identifier,
                resource_name: "cache",
                data,
                expected_hash: hash,
                filename: Some("cache.bin"),
                kind: ResourceKind::File,
            },
        )
        .await
        .unwrap();

        assert_eq!(resource.revision, 0);
        assert_eq!(resource.name, "cache");
    }

    #[tokio::test]
    async fn rejects_upload_of_undeclared_resource() {
        let (store, content_store, ctx) = setup();
        let entity = charm_entity("alice", "demo", "cache", ResourceKind::File, None);
        store.insert_entity(&ctx, entity.clone()).await.unwrap();

        let data = Bytes::from_static(b"payload");
        let hash = ContentHash::hash_bytes(&data);
        let err = upload_resource(
            &ctx,
            &store,
            &content_store,
            UploadResourceRequest {
                entity: &entity.identifier,
                resource_name: "missing",
                data,
                expected_hash: hash,
                filename: None,
                kind: ResourceKind::File,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ResourceManagerError::UndeclaredResource { .. }));
    }

    #[tokio::test]
    async fn resolve_resource_follows_channel_pin_when_revision_is_unspecified() {
        let (store, content_store, ctx) = setup();
        let entity = charm_entity("alice", "demo", "cache", ResourceKind::File, None);
        store.insert_entity(&ctx, entity.clone()).await.unwrap();

        let data = Bytes::from_static(b"payload");
        let hash = ContentHash::hash_bytes(&data);
        upload_resource(
            &ctx,
            &store,
            &content_store,
            UploadResourceRequest {
                entity: &entity.identifier,
                resource_name: "cache",
                data,
                expected_hash: hash,
                filename: None,
                kind: ResourceKind::File,
            },
        )
        .await
        .unwrap();

        let mut pins = BTreeMap::new();
        pins.insert("cache".to_string(), 0);
        store
            .publish(&ctx, &entity.identifier, Channel::Stable, pins)
            .await
            .unwrap();

        let resolved = resolve_resource(&ctx, &store, &entity.identifier, "cache", -1, Channel::Stable)
            .await
            .unwrap();
        assert_eq!(resolved.revision, 0);
    }

    #[tokio::test]
    async fn resolve_resource_fails_without_a_pin() {
        let (store, _content_store, ctx) = setup();
        let entity = charm_entity("alice", "demo", "cache", ResourceKind::File, None);
        store.insert_entity(&ctx, entity.clone()).await.unwrap();

        let err = resolve_resource(&ctx, &store, &entity.identifier, "cache", -1, Channel::Stable)
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceManagerError::NoChannelPin));
    }

    #[tokio::test]
    async fn rejects_upload_from_a_non_admin_principal_with_no_write_acl() {
        let (store, content_store, _) = setup();
        let ctx = RegistryContext::test_context();
        let entity = charm_entity("alice", "demo", "cache", ResourceKind::File, Some("cache.bin"));
        store.insert_entity(&ctx, entity.clone()).await.unwrap();

        let data = Bytes::from_static(b"payload");
        let hash = ContentHash::hash_bytes(&data);
        let err = upload_resource(
            &ctx,
            &store,
            &content_store,
            UploadResourceRequest {
                entity: &entity.identifier,
                resource_name: "cache",
                data,
                expected_hash: hash,
                filename: Some("cache.bin"),
                kind: ResourceKind::File,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ResourceManagerError::Forbidden(..)));
    }

    #[tokio::test]
    async fn rejects_invalid_oci_manifest_bytes() {
        let (store, content_store, ctx) = setup();
        let entity = charm_entity("alice", "demo", "image", ResourceKind::OciImage, None);
        store.insert_entity(&ctx, entity.clone()).await.unwrap();

        let data = Bytes::from_static(b"not a manifest");
        let hash = ContentHash::hash_bytes(&data);
        let err = upload_resource(
            &ctx,
            &store,
            &content_store,
            UploadResourceRequest {
                entity: &entity.identifier,
                resource_name: "image",
                data,
                expected_hash: hash,
                filename: None,
                kind: ResourceKind::OciImage,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ResourceManagerError::InvalidManifest(_)));
    }

    #[tokio::test]
    async fn accepts_a_well_formed_oci_manifest() {
        let (store, content_store, ctx) = setup();
        let entity = charm_entity("alice", "demo", "image", ResourceKind::OciImage, None);
        store.insert_entity(&ctx, entity.clone()).await.unwrap();

        let manifest = crate::manifest::OciImageManifest {
            registry: "registry.example.com".to_string(),
            repository: "myteam/worker".to_string(),
            digest: "sha256:abc123".to_string(),
        };
        let data = Bytes::from(crate::manifest::encode_manifest(&manifest));
        let hash = ContentHash::hash_bytes(&data);
        let resource = upload_resource(
            &ctx,
            &store,
            &content_store,
            UploadResourceRequest {
                entity: &entity.identifier,
                resource_name: "image",
                data,
                expected_hash: hash,
                filename: None,
                kind: ResourceKind::OciImage,
            },
        )
        .await
        .unwrap();

        assert_eq!(resource.kind, ResourceKind::OciImage);
    }
}
