use std::collections::HashSet;

use async_trait::async_trait;
use blobstore::GcReferenceSource;
use registry_types::RegistryContext;

use crate::mem::InMemoryMetadataStore;
use crate::store::MetadataStore;

/// Wires `InMemoryMetadataStore` into `blobstore`'s GC worker as the
/// reference side of the two snapshots (SPEC_FULL.md §4.1).
#[async_trait]
impl GcReferenceSource for InMemoryMetadataStore {
    async fn referenced_blob_names(&self, ctx: &RegistryContext) -> anyhow::Result<HashSet<String>> {
        Ok(MetadataStore::referenced_blob_names(self, ctx).await?)
    }
}
