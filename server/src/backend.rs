use std::ops::Range;

use async_trait::async_trait;
use blobstore::{Blobstore, FileBlobstore, MemBlobstore};
use bytes::Bytes;
use registry_types::RegistryContext;

/// Picks between the two `Blobstore` implementations at start-up, per the
/// tagged-variant dispatch pattern from SPEC_FULL.md §9 ("dynamic content
/// dispatch"), so the rest of the process deals with one monomorphic
/// `ContentStore<AnyBlobstore>` regardless of which backend `--blob-dir`
/// selected.
pub enum AnyBlobstore {
    Mem(MemBlobstore),
    File(FileBlobstore),
}

#[async_trait]
impl Blobstore for AnyBlobstore {
    async fn put(&self, ctx: &RegistryContext, key: &str, data: Bytes) -> anyhow::Result<()> {
        match self {
            AnyBlobstore::Mem(b) => b.put(ctx, key, data).await,
            AnyBlobstore::File(b) => b.put(ctx, key, data).await,
        }
    }

    async fn get(&self, ctx: &RegistryContext, key: &str) -> anyhow::Result<Option<Bytes>> {
        match self {
            AnyBlobstore::Mem(b) => b.get(ctx, key).await,
            AnyBlobstore::File(b) => b.get(ctx, key).await,
        }
    }

    async fn get_range(
        &self,
        ctx: &RegistryContext,
        key: &str,
        range: Range<u64>,
    ) -> anyhow::Result<Option<Bytes>> {
        match self {
            AnyBlobstore::Mem(b) => b.get_range(ctx, key, range).await,
            AnyBlobstore::File(b) => b.get_range(ctx, key, range).await,
        }
    }

    async fn is_present(&self, ctx: &RegistryContext, key: &str) -> anyhow::Result<bool> {
        match self {
            AnyBlobstore::Mem(b) => b.is_present(ctx, key).await,
            AnyBlobstore::File(b) => b.is_present(ctx, key).await,
        }
    }

    async fn delete(&self, ctx: &RegistryContext, key: &str) -> anyhow::Result<()> {
        match self {
            AnyBlobstore::Mem(b) => b.delete(ctx, key).await,
            AnyBlobstore::File(b) => b.delete(ctx, key).await,
        }
    }

    async fn list_keys(&self, ctx: &RegistryContext) -> anyhow::Result<Vec<String>> {
        match self {
            AnyBlobstore::Mem(b) => b.list_keys(ctx).await,
            AnyBlobstore::File(b) => b.list_keys(ctx).await,
        }
    }
}
