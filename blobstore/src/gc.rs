use std::collections::HashSet;

use async_trait::async_trait;
use registry_types::RegistryContext;
use slog::info;

use crate::Blobstore;

/// Supplies the set of blob-names a GC pass must not delete. Implemented by
/// the metadata store (every `Resource.blob_name` still reachable from a
/// live `Entity`/`Resource` row) so that `blobstore` itself never needs to
/// know about the registry's record types.
#[async_trait]
pub trait GcReferenceSource: Send + Sync {
    async fn referenced_blob_names(&self, ctx: &RegistryContext) -> anyhow::Result<HashSet<String>>;
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct GcOutcome {
    pub scanned: usize,
    pub deleted: usize,
}

/// Runs one garbage collection pass over `store`.
///
/// A blob written concurrently with the pass — uploaded and immediately
/// referenced by a new row in the metadata store — must never be deleted,
/// even though it existed when the first blob snapshot was taken. The
/// worker therefore snapshots the blob set first, then the reference set,
/// then the blob set again, and deletes only the intersection of the two
/// blob snapshots minus the reference snapshot: a blob present both before
/// and after the reference scan, and still unreferenced, was never live
/// during the window the reference scan covered.
pub async fn run_gc_pass(
    ctx: &RegistryContext,
    store: &(dyn Blobstore + Send + Sync),
    references: &(dyn GcReferenceSource + Send + Sync),
    prefix: &str,
) -> anyhow::Result<GcOutcome> {
    let list_with_prefix = |keys: Vec<String>| -> HashSet<String> {
        keys.into_iter().filter(|k| k.starts_with(prefix)).collect()
    };
    let blobs_before = list_with_prefix(store.list_keys(ctx).await?);
    let referenced = references.referenced_blob_names(ctx).await?;
    let blobs_after = list_with_prefix(store.list_keys(ctx).await?);

    let candidates: HashSet<&String> = blobs_before.intersection(&blobs_after).collect();
    let mut outcome = GcOutcome {
        scanned: candidates.len(),
        deleted: 0,
    };

    for key in candidates {
        if referenced.contains(key) {
            continue;
        }
        store.delete(ctx, key).await?;
        outcome.deleted += 1;
    }

    info!(
        ctx.logger(),
        "gc pass complete";
        "scanned" => outcome.scanned,
        "deleted" => outcome.deleted,
    );
    Ok(outcome)
}
