use blobstore::{Blobstore, ContentStore, StoredBlob, Upload};
use bytes::Bytes;
use registry_types::{ContentHash, RegistryContext};

use crate::error::UploadPipelineError;

/// `NewUpload(expires) -> (upload-id, part-size-bounds, expiry)`.
pub fn new_upload<B: Blobstore>(
    ctx: &RegistryContext,
    content_store: &ContentStore<B>,
    expires_in_secs: u64,
) -> Result<Upload, UploadPipelineError> {
    Ok(content_store.new_upload(ctx, expires_in_secs)?)
}

/// `PutPart(upload-id, part-number, hash, stream, content-length)`. The
/// caller is expected to have already drained the whole body into `data`
/// before calling this — the "stream body is fully consumed even on early
/// validation failure" rule from SPEC_FULL.md §4.8 is an HTTP-layer
/// concern, not this function's.
pub async fn put_part<B: Blobstore>(
    ctx: &RegistryContext,
    content_store: &ContentStore<B>,
    upload_id: &str,
    part_number: u32,
    data: Bytes,
    expected_hash: ContentHash,
) -> Result<(), UploadPipelineError> {
    content_store.put_part(ctx, upload_id, part_number, data, expected_hash).await?;
    Ok(())
}

/// `FinishUpload(upload-id, [part-hashes]) -> aggregate-hash`.
pub async fn finish_upload<B: Blobstore>(
    ctx: &RegistryContext,
    content_store: &ContentStore<B>,
    upload_id: &str,
    part_hashes: &[ContentHash],
) -> Result<StoredBlob, UploadPipelineError> {
    Ok(content_store.finish_upload(ctx, upload_id, part_hashes).await?)
}
