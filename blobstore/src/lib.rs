//! Content-addressed byte storage (SPEC_FULL.md §4.1).
//!
//! `Blobstore` is the raw opaque-key byte store (mirrors the teacher's
//! `Blobstore` trait seam: get/put/is_present against a flat namespace).
//! `ContentStore` layers hash verification and multipart upload sessions on
//! top of any `Blobstore` implementation, and is the thing the rest of the
//! registry depends on.

mod file;
mod gc;
mod mem;
pub mod multipart;

use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use registry_types::{ContentHash, RegistryContext};
use thiserror::Error;

pub use file::FileBlobstore;
pub use gc::{run_gc_pass, GcOutcome, GcReferenceSource};
pub use mem::MemBlobstore;
pub use multipart::{MultipartUploadTable, PartRecord, Upload, UploadError};

#[derive(Debug, Error)]
pub enum BlobstoreError {
    #[error("blob {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// An opaque-key byte store. Implementations never interpret `key`; the
/// content-addressing scheme lives one layer up in `ContentStore`.
#[async_trait]
pub trait Blobstore: Send + Sync + 'static {
    async fn put(&self, ctx: &RegistryContext, key: &str, data: Bytes) -> anyhow::Result<()>;

    async fn get(&self, ctx: &RegistryContext, key: &str) -> anyhow::Result<Option<Bytes>>;

    async fn get_range(
        &self,
        ctx: &RegistryContext,
        key: &str,
        range: Range<u64>,
    ) -> anyhow::Result<Option<Bytes>> {
        let data = match self.get(ctx, key).await? {
            Some(data) => data,
            None => return Ok(None),
        };
        let start = (range.start as usize).min(data.len());
        let end = (range.end as usize).min(data.len());
        Ok(Some(data.slice(start..end)))
    }

    async fn is_present(&self, ctx: &RegistryContext, key: &str) -> anyhow::Result<bool>;

    async fn delete(&self, ctx: &RegistryContext, key: &str) -> anyhow::Result<()>;

    /// Enumerates every key currently stored. Used only by the GC worker;
    /// backends that can't do this cheaply should restrict themselves to
    /// small deployments (as the teacher's `fileblob` does via `walkdir`).
    async fn list_keys(&self, ctx: &RegistryContext) -> anyhow::Result<Vec<String>>;
}

/// One successfully stored blob: its opaque handle plus the digest and size
/// that were verified against it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredBlob {
    pub blob_name: String,
    pub hash: ContentHash,
    pub size: u64,
}

/// The content-addressed store the rest of the registry talks to. Generic
/// over the underlying raw `Blobstore` so tests run against `MemBlobstore`
/// and a real deployment swaps in `FileBlobstore` (or a future networked
/// backend) without touching any caller.
pub struct ContentStore<B: Blobstore> {
    raw: Arc<B>,
    uploads: MultipartUploadTable,
}

impl<B: Blobstore> ContentStore<B> {
    pub fn new(raw: Arc<B>) -> Self {
        ContentStore {
            raw,
            uploads: MultipartUploadTable::new(),
        }
    }

    pub fn raw(&self) -> &Arc<B> {
        &self.raw
    }

    /// `Put(stream, expected-hash, size) -> blob-name`. Fails `HashMismatch`
    /// if the computed digest disagrees with `expected_hash`.
    pub async fn put(
        &self,
        ctx: &RegistryContext,
        data: Bytes,
        expected_hash: ContentHash,
    ) -> anyhow::Result<StoredBlob> {
        let computed = ContentHash::hash_bytes(&data);
        if computed != expected_hash {
            return Err(registry_types::ErrorKind::HashMismatch {
                expected: expected_hash.to_string(),
                computed: computed.to_string(),
            }
            .into());
        }
        let size = data.len() as u64;
        let blob_name = new_blob_name(&computed);
        self.raw.put(ctx, &blob_name, data).await?;
        slog::debug!(ctx.logger(), "stored blob"; "blob_name" => &blob_name, "hash" => %computed);
        Ok(StoredBlob {
            blob_name,
            hash: computed,
            size,
        })
    }

    /// `Open(blob-name) -> (bytes, size, hash)`.
    pub async fn open(&self, ctx: &RegistryContext, blob_name: &str) -> anyhow::Result<(Bytes, u64, ContentHash)> {
        let data = self
            .raw
            .get(ctx, blob_name)
            .await?
            .ok_or_else(|| BlobstoreError::NotFound(blob_name.to_string()))?;
        let hash = ContentHash::hash_bytes(&data);
        let size = data.len() as u64;
        Ok((data, size, hash))
    }

    pub async fn open_range(
        &self,
        ctx: &RegistryContext,
        blob_name: &str,
        range: Range<u64>,
    ) -> anyhow::Result<Bytes> {
        self.raw
            .get_range(ctx, blob_name, range)
            .await?
            .ok_or_else(|| BlobstoreError::NotFound(blob_name.to_string()).into())
    }

    pub fn new_upload(&self, ctx: &RegistryContext, expiry_secs: u64) -> anyhow::Result<Upload> {
        let max = ctx.config().max_upload_expiry.as_secs();
        if expiry_secs > max {
            return Err(registry_types::ErrorKind::BadRequest(format!(
                "upload expiry {expiry_secs}s exceeds maximum of {max}s"
            ))
            .into());
        }
        Ok(self.uploads.create(
            ctx.principal().user.clone(),
            expiry_secs,
            ctx.config().min_part_size,
            ctx.config().max_part_size,
            ctx.config().max_upload_parts,
        ))
    }

    pub async fn put_part(
        &self,
        ctx: &RegistryContext,
        upload_id: &str,
        part_number: u32,
        data: Bytes,
        expected_hash: ContentHash,
    ) -> anyhow::Result<()> {
        let computed = ContentHash::hash_bytes(&data);
        if computed != expected_hash {
            return Err(registry_types::ErrorKind::HashMismatch {
                expected: expected_hash.to_string(),
                computed: computed.to_string(),
            }
            .into());
        }
        let size = data.len() as u64;
        self.uploads.put_part(upload_id, part_number, computed, size)?;
        let part_key = part_key(upload_id, part_number);
        self.raw.put(ctx, &part_key, data).await?;
        Ok(())
    }

    pub async fn finish_upload(
        &self,
        ctx: &RegistryContext,
        upload_id: &str,
        part_hashes: &[ContentHash],
    ) -> anyhow::Result<StoredBlob> {
        // A retried finish (the client never saw the first response) must
        // not re-read part blobs that an earlier call already deleted.
        if let Some(cached) = self.uploads.finished_result(upload_id)? {
            return Ok(StoredBlob {
                blob_name: cached.blob_name,
                hash: cached.hash,
                size: cached.size,
            });
        }

        let parts = self.uploads.finish(upload_id, part_hashes)?;

        let mut buffer = Vec::new();
        for (part_number, _record) in &parts {
            let key = part_key(upload_id, *part_number);
            let chunk = self
                .raw
                .get(ctx, &key)
                .await?
                .ok_or_else(|| BlobstoreError::NotFound(key.clone()))?;
            buffer.extend_from_slice(&chunk);
        }
        let data = Bytes::from(buffer);
        let aggregate = ContentHash::hash_bytes(&data);
        let blob_name = new_blob_name(&aggregate);
        let size = data.len() as u64;
        self.raw.put(ctx, &blob_name, data).await?;

        for (part_number, _) in &parts {
            let key = part_key(upload_id, *part_number);
            self.raw.delete(ctx, &key).await.ok();
        }
        let result = multipart::FinishedUpload {
            blob_name: blob_name.clone(),
            hash: aggregate,
            size,
        };
        self.uploads.mark_finished(upload_id, result)?;

        slog::info!(ctx.logger(), "finished multipart upload";
            "upload_id" => upload_id, "blob_name" => &blob_name, "hash" => %aggregate);
        Ok(StoredBlob {
            blob_name,
            hash: aggregate,
            size,
        })
    }

    pub async fn abort_upload(&self, ctx: &RegistryContext, upload_id: &str) -> anyhow::Result<()> {
        let parts = self.uploads.abort(upload_id)?;
        for part_number in parts {
            let key = part_key(upload_id, part_number);
            self.raw.delete(ctx, &key).await.ok();
        }
        Ok(())
    }

    /// Reaps a single expired upload session, deleting any part blobs it had
    /// committed. Call for every id returned by `uploads().expired_upload_ids()`.
    pub async fn reap_expired_upload(&self, ctx: &RegistryContext, upload_id: &str) {
        let parts = self.uploads.reap_expired(upload_id);
        for part_number in parts {
            let key = part_key(upload_id, part_number);
            self.raw.delete(ctx, &key).await.ok();
        }
    }

    pub fn uploads(&self) -> &MultipartUploadTable {
        &self.uploads
    }
}

fn part_key(upload_id: &str, part_number: u32) -> String {
    format!("parts/{upload_id}/{part_number}")
}

/// Builds an opaque blob handle from a digest plus a random suffix, so two
/// `Put`s of identical content may land at different blob-names while
/// hashing identically (SPEC_FULL.md §4.1).
fn new_blob_name(hash: &ContentHash) -> String {
    let suffix: u64 = rand::random();
    format!("blobs/{hash}-{suffix:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_types::RegistryContext;
    use std::sync::Arc;

    fn store() -> ContentStore<MemBlobstore> {
        ContentStore::new(Arc::new(MemBlobstore::new()))
    }

    #[tokio::test]
    async fn put_and_open_round_trip() {
        let ctx = RegistryContext::test_context();
        let cs = store();
        let data = Bytes::from_static(b"hello, world");
        let hash = ContentHash::hash_bytes(&data);
        let stored = cs.put(&ctx, data.clone(), hash).await.unwrap();
        let (opened, size, opened_hash) = cs.open(&ctx, &stored.blob_name).await.unwrap();
        assert_eq!(opened, data);
        assert_eq!(size, data.len() as u64);
        assert_eq!(opened_hash, hash);
    }

    #[tokio::test]
    async fn put_rejects_hash_mismatch() {
        let ctx = RegistryContext::test_context();
        let cs = store();
        let wrong = ContentHash::hash_bytes(b"not this");
        let err = cs.put(&ctx, Bytes::from_static(b"hello"), wrong).await.unwrap_err();
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[tokio::test]
    async fn identical_content_different_blob_names() {
        let ctx = RegistryContext::test_context();
        let cs = store();
        let data = Bytes::from_static(b"same bytes");
        let hash = ContentHash::hash_bytes(&data);
        let a = cs.put(&ctx, data.clone(), hash).await.unwrap();
        let b = cs.put(&ctx, data.clone(), hash).await.unwrap();
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.blob_name, b.blob_name);
    }

    #[tokio::test]
    async fn multipart_upload_round_trip() {
        let ctx = RegistryContext::test_context();
        let cs = store();
        let upload = cs.new_upload(&ctx, 120).unwrap();

        let part0 = Bytes::from(vec![1u8; 5 * 1024 * 1024]);
        let part1 = Bytes::from(vec![2u8; 1024]);
        let h0 = ContentHash::hash_bytes(&part0);
        let h1 = ContentHash::hash_bytes(&part1);

        cs.put_part(&ctx, &upload.id, 0, part0.clone(), h0).await.unwrap();
        cs.put_part(&ctx, &upload.id, 1, part1.clone(), h1).await.unwrap();

        let finished = cs.finish_upload(&ctx, &upload.id, &[h0, h1]).await.unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(&part0);
        expected.extend_from_slice(&part1);
        assert_eq!(finished.hash, ContentHash::hash_bytes(&expected));

        let (opened, ..) = cs.open(&ctx, &finished.blob_name).await.unwrap();
        assert_eq!(opened, Bytes::from(expected));
    }

    #[tokio::test]
    async fn finish_upload_is_idempotent() {
        let ctx = RegistryContext::test_context();
        let cs = store();
        let upload = cs.new_upload(&ctx, 120).unwrap();
        let part = Bytes::from_static(b"only part");
        let h = ContentHash::hash_bytes(&part);
        cs.put_part(&ctx, &upload.id, 0, part, h).await.unwrap();

        let first = cs.finish_upload(&ctx, &upload.id, &[h]).await.unwrap();
        let second = cs.finish_upload(&ctx, &upload.id, &[h]).await.unwrap();
        assert_eq!(first.hash, second.hash);
    }

    #[tokio::test]
    async fn reap_expired_upload_deletes_part_blobs() {
        let ctx = RegistryContext::test_context();
        let cs = store();
        let upload = cs.new_upload(&ctx, 0).unwrap();
        let part = Bytes::from_static(b"orphaned");
        let h = ContentHash::hash_bytes(&part);
        cs.put_part(&ctx, &upload.id, 0, part, h).await.unwrap();

        let key = part_key(&upload.id, 0);
        assert!(cs.raw.is_present(&ctx, &key).await.unwrap());

        cs.reap_expired_upload(&ctx, &upload.id).await;
        assert!(!cs.raw.is_present(&ctx, &key).await.unwrap());
    }

    #[tokio::test]
    async fn abort_upload_discards_parts() {
        let ctx = RegistryContext::test_context();
        let cs = store();
        let upload = cs.new_upload(&ctx, 120).unwrap();
        let part = Bytes::from_static(b"abandoned");
        let h = ContentHash::hash_bytes(&part);
        cs.put_part(&ctx, &upload.id, 0, part, h).await.unwrap();
        cs.abort_upload(&ctx, &upload.id).await.unwrap();

        let err = cs.finish_upload(&ctx, &upload.id, &[h]).await.unwrap_err();
        assert!(err.to_string().contains("not found") || err.to_string().contains("aborted"));
    }
}
