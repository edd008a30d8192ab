use std::ops::Range;
use std::path::PathBuf;

use async_trait::async_trait;
use blake2::Digest;
use bytes::Bytes;
use registry_types::RegistryContext;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Blobstore;

/// Directory-backed `Blobstore`. Keys are sharded two levels deep by the
/// first four hex digits of a hash of the key, mirroring the teacher's
/// `fileblob` layout (`aa/bb/<hash>`) so that no single directory ends up
/// with millions of entries.
pub struct FileBlobstore {
    root: PathBuf,
}

impl FileBlobstore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileBlobstore { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = blake2::Blake2s256::digest(key.as_bytes());
        let shard_a = hex::encode(&digest[0..1]);
        let shard_b = hex::encode(&digest[1..2]);
        let filename = percent_encoding::utf8_percent_encode(key, FILENAME_ENCODE_SET).to_string();
        self.root.join(shard_a).join(shard_b).join(filename)
    }
}

const FILENAME_ENCODE_SET: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

#[async_trait]
impl Blobstore for FileBlobstore {
    async fn put(&self, _ctx: &RegistryContext, key: &str, data: Bytes) -> anyhow::Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;
        fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    async fn get(&self, _ctx: &RegistryContext, key: &str) -> anyhow::Result<Option<Bytes>> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_range(
        &self,
        ctx: &RegistryContext,
        key: &str,
        range: Range<u64>,
    ) -> anyhow::Result<Option<Bytes>> {
        let Some(full) = self.get(ctx, key).await? else {
            return Ok(None);
        };
        let start = range.start.min(full.len() as u64) as usize;
        let end = range.end.min(full.len() as u64) as usize;
        Ok(Some(full.slice(start..end)))
    }

    async fn is_present(&self, _ctx: &RegistryContext, key: &str) -> anyhow::Result<bool> {
        Ok(fs::metadata(self.path_for(key)).await.is_ok())
    }

    async fn delete(&self, _ctx: &RegistryContext, key: &str) -> anyhow::Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self, _ctx: &RegistryContext) -> anyhow::Result<Vec<String>> {
        let mut out = Vec::new();
        let mut shard_a_dirs = match fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };
        while let Some(shard_a) = shard_a_dirs.next_entry().await? {
            if !shard_a.file_type().await?.is_dir() {
                continue;
            }
            let mut shard_b_dirs = fs::read_dir(shard_a.path()).await?;
            while let Some(shard_b) = shard_b_dirs.next_entry().await? {
                if !shard_b.file_type().await?.is_dir() {
                    continue;
                }
                let mut files = fs::read_dir(shard_b.path()).await?;
                while let Some(entry) = files.next_entry().await? {
                    if let Some(name) = entry.file_name().to_str() {
                        if let Ok(decoded) =
                            percent_encoding::percent_decode_str(name).decode_utf8()
                        {
                            out.push(decoded.into_owned());
                        }
                    }
                }
            }
        }
        Ok(out)
    }
}
