use std::collections::HashMap;
use std::ops::Range;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use registry_types::RegistryContext;

use crate::Blobstore;

/// In-memory `Blobstore`, used by unit tests and by the reference
/// single-process deployment described in SPEC_FULL.md §4.1.1.
#[derive(Default)]
pub struct MemBlobstore {
    data: RwLock<HashMap<String, Bytes>>,
}

impl MemBlobstore {
    pub fn new() -> Self {
        MemBlobstore {
            data: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Blobstore for MemBlobstore {
    async fn put(&self, _ctx: &RegistryContext, key: &str, data: Bytes) -> anyhow::Result<()> {
        self.data.write().insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, _ctx: &RegistryContext, key: &str) -> anyhow::Result<Option<Bytes>> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn get_range(
        &self,
        _ctx: &RegistryContext,
        key: &str,
        range: Range<u64>,
    ) -> anyhow::Result<Option<Bytes>> {
        let Some(full) = self.data.read().get(key).cloned() else {
            return Ok(None);
        };
        let start = range.start.min(full.len() as u64) as usize;
        let end = range.end.min(full.len() as u64) as usize;
        Ok(Some(full.slice(start..end)))
    }

    async fn is_present(&self, _ctx: &RegistryContext, key: &str) -> anyhow::Result<bool> {
        Ok(self.data.read().contains_key(key))
    }

    async fn delete(&self, _ctx: &RegistryContext, key: &str) -> anyhow::Result<()> {
        self.data.write().remove(key);
        Ok(())
    }

    async fn list_keys(&self, _ctx: &RegistryContext) -> anyhow::Result<Vec<String>> {
        Ok(self.data.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemBlobstore::new();
        let ctx = RegistryContext::test_context();
        store.put(&ctx, "k", Bytes::from_static(b"hello")).await.unwrap();
        let got = store.get(&ctx, "k").await.unwrap();
        assert_eq!(got, Some(Bytes::from_static(b"hello")));
    }

    #[tokio::test]
    async fn get_range_slices_stored_bytes() {
        let store = MemBlobstore::new();
        let ctx = RegistryContext::test_context();
        store.put(&ctx, "k", Bytes::from_static(b"0123456789")).await.unwrap();
        let got = store.get_range(&ctx, "k", 2..5).await.unwrap();
        assert_eq!(got, Some(Bytes::from_static(b"234")));
    }

    #[tokio::test]
    async fn list_keys_filters_by_prefix() {
        let store = MemBlobstore::new();
        let ctx = RegistryContext::test_context();
        store.put(&ctx, "parts/a/0", Bytes::new()).await.unwrap();
        store.put(&ctx, "parts/a/1", Bytes::new()).await.unwrap();
        store.put(&ctx, "blobs/x", Bytes::new()).await.unwrap();
        let mut keys: Vec<String> = store
            .list_keys(&ctx)
            .await
            .unwrap()
            .into_iter()
            .filter(|k| k.starts_with("parts/a/"))
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["parts/a/0".to_string(), "parts/a/1".to_string()]);
    }

    #[tokio::test]
    async fn delete_removes_key() {
        let store = MemBlobstore::new();
        let ctx = RegistryContext::test_context();
        store.put(&ctx, "k", Bytes::new()).await.unwrap();
        store.delete(&ctx, "k").await.unwrap();
        assert!(!store.is_present(&ctx, "k").await.unwrap());
    }
}
