use std::sync::Arc;

use blobstore::ContentStore;
use gotham_derive::StateData;
use metadata_store::{InMemoryMetadataStore, MetadataStore};
use registry_types::{Principal, RegistryConfig, RegistryContext};
use slog::Logger;

use crate::backend::AnyBlobstore;

/// The process-wide component stack, handed to every request handler via
/// gotham's `StateMiddleware`. Mirrors `RegistryContext`'s own rule against
/// singletons: this is constructed once at start-up and threaded through,
/// not reached for globally.
#[derive(Clone, StateData)]
pub struct AppState {
    logger: Logger,
    config: Arc<RegistryConfig>,
    metadata: Arc<InMemoryMetadataStore>,
    content_store: Arc<ContentStore<AnyBlobstore>>,
}

impl AppState {
    pub fn new(logger: Logger, config: Arc<RegistryConfig>, blobstore: AnyBlobstore) -> Self {
        AppState {
            logger,
            config,
            metadata: Arc::new(InMemoryMetadataStore::new()),
            content_store: Arc::new(ContentStore::new(Arc::new(blobstore))),
        }
    }

    pub fn metadata(&self) -> &Arc<InMemoryMetadataStore> {
        &self.metadata
    }

    pub fn metadata_dyn(&self) -> &dyn MetadataStore {
        self.metadata.as_ref()
    }

    pub fn content_store(&self) -> &Arc<ContentStore<AnyBlobstore>> {
        &self.content_store
    }

    pub fn config(&self) -> &Arc<RegistryConfig> {
        &self.config
    }

    /// A `RegistryContext` for a request executing as `principal`. Real
    /// identity extraction is AuthGate's job; wiring that into gotham's
    /// request pipeline is routing glue this crate leaves minimal.
    pub fn context_as(&self, principal: Principal) -> RegistryContext {
        RegistryContext::new(self.logger.clone(), self.config.clone(), principal)
    }

    pub fn anonymous_context(&self) -> RegistryContext {
        self.context_as(Principal::anonymous())
    }
}
