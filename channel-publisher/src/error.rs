use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelPublisherError {
    #[error("{0} does not exist")]
    EntityNotFound(String),
    #[error("channel `unpublished` cannot be a publication target")]
    UnpublishableChannel,
    #[error("required resource `{0}` was not supplied")]
    MissingResource(String),
    #[error("resource `{name}` revision {revision} does not exist")]
    UnknownResourceRevision { name: String, revision: i64 },
    #[error("{0} is currently pinned on channel `{1}` and cannot be deleted")]
    PinnedRevision(String, registry_types::Channel),
    #[error("{0} is not permitted to write to {1}")]
    Forbidden(String, String),
    #[error(transparent)]
    Store(#[from] metadata_store::StoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
