use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntityModelError {
    #[error("archive is not a valid zip file: {0}")]
    InvalidArchive(String),
    #[error("{0} is missing from the archive")]
    MissingMetadata(&'static str),
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("identifier is not allowed for this upload: {0}")]
    EntityIdNotAllowed(String),
    #[error("bundle references {0}, which is not published on stable")]
    UnresolvedBundleCharm(String),
    #[error(transparent)]
    Store(#[from] metadata_store::StoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
