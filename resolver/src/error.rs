use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("no entity matches the query")]
    NotFound,
    #[error(transparent)]
    Store(#[from] metadata_store::StoreError),
}
