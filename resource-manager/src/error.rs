use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceManagerError {
    #[error("{entity} does not declare a resource named `{name}`")]
    UndeclaredResource { entity: String, name: String },
    #[error("resources cannot be uploaded to a bundle")]
    BundleResourceForbidden,
    #[error("resource `{name}` is declared as {declared:?} but upload supplied {supplied:?}")]
    TypeMismatch {
        name: String,
        declared: &'static str,
        supplied: &'static str,
    },
    #[error("filename `{filename}` does not match declared extension `{expected}`")]
    ExtensionMismatch { filename: String, expected: String },
    #[error("docker-typed resource manifest is invalid: {0}")]
    InvalidManifest(String),
    #[error("{0} is not permitted to write to {1}")]
    Forbidden(String, String),
    #[error("no channel pin exists for this resource")]
    NoChannelPin,
    #[error(transparent)]
    Store(#[from] metadata_store::StoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
