use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadPipelineError {
    #[error("gave up on the concurrent-upload retry after {0} attempts")]
    TooManyRetries(u32),
    #[error("{0} is not permitted to write to {1}")]
    Forbidden(String, String),
    #[error(transparent)]
    EntityModel(#[from] entity_model::EntityModelError),
    #[error(transparent)]
    ChannelPublisher(#[from] channel_publisher::ChannelPublisherError),
    #[error(transparent)]
    Store(#[from] metadata_store::StoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
