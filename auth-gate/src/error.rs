use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthGateError {
    #[error("bearer token rejected")]
    InvalidBearer,
    #[error("credential has expired")]
    CredentialExpired,
    #[error("credential is not yet within its renewal window")]
    NotRenewable,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
