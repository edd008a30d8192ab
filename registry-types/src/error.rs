use thiserror::Error;

/// The uniform error taxonomy surfaced by every component, per SPEC_FULL.md §7.
/// HTTP-facing crates map this 1:1 onto a status code and `{Message, Code}`
/// body; library crates return it wrapped in `anyhow::Error` so callers can
/// still attach context with `.context(...)` without losing the kind.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid entity: {0}")]
    InvalidEntity(String),

    #[error("entity id not allowed: {0}")]
    EntityIdNotAllowed(String),

    #[error("duplicate upload for {0}")]
    DuplicateUpload(String),

    #[error("hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch { expected: String, computed: String },

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("registry is in read-only mode")]
    ReadOnly,
}

impl ErrorKind {
    /// A short machine-readable code, used as the HTTP body's `Code` field.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound(_) => "NotFound",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden(_) => "Forbidden",
            ErrorKind::BadRequest(_) => "BadRequest",
            ErrorKind::InvalidEntity(_) => "InvalidEntity",
            ErrorKind::EntityIdNotAllowed(_) => "EntityIdNotAllowed",
            ErrorKind::DuplicateUpload(_) => "DuplicateUpload",
            ErrorKind::HashMismatch { .. } => "HashMismatch",
            ErrorKind::Unavailable(_) => "Unavailable",
            ErrorKind::ReadOnly => "ReadOnly",
        }
    }

    /// Whether a caller may safely retry the operation unmodified.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Unavailable(_))
    }
}

/// Downcasts an `anyhow::Error` produced somewhere beneath a component
/// boundary back to the `ErrorKind` it was built from, falling back to
/// `Unavailable` for errors that genuinely came from outside this taxonomy
/// (e.g. an I/O error bubbling out of a storage backend).
pub fn downcast_kind(err: &anyhow::Error) -> Option<&ErrorKind> {
    err.downcast_ref::<ErrorKind>()
}
