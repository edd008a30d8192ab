use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::AuthGateError;

/// Verifies an opaque bearer token and resolves it to an identity. The core
/// never parses the token itself — that's the discharge service's job,
/// out of scope here (SPEC_FULL.md §4.9.1).
#[async_trait]
pub trait IdentityCollaborator: Send + Sync {
    async fn verify_bearer(&self, token: &str) -> Result<(String, Vec<String>), AuthGateError>;
}

/// A fixed user/group table, standing in for the real discharge service in
/// tests.
#[derive(Default)]
pub struct StaticIdentityCollaborator {
    tokens: HashMap<String, (String, Vec<String>)>,
}

impl StaticIdentityCollaborator {
    pub fn new() -> Self {
        StaticIdentityCollaborator::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, user: impl Into<String>, groups: Vec<String>) -> Self {
        self.tokens.insert(token.into(), (user.into(), groups));
        self
    }
}

#[async_trait]
impl IdentityCollaborator for StaticIdentityCollaborator {
    async fn verify_bearer(&self, token: &str) -> Result<(String, Vec<String>), AuthGateError> {
        self.tokens.get(token).cloned().ok_or(AuthGateError::InvalidBearer)
    }
}
