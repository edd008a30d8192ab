use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use slog::Logger;

use crate::ident::Channel;

/// Process-wide, immutable configuration, constructed once at start-up and
/// threaded through request context rather than held in a singleton (Design
/// Notes §9, "global mutable state").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub admin_principal: String,
    pub read_only: bool,
    pub max_upload_expiry: Duration,
    pub min_part_size: u64,
    pub max_part_size: u64,
    pub max_upload_parts: u32,
    /// Channels in search order, most stable first. Kept configurable so the
    /// open question in SPEC_FULL.md §9 about a fifth legacy channel can be
    /// revisited without a code change.
    pub channel_search_order: Vec<Channel>,
    pub delegatable_credential_ttl: Duration,
    pub delegatable_credential_renewal_window: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            admin_principal: "admin".to_string(),
            read_only: false,
            max_upload_expiry: Duration::from_secs(24 * 60 * 60),
            min_part_size: 5 * 1024 * 1024,
            max_part_size: 5 * 1024 * 1024 * 1024,
            max_upload_parts: 10_000,
            channel_search_order: Channel::SEARCH_ORDER.to_vec(),
            delegatable_credential_ttl: Duration::from_secs(60 * 60),
            delegatable_credential_renewal_window: Duration::from_secs(5 * 60),
        }
    }
}

/// The identity a request is executing as, resolved by AuthGate. `None`
/// means anonymous.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Principal {
    pub user: String,
    pub groups: Vec<String>,
    pub is_admin: bool,
}

impl Principal {
    pub fn anonymous() -> Self {
        Principal {
            user: "anonymous".to_string(),
            groups: Vec::new(),
            is_admin: false,
        }
    }
}

/// Threaded through every fallible async operation: logger, config, and the
/// caller's resolved identity. Mirrors the teacher's `CoreContext`, which
/// plays the same role of avoiding ambient/global state in request handling.
#[derive(Clone)]
pub struct RegistryContext {
    logger: Logger,
    config: Arc<RegistryConfig>,
    principal: Principal,
}

impl RegistryContext {
    pub fn new(logger: Logger, config: Arc<RegistryConfig>, principal: Principal) -> Self {
        RegistryContext {
            logger,
            config,
            principal,
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// A context derived from this one but impersonating a different
    /// principal; used by tests that need several identities against one
    /// shared component stack.
    pub fn with_principal(&self, principal: Principal) -> Self {
        RegistryContext {
            logger: self.logger.clone(),
            config: self.config.clone(),
            principal,
        }
    }

    /// Builds a context with a discarding logger and default config, for use
    /// from unit tests across every crate in the workspace.
    pub fn test_context() -> Self {
        use slog::{o, Discard};
        RegistryContext::new(
            Logger::root(Discard, o!()),
            Arc::new(RegistryConfig::default()),
            Principal::anonymous(),
        )
    }

    pub fn test_context_as(principal: Principal) -> Self {
        Self::test_context().with_principal(principal)
    }
}
