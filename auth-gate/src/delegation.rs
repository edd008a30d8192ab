use chrono::{DateTime, Utc};
use registry_types::{BaseIdentifier, Channel, RegistryConfig};

use crate::error::AuthGateError;

/// A short-lived credential the core minted itself, restricted to a set of
/// `(base-entity, channel)` pairs via `is-entity` caveats. An empty
/// restriction set is unrestricted.
#[derive(Clone, Debug)]
pub struct DelegatableCredential {
    pub token: String,
    pub user: String,
    pub restrictions: Vec<(BaseIdentifier, Channel)>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub fn mint(
    config: &RegistryConfig,
    user: impl Into<String>,
    restrictions: Vec<(BaseIdentifier, Channel)>,
) -> DelegatableCredential {
    let issued_at = Utc::now();
    let ttl = chrono::Duration::from_std(config.delegatable_credential_ttl).unwrap_or(chrono::Duration::zero());
    DelegatableCredential {
        token: format!("{:032x}", rand::random::<u128>()),
        user: user.into(),
        restrictions,
        issued_at,
        expires_at: issued_at + ttl,
    }
}

fn renewal_window(config: &RegistryConfig) -> chrono::Duration {
    chrono::Duration::from_std(config.delegatable_credential_renewal_window).unwrap_or(chrono::Duration::zero())
}

/// Mints a fresh credential carrying forward the same user and
/// restrictions, provided `credential` is inside its renewal window and not
/// already expired.
pub fn renew(
    config: &RegistryConfig,
    credential: &DelegatableCredential,
    now: DateTime<Utc>,
) -> Result<DelegatableCredential, AuthGateError> {
    if now >= credential.expires_at {
        return Err(AuthGateError::CredentialExpired);
    }
    if now < credential.expires_at - renewal_window(config) {
        return Err(AuthGateError::NotRenewable);
    }
    Ok(mint(config, credential.user.clone(), credential.restrictions.clone()))
}

/// The `is-entity` caveat check: does this credential authorize acting on
/// `(base, channel)`?
pub fn check_entity_caveat(credential: &DelegatableCredential, base: &BaseIdentifier, channel: Channel) -> bool {
    credential.restrictions.is_empty()
        || credential
            .restrictions
            .iter()
            .any(|(b, c)| b == base && *c == channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(name: &str) -> BaseIdentifier {
        BaseIdentifier {
            owner: Some("alice".to_string()),
            name: name.to_string(),
        }
    }

    #[test]
    fn unrestricted_credential_authorizes_anything() {
        let config = RegistryConfig::default();
        let credential = mint(&config, "alice", vec![]);
        assert!(check_entity_caveat(&credential, &base("demo"), Channel::Stable));
    }

    #[test]
    fn restricted_credential_rejects_other_entities() {
        let config = RegistryConfig::default();
        let credential = mint(&config, "alice", vec![(base("demo"), Channel::Edge)]);
        assert!(check_entity_caveat(&credential, &base("demo"), Channel::Edge));
        assert!(!check_entity_caveat(&credential, &base("other"), Channel::Edge));
        assert!(!check_entity_caveat(&credential, &base("demo"), Channel::Stable));
    }

    #[test]
    fn renew_fails_before_the_renewal_window_opens() {
        let config = RegistryConfig::default();
        let credential = mint(&config, "alice", vec![]);
        let err = renew(&config, &credential, credential.issued_at).unwrap_err();
        assert!(matches!(err, AuthGateError::NotRenewable));
    }

    #[test]
    fn renew_succeeds_inside_the_renewal_window() {
        let config = RegistryConfig::default();
        let credential = mint(&config, "alice", vec![]);
        let inside_window = credential.expires_at
            - chrono::Duration::from_std(config.delegatable_credential_renewal_window).unwrap() / 2;
        let renewed = renew(&config, &credential, inside_window).unwrap();
        assert_eq!(renewed.user, "alice");
        assert!(renewed.expires_at > credential.expires_at);
    }

    #[test]
    fn renew_fails_once_already_expired() {
        let config = RegistryConfig::default();
        let credential = mint(&config, "alice", vec![]);
        let err = renew(&config, &credential, credential.expires_at).unwrap_err();
        assert!(matches!(err, AuthGateError::CredentialExpired));
    }
}
