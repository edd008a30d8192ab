use registry_types::{Principal, RegistryConfig};

/// Basic authentication recognizes exactly one principal: the configured
/// admin. Password verification is out of scope (the same opaque-predicate
/// treatment as bearer tokens); a claimed user matching `admin_principal`
/// is accepted.
pub fn authenticate_basic(config: &RegistryConfig, claimed_user: &str) -> Option<Principal> {
    if claimed_user == config.admin_principal {
        Some(Principal {
            user: claimed_user.to_string(),
            groups: Vec::new(),
            is_admin: true,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_the_configured_admin() {
        let config = RegistryConfig::default();
        let principal = authenticate_basic(&config, &config.admin_principal).unwrap();
        assert!(principal.is_admin);
    }

    #[test]
    fn rejects_any_other_claimed_user() {
        let config = RegistryConfig::default();
        assert!(authenticate_basic(&config, "mallory").is_none());
    }
}
