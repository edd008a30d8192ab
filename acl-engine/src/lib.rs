//! Per-`(base-id, channel)` ACL evaluation (SPEC_FULL.md §4.7). Storage for
//! the ACLs themselves lives on `BaseEntity` in `metadata-store`; this crate
//! only holds the `Allow` predicate and the admin/read-only override.

use metadata_store::ChannelAcl;
use registry_types::{Principal, RegistryConfig};

const EVERYONE: &str = "everyone";

fn principal_matches(list: &[String], principal: &Principal) -> bool {
    list.iter()
        .any(|entry| entry == EVERYONE || entry == &principal.user || principal.groups.contains(entry))
}

/// `Allow(acl, user, groups)`: true iff `acl` contains `everyone`, the user
/// name, or any group the user is in.
pub fn allow_read(acl: &ChannelAcl, principal: &Principal) -> bool {
    principal.is_admin || principal_matches(&acl.read, principal)
}

/// Like `allow_read`, but an admin's bypass is itself overridden when the
/// registry is running in read-only mode.
pub fn allow_write(config: &RegistryConfig, acl: &ChannelAcl, principal: &Principal) -> bool {
    if config.read_only {
        return false;
    }
    principal.is_admin || principal_matches(&acl.write, principal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acl(read: &[&str], write: &[&str]) -> ChannelAcl {
        ChannelAcl {
            read: read.iter().map(|s| s.to_string()).collect(),
            write: write.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn principal(user: &str, groups: &[&str], is_admin: bool) -> Principal {
        Principal {
            user: user.to_string(),
            groups: groups.iter().map(|s| s.to_string()).collect(),
            is_admin,
        }
    }

    #[test]
    fn allows_named_user() {
        let acl = acl(&["alice"], &[]);
        assert!(allow_read(&acl, &principal("alice", &[], false)));
        assert!(!allow_read(&acl, &principal("bob", &[], false)));
    }

    #[test]
    fn allows_everyone_entry() {
        let acl = acl(&["everyone"], &[]);
        assert!(allow_read(&acl, &principal("bob", &[], false)));
    }

    #[test]
    fn allows_group_membership() {
        let acl = acl(&["team-ops"], &[]);
        assert!(allow_read(&acl, &principal("bob", &["team-ops"], false)));
    }

    #[test]
    fn admin_bypasses_acl() {
        let acl = acl(&[], &[]);
        assert!(allow_read(&acl, &principal("root", &[], true)));
        let config = RegistryConfig::default();
        assert!(allow_write(&config, &acl, &principal("root", &[], true)));
    }

    #[test]
    fn read_only_mode_rejects_all_writes_even_for_admin() {
        let acl = acl(&[], &["alice"]);
        let mut config = RegistryConfig::default();
        config.read_only = true;
        assert!(!allow_write(&config, &acl, &principal("alice", &[], false)));
        assert!(!allow_write(&config, &acl, &principal("root", &[], true)));
    }
}
