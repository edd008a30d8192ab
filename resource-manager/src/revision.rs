use metadata_store::Resource;

/// `revision := max(existing revisions of (base, name)) + 1` (SPEC_FULL.md
/// §4.4). A fresh resource name starts at revision 0.
pub fn allocate_resource_revision(existing: &[Resource]) -> i64 {
    existing.iter().map(|r| r.revision).max().map_or(0, |max| max + 1)
}
