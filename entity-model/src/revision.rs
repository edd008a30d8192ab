use metadata_store::Entity;

/// Allocates the next revision for a new upload to `(owner, name)`, given
/// every existing entity of that base. `uploading_multi_series` is true when
/// the incoming upload has no series component (SPEC_FULL.md §4.3).
///
/// Multi-series and single-series revisions share one monotonic sequence:
/// a multi-series upload must land past every existing single-series
/// revision too, so that a later single-series upload never collides with
/// a number already claimed by the multi-series line.
pub fn allocate_revision(existing: &[Entity], uploading_multi_series: bool) -> i64 {
    let max_existing = existing.iter().map(|e| e.revision()).max().unwrap_or(-1);
    let mut revision = max_existing + 1;
    if uploading_multi_series {
        let max_single_series = existing
            .iter()
            .filter(|e| e.identifier.series.is_some())
            .map(|e| e.revision())
            .max()
            .unwrap_or(-1);
        revision = revision.max(max_single_series + 1);
    }
    revision
}

/// Allocates the next promulgated revision for `name`, given every existing
/// promulgated entity sharing that name across owners.
pub fn allocate_promulgated_revision(existing_promulgated: &[Entity]) -> i64 {
    existing_promulgated
        .iter()
        .map(|e| e.promulgated_revision)
        .max()
        .unwrap_or(-1)
        + 1
}
