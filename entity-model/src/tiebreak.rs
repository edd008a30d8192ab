use metadata_store::Entity;

use crate::series::{best_series, lts_weight};

/// The LTS weight to tie-break on for one candidate: a single-series entity
/// is weighed on its own series, a multi-series entity (`identifier.series`
/// unset) on the highest-weighted series it supports.
fn series_weight(entity: &Entity) -> u32 {
    match &entity.identifier.series {
        Some(series) => lts_weight(series),
        None => best_series(&entity.supported_series).map(lts_weight).unwrap_or(0),
    }
}

/// Picks the preferred entity among candidates satisfying a partial query,
/// applying the tie-breaks from SPEC_FULL.md §4.3 in order: (1) higher
/// revision within the same series, (2) non-bundle over bundle when the
/// caller didn't specify a type, (3) higher LTS-weighted series when series
/// is unspecified, (4) higher promulgated-revision when the caller gave no
/// owner.
pub fn pick_best<'a>(
    candidates: &'a [Entity],
    owner_specified: bool,
    series_specified: bool,
) -> Option<&'a Entity> {
    candidates.iter().max_by(|a, b| {
        // (1) higher revision within the same series first.
        if a.identifier.series == b.identifier.series {
            if let ord @ (std::cmp::Ordering::Less | std::cmp::Ordering::Greater) =
                a.revision().cmp(&b.revision())
            {
                return ord;
            }
        }
        // (2) prefer non-bundle over bundle.
        let a_bundle = a.artifact.is_bundle();
        let b_bundle = b.artifact.is_bundle();
        if a_bundle != b_bundle {
            return (!a_bundle).cmp(&!b_bundle);
        }
        // (3) higher LTS-weighted series when the caller left series unset.
        if !series_specified {
            let a_weight = series_weight(a);
            let b_weight = series_weight(b);
            if let ord @ (std::cmp::Ordering::Less | std::cmp::Ordering::Greater) =
                a_weight.cmp(&b_weight)
            {
                return ord;
            }
        }
        // (4) higher promulgated-revision when the caller gave no owner.
        if !owner_specified {
            if let ord @ (std::cmp::Ordering::Less | std::cmp::Ordering::Greater) =
                a.promulgated_revision.cmp(&b.promulgated_revision)
            {
                return ord;
            }
        }
        a.revision().cmp(&b.revision())
    })
}
