/// A coarse distribution family, used only to reject an upload whose
/// declared series mix across incompatible families (SPEC_FULL.md §4.3(e)).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DistributionFamily {
    Ubuntu,
    Centos,
    Windows,
    Unknown,
}

/// Series known to the registry, with an LTS weight used to break ties when
/// a multi-series charm is queried without a series (higher wins).
fn series_table(series: &str) -> (DistributionFamily, u32) {
    match series {
        "precise" => (DistributionFamily::Ubuntu, 10),
        "trusty" => (DistributionFamily::Ubuntu, 20),
        "xenial" => (DistributionFamily::Ubuntu, 30),
        "utopic" | "vivid" | "wily" | "yakkety" => (DistributionFamily::Ubuntu, 5),
        "centos7" => (DistributionFamily::Centos, 10),
        "win2012" | "win2012r2" | "win2012hv" | "win2012hvr2" => (DistributionFamily::Windows, 10),
        "bundle" => (DistributionFamily::Unknown, 0),
        _ => (DistributionFamily::Unknown, 0),
    }
}

pub fn distribution_family(series: &str) -> DistributionFamily {
    series_table(series).0
}

pub fn lts_weight(series: &str) -> u32 {
    series_table(series).1
}

/// Returns `Err` with the offending pair if `series` mixes more than one
/// non-`Unknown` distribution family.
pub fn check_single_family(series: &[String]) -> Result<(), (String, String)> {
    let mut chosen: Option<(DistributionFamily, &str)> = None;
    for s in series {
        let family = distribution_family(s);
        if family == DistributionFamily::Unknown {
            continue;
        }
        match chosen {
            None => chosen = Some((family, s.as_str())),
            Some((existing_family, existing_series)) if existing_family != family => {
                return Err((existing_series.to_string(), s.clone()));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Picks the highest-LTS-weighted series among `candidates`, used when a
/// multi-series charm is queried without a series (SPEC_FULL.md §4.3
/// tie-break 3).
pub fn best_series<'a>(candidates: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .max_by_key(|s| lts_weight(s))
        .map(|s| s.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mixed_families() {
        let series = vec!["trusty".to_string(), "centos7".to_string()];
        assert!(check_single_family(&series).is_err());
    }

    #[test]
    fn accepts_same_family() {
        let series = vec!["trusty".to_string(), "xenial".to_string()];
        assert!(check_single_family(&series).is_ok());
    }

    #[test]
    fn best_series_prefers_higher_weight() {
        let series = vec!["precise".to_string(), "xenial".to_string(), "trusty".to_string()];
        assert_eq!(best_series(&series), Some("xenial"));
    }
}
