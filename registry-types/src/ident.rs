use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed schema prefix carried by every textual identifier, e.g. `cs:~alice/trusty/foo-3`.
pub const SCHEMA: &str = "cs";

/// The five channel slots a base entity may be published on, in ascending
/// order of stability. `Unpublished` is implicit and can never be a
/// publication target (see ChannelPublisher §4.5).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Channel {
    Unpublished,
    Edge,
    Beta,
    Candidate,
    Stable,
}

impl Channel {
    /// Channels in the order the Resolver searches them when the caller did
    /// not pin a channel: most stable first.
    pub const SEARCH_ORDER: [Channel; 5] = [
        Channel::Stable,
        Channel::Candidate,
        Channel::Beta,
        Channel::Edge,
        Channel::Unpublished,
    ];

    /// The ordered, publishable channels (excludes `Unpublished`).
    pub const PUBLISHABLE: [Channel; 4] =
        [Channel::Edge, Channel::Beta, Channel::Candidate, Channel::Stable];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Unpublished => "unpublished",
            Channel::Edge => "edge",
            Channel::Beta => "beta",
            Channel::Candidate => "candidate",
            Channel::Stable => "stable",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("{0} is not a valid channel")]
pub struct ChannelParseError(pub String);

impl FromStr for Channel {
    type Err = ChannelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // Older deployments exposed a `development` channel; treat it as
            // an alias of `edge` (see SPEC_FULL.md §9 open question).
            "development" => Ok(Channel::Edge),
            "unpublished" => Ok(Channel::Unpublished),
            "edge" => Ok(Channel::Edge),
            "beta" => Ok(Channel::Beta),
            "candidate" => Ok(Channel::Candidate),
            "stable" => Ok(Channel::Stable),
            other => Err(ChannelParseError(other.to_string())),
        }
    }
}

/// A (possibly partial) entity identifier. `series` and `revision` are only
/// present once the caller has narrowed the query; `owner` is absent for a
/// promulgated query.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub owner: Option<String>,
    pub name: String,
    pub series: Option<String>,
    pub revision: Option<i64>,
}

/// `(owner, name)` with series and revision dropped — the key of a BaseEntity.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BaseIdentifier {
    pub owner: Option<String>,
    pub name: String,
}

impl Identifier {
    pub fn base(&self) -> BaseIdentifier {
        BaseIdentifier {
            owner: self.owner.clone(),
            name: self.name.clone(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.revision.is_some()
    }

    pub fn is_promulgated(&self) -> bool {
        self.owner.is_none()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", SCHEMA)?;
        if let Some(owner) = &self.owner {
            write!(f, "~{}/", owner)?;
        }
        if let Some(series) = &self.series {
            write!(f, "{}/", series)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(rev) = self.revision {
            write!(f, "-{}", rev)?;
        }
        Ok(())
    }
}

impl fmt::Display for BaseIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", SCHEMA)?;
        if let Some(owner) = &self.owner {
            write!(f, "~{}/", owner)?;
        }
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum IdentifierParseError {
    #[error("identifier is missing the `{}:` schema prefix", SCHEMA)]
    MissingSchema,
    #[error("identifier has no name component")]
    MissingName,
    #[error("revision suffix `{0}` is not a valid non-negative integer")]
    BadRevision(String),
}

/// Parses `<schema>:[~<owner>/][<series>/]<name>[-<revision>]`.
///
/// Series vs. name is disambiguated the way the original client tooling
/// does it: if there is exactly one `/`-separated segment after the owner,
/// it is the name; if there are two, the first is the series.
impl FromStr for Identifier {
    type Err = IdentifierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(SCHEMA)
            .and_then(|s| s.strip_prefix(':'))
            .ok_or(IdentifierParseError::MissingSchema)?;

        let (owner, rest) = if let Some(stripped) = rest.strip_prefix('~') {
            let (owner, rest) = stripped
                .split_once('/')
                .ok_or(IdentifierParseError::MissingName)?;
            (Some(owner.to_string()), rest)
        } else {
            (None, rest)
        };

        let segments: Vec<&str> = rest.split('/').collect();
        let (series, last) = match segments.as_slice() {
            [name] => (None, *name),
            [series, name] => (Some(series.to_string()), *name),
            _ => return Err(IdentifierParseError::MissingName),
        };

        if last.is_empty() {
            return Err(IdentifierParseError::MissingName);
        }

        let (name, revision) = match last.rsplit_once('-') {
            Some((name, rev_str)) if rev_str.chars().all(|c| c.is_ascii_digit()) && !rev_str.is_empty() => {
                let rev = rev_str
                    .parse::<i64>()
                    .map_err(|_| IdentifierParseError::BadRevision(rev_str.to_string()))?;
                (name.to_string(), Some(rev))
            }
            _ => (last.to_string(), None),
        };

        if name.is_empty() {
            return Err(IdentifierParseError::MissingName);
        }

        Ok(Identifier {
            owner,
            name,
            series,
            revision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_identifier() {
        let id: Identifier = "cs:~alice/trusty/foo-3".parse().unwrap();
        assert_eq!(id.owner.as_deref(), Some("alice"));
        assert_eq!(id.series.as_deref(), Some("trusty"));
        assert_eq!(id.name, "foo");
        assert_eq!(id.revision, Some(3));
    }

    #[test]
    fn parses_promulgated_multi_series() {
        let id: Identifier = "cs:foo-0".parse().unwrap();
        assert!(id.owner.is_none());
        assert!(id.series.is_none());
        assert_eq!(id.name, "foo");
        assert_eq!(id.revision, Some(0));
    }

    #[test]
    fn parses_revisionless() {
        let id: Identifier = "cs:~alice/foo".parse().unwrap();
        assert_eq!(id.revision, None);
        assert!(!id.is_resolved());
    }

    #[test]
    fn round_trips_display() {
        let id: Identifier = "cs:~alice/trusty/foo-3".parse().unwrap();
        assert_eq!(id.to_string(), "cs:~alice/trusty/foo-3");
    }

    #[test]
    fn rejects_missing_schema() {
        assert!("foo-3".parse::<Identifier>().is_err());
    }

    #[test]
    fn channel_aliases_development_to_edge() {
        assert_eq!("development".parse::<Channel>().unwrap(), Channel::Edge);
    }

    #[test]
    fn channel_rejects_unknown() {
        assert!("nightly".parse::<Channel>().is_err());
    }
}
