//! Archive parsing and the revision/series rules in SPEC_FULL.md §4.3.

mod archive;
mod error;
mod ingest;
mod revision;
mod series;
mod tiebreak;
mod yaml;

pub use archive::parse_archive;
pub use error::EntityModelError;
pub use ingest::{ingest, IngestRequest};
pub use revision::{allocate_promulgated_revision, allocate_revision};
pub use series::{best_series, check_single_family, distribution_family, lts_weight, DistributionFamily};
pub use tiebreak::pick_best;
pub use yaml::{parse_bundle_yaml, parse_metadata_yaml};
