//! `NewUpload`/`PutPart`/`FinishUpload`/`IngestEntity`, the four operations
//! SPEC_FULL.md §4.8 calls "the primary entry points" of the upload surface.

mod error;
mod ingest;
mod upload;

pub use error::UploadPipelineError;
pub use ingest::{ingest_entity, ArtifactSource, IngestEntityRequest};
pub use upload::{finish_upload, new_upload, put_part};
