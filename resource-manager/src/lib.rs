//! Resource declaration, upload, and channel-pin resolution (SPEC_FULL.md §4.4).

mod declare;
mod error;
mod manager;
mod manifest;
mod revision;

pub use error::ResourceManagerError;
pub use manager::{resolve_resource, upload_resource, UploadResourceRequest};
pub use manifest::{encode_manifest, parse_manifest, OciImageManifest};
pub use revision::allocate_resource_revision;
