use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use registry_types::{BaseIdentifier, Channel, ContentHash, Identifier};
use serde::{Deserialize, Serialize};

/// A relation stanza from `metadata.yaml`'s `provides`/`requires`/`peers`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RelationStanza {
    pub interface: String,
    pub scope: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ResourceKind {
    File,
    OciImage,
}

/// A resource declared in `metadata.yaml`'s `resources` map, not yet an
/// uploaded revision.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    pub kind: ResourceKind,
    pub path: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CharmMetadata {
    pub name: String,
    pub summary: String,
    pub series: Vec<String>,
    pub subordinate: bool,
    pub provides: BTreeMap<String, RelationStanza>,
    pub requires: BTreeMap<String, RelationStanza>,
    pub peers: BTreeMap<String, RelationStanza>,
    pub resources: BTreeMap<String, ResourceDeclaration>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BundleApplication {
    pub charm: Identifier,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub applications: BTreeMap<String, BundleApplication>,
    pub series: Option<String>,
}

/// Tagged dynamic dispatch for the two archive kinds an upload can contain
/// (Design Notes, "dynamic content dispatch").
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Artifact {
    Charm(CharmMetadata),
    Bundle(BundleMetadata),
}

impl Artifact {
    pub fn is_bundle(&self) -> bool {
        matches!(self, Artifact::Bundle(_))
    }

    pub fn as_charm(&self) -> Option<&CharmMetadata> {
        match self {
            Artifact::Charm(meta) => Some(meta),
            Artifact::Bundle(_) => None,
        }
    }

    pub fn as_bundle(&self) -> Option<&BundleMetadata> {
        match self {
            Artifact::Bundle(data) => Some(data),
            Artifact::Charm(_) => None,
        }
    }
}

/// One immutable record per `(owner, name, series, revision)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    pub identifier: Identifier,
    pub base: BaseIdentifier,
    pub blob_hash: ContentHash,
    pub blob_size: u64,
    pub blob_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub artifact: Artifact,
    pub supported_series: Vec<String>,
    pub promulgated_id: Option<Identifier>,
    /// `-1` if this entity has never been promulgated.
    pub promulgated_revision: i64,
    pub channels: Vec<Channel>,
    /// Audit-log field; the sink that reads it is out of scope here.
    pub uploader: String,
}

impl Entity {
    pub fn revision(&self) -> i64 {
        self.identifier.revision.unwrap_or(-1)
    }

    pub fn is_on_channel(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChannelAcl {
    pub read: Vec<String>,
    pub write: Vec<String>,
}

/// One record per `(owner, name)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BaseEntity {
    pub base: BaseIdentifier,
    pub acls: BTreeMap<Channel, ChannelAcl>,
    pub promulgated: bool,
    pub published: BTreeMap<Channel, Identifier>,
    /// Advisory flag consulted by an external ingester; not enforced here.
    pub can_ingest: bool,
}

impl BaseEntity {
    pub fn new(base: BaseIdentifier) -> Self {
        BaseEntity {
            base,
            acls: BTreeMap::new(),
            promulgated: false,
            published: BTreeMap::new(),
            can_ingest: true,
        }
    }
}

/// One record per `(base, resource-name, revision)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resource {
    pub base: BaseIdentifier,
    pub name: String,
    pub revision: i64,
    pub hash: ContentHash,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub blob_name: String,
    pub kind: ResourceKind,
}

/// The effective resource set for one resolved entity on one channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourcePin {
    pub entity: Identifier,
    pub channel: Channel,
    pub pins: BTreeMap<String, i64>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PartMeta {
    pub part_number: u32,
    pub hash: ContentHash,
    pub size: u64,
}

/// Persisted upload-session metadata (distinct from `blobstore`'s in-memory
/// `MultipartUploadTable`, which tracks the hot PutPart path; this is the
/// queryable record the `uploads` collection in the persisted-state layout
/// names).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadRecord {
    pub upload_id: String,
    pub owner: String,
    pub min_part_size: u64,
    pub max_part_size: u64,
    pub max_parts: u32,
    pub expires_at: DateTime<Utc>,
    pub parts: Vec<PartMeta>,
    pub finalized: bool,
}
