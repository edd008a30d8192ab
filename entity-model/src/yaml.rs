use std::collections::BTreeMap;
use std::str::FromStr;

use metadata_store::{
    BundleApplication, BundleMetadata, CharmMetadata, RelationStanza, ResourceDeclaration, ResourceKind,
};
use registry_types::Identifier;
use serde::Deserialize;

use crate::error::EntityModelError;

/// Placeholder names left behind by unedited scaffolding; a relation or
/// interface still carrying one of these indicates the author never filled
/// in the template (SPEC_FULL.md §4.3(c)).
const SCAFFOLDING_PLACEHOLDERS: &[&str] = &["relation-name", "interface-name"];

fn reject_placeholder(value: &str) -> Result<(), EntityModelError> {
    if SCAFFOLDING_PLACEHOLDERS.contains(&value) {
        return Err(EntityModelError::InvalidMetadata(format!(
            "`{value}` is scaffolding left unedited"
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct RawRelation {
    interface: String,
    scope: Option<String>,
    limit: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawResource {
    #[serde(rename = "type")]
    kind: String,
    path: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct RawMetadataYaml {
    name: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    series: Vec<String>,
    #[serde(default)]
    subordinate: bool,
    #[serde(default)]
    provides: BTreeMap<String, RawRelation>,
    #[serde(default)]
    requires: BTreeMap<String, RawRelation>,
    #[serde(default)]
    peers: BTreeMap<String, RawRelation>,
    #[serde(default)]
    resources: BTreeMap<String, RawResource>,
}

fn convert_relations(
    raw: BTreeMap<String, RawRelation>,
) -> Result<BTreeMap<String, RelationStanza>, EntityModelError> {
    let mut out = BTreeMap::new();
    for (key, relation) in raw {
        reject_placeholder(&key)?;
        reject_placeholder(&relation.interface)?;
        out.insert(
            key,
            RelationStanza {
                interface: relation.interface,
                scope: relation.scope,
                limit: relation.limit,
            },
        );
    }
    Ok(out)
}

/// Parses `metadata.yaml`'s bytes into validated `CharmMetadata`.
pub fn parse_metadata_yaml(bytes: &[u8]) -> Result<CharmMetadata, EntityModelError> {
    let raw: RawMetadataYaml =
        serde_yaml::from_slice(bytes).map_err(|e| EntityModelError::InvalidMetadata(e.to_string()))?;

    if raw.name.trim().is_empty() {
        return Err(EntityModelError::InvalidMetadata("name is empty".to_string()));
    }

    let mut resources = BTreeMap::new();
    for (name, resource) in raw.resources {
        let kind = match resource.kind.as_str() {
            "file" => ResourceKind::File,
            "oci-image" => ResourceKind::OciImage,
            other => {
                return Err(EntityModelError::InvalidMetadata(format!(
                    "resource `{name}` has unsupported type `{other}`"
                )))
            }
        };
        resources.insert(
            name,
            ResourceDeclaration {
                kind,
                path: resource.path,
                description: resource.description,
            },
        );
    }

    Ok(CharmMetadata {
        name: raw.name,
        summary: raw.summary,
        series: raw.series,
        subordinate: raw.subordinate,
        provides: convert_relations(raw.provides)?,
        requires: convert_relations(raw.requires)?,
        peers: convert_relations(raw.peers)?,
        resources,
    })
}

#[derive(Deserialize)]
struct RawBundleApplication {
    charm: String,
}

#[derive(Deserialize)]
struct RawBundleYaml {
    #[serde(default)]
    applications: BTreeMap<String, RawBundleApplication>,
    series: Option<String>,
}

/// Parses `bundle.yaml`'s bytes into validated `BundleMetadata`. Charm
/// references are parsed into `Identifier`s but not yet resolved against
/// MetadataStore; that happens in `ingest`, which has store access.
pub fn parse_bundle_yaml(bytes: &[u8]) -> Result<BundleMetadata, EntityModelError> {
    let raw: RawBundleYaml =
        serde_yaml::from_slice(bytes).map_err(|e| EntityModelError::InvalidMetadata(e.to_string()))?;

    if raw.applications.is_empty() {
        return Err(EntityModelError::InvalidMetadata(
            "bundle declares no applications".to_string(),
        ));
    }

    let mut applications = BTreeMap::new();
    for (name, app) in raw.applications {
        let charm = Identifier::from_str(&app.charm)
            .map_err(|e| EntityModelError::InvalidMetadata(format!("application `{name}`: {e}")))?;
        applications.insert(name, BundleApplication { charm });
    }

    Ok(BundleMetadata {
        applications,
        series: raw.series,
    })
}
