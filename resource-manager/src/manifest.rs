use serde::{Deserialize, Serialize};

use crate::error::ResourceManagerError;

/// The blob stored for an oci-image resource is this manifest, not the
/// image itself — it names where the image actually lives.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OciImageManifest {
    pub registry: String,
    pub repository: String,
    pub digest: String,
}

pub fn parse_manifest(bytes: &[u8]) -> Result<OciImageManifest, ResourceManagerError> {
    let manifest: OciImageManifest = serde_json::from_slice(bytes)
        .map_err(|e| ResourceManagerError::InvalidManifest(e.to_string()))?;
    if manifest.registry.is_empty() || manifest.repository.is_empty() || manifest.digest.is_empty() {
        return Err(ResourceManagerError::InvalidManifest(
            "registry, repository, and digest must all be non-empty".to_string(),
        ));
    }
    Ok(manifest)
}

pub fn encode_manifest(manifest: &OciImageManifest) -> Vec<u8> {
    serde_json::to_vec(manifest).expect("OciImageManifest serializes infallibly")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_and_parse() {
        let manifest = OciImageManifest {
            registry: "registry.example.com".to_string(),
            repository: "myteam/worker".to_string(),
            digest: "sha256:abc123".to_string(),
        };
        let bytes = encode_manifest(&manifest);
        let parsed = parse_manifest(&bytes).unwrap();
        assert_eq!(parsed.digest, "sha256:abc123");
    }

    #[test]
    fn rejects_manifest_with_empty_field() {
        let bytes = br#"{"registry":"","repository":"x","digest":"sha256:a"}"#;
        let err = parse_manifest(bytes).unwrap_err();
        assert!(matches!(err, ResourceManagerError::InvalidManifest(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = parse_manifest(b"not json").unwrap_err();
        assert!(matches!(err, ResourceManagerError::InvalidManifest(_)));
    }
}
