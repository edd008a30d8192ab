use std::io::{Cursor, Read};

use metadata_store::Artifact;
use zip::ZipArchive;

use crate::error::EntityModelError;
use crate::yaml::{parse_bundle_yaml, parse_metadata_yaml};

/// Opens `bytes` as a zip archive and returns the parsed `Artifact` it
/// contains — exactly one of `metadata.yaml` (charm) or `bundle.yaml`
/// (bundle) must be present at the archive root (SPEC_FULL.md §4.3 a/b).
pub fn parse_archive(bytes: &[u8]) -> Result<Artifact, EntityModelError> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| EntityModelError::InvalidArchive(e.to_string()))?;

    let metadata_bytes = read_entry(&mut zip, "metadata.yaml")?;
    let bundle_bytes = read_entry(&mut zip, "bundle.yaml")?;

    match (metadata_bytes, bundle_bytes) {
        (Some(_), Some(_)) => Err(EntityModelError::InvalidArchive(
            "archive contains both metadata.yaml and bundle.yaml".to_string(),
        )),
        (Some(metadata_bytes), None) => Ok(Artifact::Charm(parse_metadata_yaml(&metadata_bytes)?)),
        (None, Some(bundle_bytes)) => Ok(Artifact::Bundle(parse_bundle_yaml(&bundle_bytes)?)),
        (None, None) => Err(EntityModelError::MissingMetadata(
            "metadata.yaml or bundle.yaml",
        )),
    }
}

fn read_entry(
    zip: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<Vec<u8>>, EntityModelError> {
    let mut file = match zip.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(EntityModelError::InvalidArchive(e.to_string())),
    };
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .map_err(|e| EntityModelError::InvalidArchive(e.to_string()))?;
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::FileOptions;
    use zip::ZipWriter;

    use super::*;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut buf));
            for (name, contents) in entries {
                writer.start_file(*name, FileOptions::default()).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn parses_charm_metadata() {
        let zip = build_zip(&[("metadata.yaml", "name: foo\nsummary: a charm\n")]);
        let artifact = parse_archive(&zip).unwrap();
        assert!(artifact.as_charm().is_some());
    }

    #[test]
    fn parses_bundle_metadata() {
        let zip = build_zip(&[(
            "bundle.yaml",
            "applications:\n  wordpress:\n    charm: cs:trusty/wordpress-3\n",
        )]);
        let artifact = parse_archive(&zip).unwrap();
        assert!(artifact.as_bundle().is_some());
    }

    #[test]
    fn rejects_archive_with_neither_file() {
        let zip = build_zip(&[("readme.txt", "hello")]);
        let err = parse_archive(&zip).unwrap_err();
        assert!(matches!(err, EntityModelError::MissingMetadata(_)));
    }

    #[test]
    fn rejects_scaffolding_placeholder_relation() {
        let zip = build_zip(&[(
            "metadata.yaml",
            "name: foo\nprovides:\n  relation-name:\n    interface: http\n",
        )]);
        let err = parse_archive(&zip).unwrap_err();
        assert!(matches!(err, EntityModelError::InvalidMetadata(_)));
    }

    #[test]
    fn rejects_invalid_zip_bytes() {
        let err = parse_archive(b"not a zip file").unwrap_err();
        assert!(matches!(err, EntityModelError::InvalidArchive(_)));
    }
}
