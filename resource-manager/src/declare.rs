use metadata_store::{CharmMetadata, ResourceDeclaration, ResourceKind};

use crate::error::ResourceManagerError;

/// Looks up `name` in the charm's declared resources, failing if the charm
/// doesn't declare it at all.
pub fn declared_resource<'a>(
    entity_label: &str,
    charm: &'a CharmMetadata,
    name: &str,
) -> Result<&'a ResourceDeclaration, ResourceManagerError> {
    charm
        .resources
        .get(name)
        .ok_or_else(|| ResourceManagerError::UndeclaredResource {
            entity: entity_label.to_string(),
            name: name.to_string(),
        })
}

/// Enforces the uploaded kind matches the declaration (SPEC_FULL.md §4.4:
/// "rejects non-file types unless explicitly supported").
pub fn check_kind(name: &str, declaration: &ResourceDeclaration, supplied: ResourceKind) -> Result<(), ResourceManagerError> {
    if declaration.kind != supplied {
        return Err(ResourceManagerError::TypeMismatch {
            name: name.to_string(),
            declared: kind_label(declaration.kind),
            supplied: kind_label(supplied),
        });
    }
    Ok(())
}

/// Validates `filename`'s extension against the declared path's extension,
/// when the charm specified one. A charm that leaves `path` unset accepts
/// any filename.
pub fn check_extension(declaration: &ResourceDeclaration, filename: &str) -> Result<(), ResourceManagerError> {
    let Some(declared_path) = &declaration.path else {
        return Ok(());
    };
    let expected = extension_of(declared_path);
    let supplied = extension_of(filename);
    if expected != supplied {
        return Err(ResourceManagerError::ExtensionMismatch {
            filename: filename.to_string(),
            expected: expected.unwrap_or("").to_string(),
        });
    }
    Ok(())
}

fn extension_of(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(_, ext)| ext)
}

fn kind_label(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::File => "file",
        ResourceKind::OciImage => "oci-image",
    }
}
