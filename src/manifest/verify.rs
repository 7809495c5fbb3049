use super::chain::ManifestChain;
use super::discover::Discovery;
use crate::error::ManifestError;
use std::collections::HashSet;

/// Check that every recorded include names a registered or newly discovered entry.
///
/// Runs after the whole directory has been scanned, so new files may include
/// each other regardless of discovery order. Only existence is checked.
pub fn verify_includes(chain: &ManifestChain, discovery: &Discovery) -> Result<(), ManifestError> {
    let available: HashSet<&str> = chain
        .schemas
        .keys()
        .map(String::as_str)
        .chain(discovery.entries.iter().map(|e| e.stem.as_str()))
        .collect();

    for (include, referenced_by) in &discovery.includes {
        if !available.contains(include.as_str()) {
            return Err(ManifestError::UnresolvedInclude {
                schema: include.clone(),
                referenced_by: referenced_by.clone(),
            });
        }
    }

    Ok(())
}
