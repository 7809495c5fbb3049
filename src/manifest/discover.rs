//! Discovery of loose definition files waiting to be registered

use super::chain::ManifestChain;
use crate::error::ManifestError;
use crate::io::ManifestPaths;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A definition file accepted for registration
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    /// File stem, the name the entry is registered under
    pub stem: String,
    /// File name on disk
    pub file: String,
    /// Schema names declared by the file
    pub declared: Vec<String>,
    /// `mappings` items, copied verbatim
    pub mappings: Vec<Value>,
}

/// Result of scanning the manifest directory
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Accepted files in discovery order
    pub entries: Vec<NewEntry>,
    /// Included name -> files that include it; not yet verified
    pub includes: BTreeMap<String, Vec<String>>,
    /// Files skipped because their stem is already registered
    pub skipped: Vec<String>,
    /// Chained-page files that are not reachable from the root
    pub orphans: Vec<String>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scan the manifest directory for definition files not yet in the chain
pub fn discover(paths: &ManifestPaths, chain: &ManifestChain) -> Result<Discovery, ManifestError> {
    let mut discovery = Discovery::default();
    let mut taken: HashSet<String> = chain.schemas.keys().cloned().collect();

    for (file_name, stem) in candidate_files(paths, chain, &mut discovery.orphans)? {
        if chain.contains(&stem) {
            debug!("Skipping {}: already registered", file_name);
            discovery.skipped.push(file_name);
            continue;
        }

        let entry = read_definition(
            &paths.file(&file_name),
            &file_name,
            &stem,
            &taken,
            &mut discovery.includes,
        )?;
        debug!(
            "Discovered {} ({} schemas, {} mappings)",
            file_name,
            entry.declared.len(),
            entry.mappings.len()
        );

        taken.insert(entry.stem.clone());
        taken.extend(entry.declared.iter().cloned());
        discovery.entries.push(entry);
    }

    info!(
        "Discovery complete: {} new, {} already registered",
        discovery.entries.len(),
        discovery.skipped.len()
    );
    Ok(discovery)
}

/// (file name, stem) of every candidate, sorted by file name
fn candidate_files(
    paths: &ManifestPaths,
    chain: &ManifestChain,
    orphans: &mut Vec<String>,
) -> Result<Vec<(String, String)>, ManifestError> {
    let mut candidates = Vec::new();

    let walker = WalkDir::new(&paths.dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| ManifestError::Io {
            file: paths.dir.display().to_string(),
            source: e.into(),
        })?;

        // Symlinked definitions count; dangling links and directories do not
        if !entry.path().is_file() || !paths.has_definition_extension(entry.path()) {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            warn!("Skipping non UTF-8 file name: {:?}", entry.path());
            continue;
        };

        if file_name == paths.index_file || chain.is_page(&file_name) {
            continue;
        }

        if paths.is_chained_page_name(&file_name) {
            warn!("Ignoring {}: not reachable from {}", file_name, paths.root_page);
            orphans.push(file_name);
            continue;
        }

        let Some(stem) = Path::new(&file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
        else {
            continue;
        };

        candidates.push((file_name, stem));
    }

    Ok(candidates)
}

fn invalid(file: &str, reason: impl Into<String>) -> ManifestError {
    ManifestError::InvalidDefinition {
        file: file.to_string(),
        reason: reason.into(),
    }
}

/// Parse and check one definition file, recording its include references
fn read_definition(
    path: &Path,
    file_name: &str,
    stem: &str,
    taken: &HashSet<String>,
    includes: &mut BTreeMap<String, Vec<String>>,
) -> Result<NewEntry, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|e| invalid(file_name, e.to_string()))?;
    let json: Value = serde_json::from_str(&content).map_err(|e| invalid(file_name, e.to_string()))?;
    let object = json
        .as_object()
        .ok_or_else(|| invalid(file_name, "expected a JSON object"))?;

    if object.get("version").and_then(Value::as_f64) != Some(1.0) {
        return Err(ManifestError::InvalidVersion {
            file: file_name.to_string(),
        });
    }

    let mut declared = Vec::new();
    match object.get("schemas") {
        None | Some(Value::Null) => {}
        Some(Value::Object(schemas)) => {
            for (name, declaration) in schemas {
                if taken.contains(name) {
                    return Err(ManifestError::DuplicateSchema {
                        schema: name.clone(),
                        file: file_name.to_string(),
                    });
                }

                for include in declared_includes(declaration, file_name, name)? {
                    includes
                        .entry(include)
                        .or_default()
                        .push(file_name.to_string());
                }
                declared.push(name.clone());
            }
        }
        Some(_) => return Err(invalid(file_name, "'schemas' must be an object")),
    }

    let mappings = match object.get("mappings") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(_) => return Err(invalid(file_name, "'mappings' must be a list")),
    };

    Ok(NewEntry {
        stem: stem.to_string(),
        file: file_name.to_string(),
        declared,
        mappings,
    })
}

fn declared_includes(
    declaration: &Value,
    file_name: &str,
    schema: &str,
) -> Result<Vec<String>, ManifestError> {
    match declaration.get("include") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    invalid(
                        file_name,
                        format!("'include' of schema '{}' must list schema names", schema),
                    )
                })
            })
            .collect(),
        Some(_) => Err(invalid(
            file_name,
            format!("'include' of schema '{}' must be a list", schema),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManifestSettings;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup(root: Value) -> (TempDir, ManifestPaths) {
        let temp_dir = TempDir::new().unwrap();
        let paths =
            ManifestPaths::for_dir(temp_dir.path().to_path_buf(), &ManifestSettings::default())
                .unwrap();
        write(&temp_dir, "manifest.json", root);
        (temp_dir, paths)
    }

    fn write(dir: &TempDir, name: &str, value: Value) {
        std::fs::write(dir.path().join(name), serde_json::to_string(&value).unwrap()).unwrap();
    }

    fn run(paths: &ManifestPaths) -> Result<Discovery, ManifestError> {
        let chain = ManifestChain::load(paths).unwrap();
        discover(paths, &chain)
    }

    #[test]
    fn test_discovers_in_file_name_order() {
        let (dir, paths) = setup(json!({ "schemas": {}, "next": null }));
        write(&dir, "zeta.json", json!({ "version": 1, "mappings": [{ "id": 1 }] }));
        write(&dir, "alpha.json", json!({ "version": 1, "schemas": { "alpha": {} } }));
        write(&dir, "index.json", json!({ "manifests": [] }));
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let discovery = run(&paths).unwrap();
        let stems: Vec<_> = discovery.entries.iter().map(|e| e.stem.as_str()).collect();
        assert_eq!(stems, vec!["alpha", "zeta"]);
        assert_eq!(discovery.entries[1].mappings, vec![json!({ "id": 1 })]);
        assert!(discovery.entries[0].mappings.is_empty());
    }

    #[test]
    fn test_registered_stem_is_skipped() {
        let (dir, paths) = setup(json!({ "schemas": { "alpha": [] }, "next": null }));
        // Content is never read for registered stems
        std::fs::write(dir.path().join("alpha.json"), "{ broken").unwrap();

        let discovery = run(&paths).unwrap();
        assert!(discovery.is_empty());
        assert_eq!(discovery.skipped, vec!["alpha.json"]);
    }

    #[test]
    fn test_invalid_json_fails() {
        let (dir, paths) = setup(json!({ "schemas": {}, "next": null }));
        std::fs::write(dir.path().join("broken.json"), "{ broken").unwrap();

        let err = run(&paths).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidDefinition { ref file, .. } if file == "broken.json"));
    }

    #[test]
    fn test_version_must_be_one() {
        let (dir, paths) = setup(json!({ "schemas": {}, "next": null }));
        write(&dir, "v2.json", json!({ "version": 2 }));

        let err = run(&paths).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidVersion { ref file } if file == "v2.json"));
    }

    #[test]
    fn test_version_compares_numerically() {
        let (dir, paths) = setup(json!({ "schemas": {}, "next": null }));
        write(&dir, "float.json", json!({ "version": 1.0 }));

        let discovery = run(&paths).unwrap();
        assert_eq!(discovery.entries[0].stem, "float");

        write(&dir, "text.json", json!({ "version": "1" }));
        let err = run(&paths).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidVersion { ref file } if file == "text.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_definition_is_discovered() {
        let (dir, paths) = setup(json!({ "schemas": {}, "next": null }));
        let target_dir = TempDir::new().unwrap();
        let target = target_dir.path().join("shared.json");
        std::fs::write(&target, r#"{ "version": 1 }"#).unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("linked.json")).unwrap();
        std::os::unix::fs::symlink(
            target_dir.path().join("gone.json"),
            dir.path().join("dangling.json"),
        )
        .unwrap();

        let discovery = run(&paths).unwrap();
        let stems: Vec<_> = discovery.entries.iter().map(|e| e.stem.as_str()).collect();
        assert_eq!(stems, vec!["linked"]);
    }

    #[test]
    fn test_missing_version_fails() {
        let (dir, paths) = setup(json!({ "schemas": {}, "next": null }));
        write(&dir, "nover.json", json!({ "schemas": {} }));

        let err = run(&paths).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidVersion { .. }));
    }

    #[test]
    fn test_duplicate_with_registered_name() {
        let (dir, paths) = setup(json!({ "schemas": { "alpha": [] }, "next": null }));
        write(&dir, "beta.json", json!({ "version": 1, "schemas": { "alpha": {} } }));

        let err = run(&paths).unwrap_err();
        match err {
            ManifestError::DuplicateSchema { schema, file } => {
                assert_eq!(schema, "alpha");
                assert_eq!(file, "beta.json");
            }
            other => panic!("Expected DuplicateSchema, got: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_across_new_files() {
        let (dir, paths) = setup(json!({ "schemas": {}, "next": null }));
        write(&dir, "a.json", json!({ "version": 1, "schemas": { "shared": {} } }));
        write(&dir, "b.json", json!({ "version": 1, "schemas": { "shared": {} } }));

        let err = run(&paths).unwrap_err();
        assert!(matches!(err, ManifestError::DuplicateSchema { ref file, .. } if file == "b.json"));
    }

    #[test]
    fn test_new_stem_counts_as_taken() {
        let (dir, paths) = setup(json!({ "schemas": {}, "next": null }));
        write(&dir, "a.json", json!({ "version": 1 }));
        write(&dir, "b.json", json!({ "version": 1, "schemas": { "a": {} } }));

        let err = run(&paths).unwrap_err();
        assert!(matches!(err, ManifestError::DuplicateSchema { ref schema, .. } if schema == "a"));
    }

    #[test]
    fn test_includes_are_recorded_not_verified() {
        let (dir, paths) = setup(json!({ "schemas": {}, "next": null }));
        write(
            &dir,
            "a.json",
            json!({ "version": 1, "schemas": { "a": { "include": ["missing", "b"] } } }),
        );
        write(
            &dir,
            "c.json",
            json!({ "version": 1, "schemas": { "c": { "include": ["missing"] } } }),
        );

        let discovery = run(&paths).unwrap();
        assert_eq!(discovery.includes["missing"], vec!["a.json", "c.json"]);
        assert_eq!(discovery.includes["b"], vec!["a.json"]);
    }

    #[test]
    fn test_orphaned_page_is_not_a_definition() {
        let (dir, paths) = setup(json!({ "schemas": {}, "next": null }));
        write(&dir, "manifest.1.json", json!({ "schemas": { "x": [] }, "next": null }));

        let discovery = run(&paths).unwrap();
        assert!(discovery.is_empty());
        assert_eq!(discovery.orphans, vec!["manifest.1.json"]);
    }

    #[test]
    fn test_include_must_be_a_list() {
        let (dir, paths) = setup(json!({ "schemas": {}, "next": null }));
        write(&dir, "a.json", json!({ "version": 1, "schemas": { "a": { "include": "b" } } }));

        let err = run(&paths).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidDefinition { .. }));
    }
}
