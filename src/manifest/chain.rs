use super::page::ManifestPage;
use crate::error::ManifestError;
use crate::io::{ManifestPaths, PathUtils};
use serde_json::{Map, Value};
use tracing::debug;

/// The manifest chain as found on disk, from the root page to the terminal page
#[derive(Debug, Clone)]
pub struct ManifestChain {
    /// Every registered name across all pages
    pub schemas: Map<String, Value>,
    /// Page file names in chain order, root first
    pub pages: Vec<String>,
    /// Entry count per page, parallel to `pages`
    pub page_sizes: Vec<usize>,
    /// File name of the page whose `next` is null
    pub terminal: String,
    /// The terminal page exactly as stored (not the merged view)
    pub terminal_page: ManifestPage,
}

impl ManifestChain {
    /// Walk the chain starting at the root page
    pub fn load(paths: &ManifestPaths) -> Result<Self, ManifestError> {
        let mut schemas = Map::new();
        let mut pages: Vec<String> = Vec::new();
        let mut page_sizes = Vec::new();
        let mut current = paths.root_page.clone();
        let mut referenced_by = paths.dir.display().to_string();

        loop {
            let path = paths.file(&current);
            if !path.is_file() {
                return Err(ManifestError::MissingPage {
                    page: current,
                    referenced_by,
                });
            }

            let page = ManifestPage::load(&path, &current)?;
            debug!("Loaded manifest page {} ({} entries)", current, page.len());

            for (name, entry) in &page.schemas {
                schemas.insert(name.clone(), entry.clone());
            }
            pages.push(current.clone());
            page_sizes.push(page.len());

            let next = match page.next.clone() {
                None => {
                    return Ok(Self {
                        schemas,
                        pages,
                        page_sizes,
                        terminal: current,
                        terminal_page: page,
                    });
                }
                Some(next) => next,
            };

            if !PathUtils::is_plain_file_name(&next) {
                return Err(ManifestError::InvalidPage {
                    page: current,
                    reason: format!("'next' must name a file in the manifest directory, got '{}'", next),
                });
            }

            if pages.contains(&next) {
                return Err(ManifestError::ChainCycle {
                    page: current,
                    next,
                });
            }

            referenced_by = current;
            current = next;
        }
    }

    /// Whether `name` is registered on any page
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn is_page(&self, file_name: &str) -> bool {
        self.pages.iter().any(|p| p == file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManifestSettings;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ManifestPaths) {
        let temp_dir = TempDir::new().unwrap();
        let paths =
            ManifestPaths::for_dir(temp_dir.path().to_path_buf(), &ManifestSettings::default())
                .unwrap();
        (temp_dir, paths)
    }

    fn write(dir: &Path, name: &str, value: Value) {
        std::fs::write(dir.join(name), serde_json::to_string(&value).unwrap()).unwrap();
    }

    #[test]
    fn test_single_page_chain() {
        let (dir, paths) = setup();
        write(dir.path(), "manifest.json", json!({ "schemas": { "a": [], "b": [] }, "next": null }));

        let chain = ManifestChain::load(&paths).unwrap();
        assert_eq!(chain.pages, vec!["manifest.json"]);
        assert_eq!(chain.terminal, "manifest.json");
        assert!(chain.contains("a"));
        assert_eq!(chain.terminal_page.schemas.len(), 2);
    }

    #[test]
    fn test_follows_next_and_keeps_terminal_unmerged() {
        let (dir, paths) = setup();
        write(
            dir.path(),
            "manifest.json",
            json!({ "schemas": { "a": [] }, "next": "manifest.1.json" }),
        );
        write(
            dir.path(),
            "manifest.1.json",
            json!({ "schemas": { "b": [{ "k": 1 }] }, "next": null }),
        );

        let chain = ManifestChain::load(&paths).unwrap();
        assert_eq!(chain.pages, vec!["manifest.json", "manifest.1.json"]);
        assert_eq!(chain.page_sizes, vec![1, 1]);
        assert_eq!(chain.terminal, "manifest.1.json");
        assert_eq!(chain.schemas.len(), 2);
        assert_eq!(chain.terminal_page.schemas.len(), 1);
        assert!(chain.terminal_page.schemas.contains_key("b"));
    }

    #[test]
    fn test_missing_next_page() {
        let (dir, paths) = setup();
        write(
            dir.path(),
            "manifest.json",
            json!({ "schemas": {}, "next": "manifest.1.json" }),
        );

        match ManifestChain::load(&paths).unwrap_err() {
            ManifestError::MissingPage { page, referenced_by } => {
                assert_eq!(page, "manifest.1.json");
                assert_eq!(referenced_by, "manifest.json");
            }
            other => panic!("Expected MissingPage, got: {:?}", other),
        }
    }

    #[test]
    fn test_missing_root_page() {
        let (_dir, paths) = setup();
        let err = ManifestChain::load(&paths).unwrap_err();
        assert!(matches!(err, ManifestError::MissingPage { .. }));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let (dir, paths) = setup();
        write(
            dir.path(),
            "manifest.json",
            json!({ "schemas": {}, "next": "manifest.1.json" }),
        );
        write(
            dir.path(),
            "manifest.1.json",
            json!({ "schemas": {}, "next": "manifest.json" }),
        );

        let err = ManifestChain::load(&paths).unwrap_err();
        assert!(matches!(err, ManifestError::ChainCycle { .. }));
    }

    #[test]
    fn test_next_outside_directory_is_rejected() {
        let (dir, paths) = setup();
        write(
            dir.path(),
            "manifest.json",
            json!({ "schemas": {}, "next": "../manifest.1.json" }),
        );

        let err = ManifestChain::load(&paths).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidPage { .. }));
    }
}
