use crate::config::ManifestSettings;
use crate::{Result, SchemachainError};
use regex::Regex;
use std::path::{Component, Path, PathBuf};

/// Path management for one manifest directory
#[derive(Debug, Clone)]
pub struct ManifestPaths {
    /// Directory holding pages, the index and loose definition files
    pub dir: PathBuf,
    /// File name of the first page in the chain
    pub root_page: String,
    /// File name of the registry index
    pub index_file: String,
    /// Extension marking definition files (without the dot)
    pub extension: String,
    page_stem: String,
    page_ext: String,
    chained_page: Regex,
}

impl ManifestPaths {
    /// Resolve the manifest directory against an explicit working directory
    pub fn new(working_dir: &Path, settings: &ManifestSettings) -> Result<Self> {
        let dir = if settings.dir.is_absolute() {
            settings.dir.clone()
        } else {
            working_dir.join(&settings.dir)
        };
        Self::for_dir(dir, settings)
    }

    /// Use `dir` as the manifest directory as-is
    pub fn for_dir(dir: PathBuf, settings: &ManifestSettings) -> Result<Self> {
        let root = Path::new(&settings.root_page);
        let page_stem = root
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                SchemachainError::Path(format!("Invalid root page name '{}'", settings.root_page))
            })?
            .to_string();
        let page_ext = root
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or(&settings.extension)
            .to_string();

        let pattern = format!(
            r"^{}\.(\d+)\.{}$",
            regex::escape(&page_stem),
            regex::escape(&page_ext)
        );
        let chained_page = Regex::new(&pattern)
            .map_err(|e| SchemachainError::Path(format!("Invalid page name pattern: {}", e)))?;

        Ok(Self {
            dir,
            root_page: settings.root_page.clone(),
            index_file: settings.index_file.clone(),
            extension: settings.extension.clone(),
            page_stem,
            page_ext,
            chained_page,
        })
    }

    /// Full path of a page or definition file inside the manifest directory
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn index_path(&self) -> PathBuf {
        self.file(&self.index_file)
    }

    /// Name of the `n`th chained page, e.g. `manifest.3.json`
    pub fn chained_page_name(&self, n: usize) -> String {
        format!("{}.{}.{}", self.page_stem, n, self.page_ext)
    }

    /// Whether `name` follows the chained page naming scheme
    pub fn is_chained_page_name(&self, name: &str) -> bool {
        self.chained_page.is_match(name)
    }

    /// Whether `name` carries the definition file extension
    pub fn has_definition_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == self.extension)
    }
}

/// Utilities for working with paths
pub struct PathUtils;

impl PathUtils {
    /// Check if path is safe (no traversal attacks)
    pub fn is_safe_path(path: &Path) -> bool {
        !path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    }

    /// Whether a page reference names a plain file inside the manifest directory
    pub fn is_plain_file_name(name: &str) -> bool {
        let path = Path::new(name);
        Self::is_safe_path(path) && path.components().count() == 1
    }

    /// Drop a leading `./` or `.\` from a user-supplied path
    pub fn strip_current_dir_prefix(path: &str) -> &str {
        path.strip_prefix(".\\")
            .or_else(|| path.strip_prefix("./"))
            .unwrap_or(path)
    }
}
