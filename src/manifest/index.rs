//! Registry index (index.json)
//!
//! Lists every chained page ever created, in creation order. The root page
//! is implied and never listed.

use super::page::write_json_atomic;
use crate::error::ManifestError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryIndex {
    /// Page file names, append-only
    #[serde(default)]
    pub manifests: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// The on-disk file is absent, malformed or behind `manifests`
    #[serde(skip)]
    dirty: bool,
}

impl RegistryIndex {
    /// Load the index, falling back to an empty one when absent or unreadable
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self {
                dirty: true,
                ..Self::default()
            };
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<RegistryIndex>(&content).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(index) => index,
            Err(e) => {
                warn!("Resetting unreadable index {}: {}", path.display(), e);
                Self {
                    dirty: true,
                    ..Self::default()
                }
            }
        }
    }

    /// Append `page` unless already listed; returns whether it was added
    pub fn register(&mut self, page: &str) -> bool {
        if self.contains(page) {
            return false;
        }
        self.manifests.push(page.to_string());
        self.dirty = true;
        true
    }

    pub fn contains(&self, page: &str) -> bool {
        self.manifests.iter().any(|m| m == page)
    }

    /// Whether the file on disk differs from this index
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn save(&mut self, path: &Path) -> Result<(), ManifestError> {
        write_json_atomic(path, self)?;
        self.dirty = false;
        Ok(())
    }
}
