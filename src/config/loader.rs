use super::types::Settings;
use crate::{Result, SchemachainError};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the project-level settings file
pub const PROJECT_CONFIG_FILE: &str = "schemachain.yaml";

/// Settings loader with project and user-level discovery
pub struct SettingsLoader {
    /// Directory searched for the project settings file
    project_root: PathBuf,
    /// Skip the per-user config directory
    ignore_user_config: bool,
}

impl SettingsLoader {
    /// Create a loader rooted at the given project directory
    pub fn new<P: AsRef<Path>>(project_root: P) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            ignore_user_config: false,
        }
    }

    /// Only consider explicit and project-level files
    pub fn without_user_config(mut self) -> Self {
        self.ignore_user_config = true;
        self
    }

    /// Load settings from a specific file; the file must exist and parse
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<Settings> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path).map_err(|e| {
            SchemachainError::Config(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        let settings: Settings = serde_yaml_ng::from_str(&contents).map_err(|e| {
            SchemachainError::Config(format!(
                "Failed to parse settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        validate_settings(&settings)?;
        Ok(settings)
    }

    /// Resolve settings: explicit path, then project file, then user config, then defaults
    pub fn load(&self, explicit: Option<&Path>) -> Result<Settings> {
        if let Some(path) = explicit {
            debug!("Loading settings from {}", path.display());
            return self.load_file(path);
        }

        let project_path = self.project_root.join(PROJECT_CONFIG_FILE);
        if project_path.exists() {
            debug!("Loading project settings from {}", project_path.display());
            return self.load_file(project_path);
        }

        if !self.ignore_user_config {
            if let Some(user_path) = user_config_file() {
                if user_path.exists() {
                    match self.load_file(&user_path) {
                        Ok(settings) => return Ok(settings),
                        Err(e) => {
                            // A broken user file should not block project work
                            warn!("Ignoring user settings {}: {}", user_path.display(), e);
                        }
                    }
                }
            }
        }

        Ok(Settings::default())
    }
}

/// Per-user settings file location
pub fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "schemachain").map(|dirs| dirs.config_dir().join("config.yaml"))
}

/// Reject settings the pager or uploader cannot run with
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.manifest.capacity == 0 {
        return Err(SchemachainError::Config(
            "manifest.capacity must be at least 1".to_string(),
        ));
    }

    if settings.manifest.root_page.is_empty() || settings.manifest.index_file.is_empty() {
        return Err(SchemachainError::Config(
            "manifest.root_page and manifest.index_file must not be empty".to_string(),
        ));
    }

    if settings.manifest.root_page == settings.manifest.index_file {
        return Err(SchemachainError::Config(format!(
            "manifest.root_page and manifest.index_file are both '{}'",
            settings.manifest.root_page
        )));
    }

    if settings.upload.max_retries == 0 {
        return Err(SchemachainError::Config(
            "upload.max_retries must be at least 1".to_string(),
        ));
    }

    if settings.upload.timeout_secs == 0 {
        return Err(SchemachainError::Config(
            "upload.timeout_secs must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
