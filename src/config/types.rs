use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default number of schema entries held by a single manifest page
pub const DEFAULT_CAPACITY: usize = 50;

/// Root settings structure for schemachain.yaml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Manifest pager settings
    #[serde(default)]
    pub manifest: ManifestSettings,

    /// FTP upload settings
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Layout of the manifest directory and page sizing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManifestSettings {
    /// Directory holding the manifest chain, relative to the working directory
    pub dir: PathBuf,

    /// Well-known name of the first page in the chain
    pub root_page: String,

    /// Registry file listing every chained page
    pub index_file: String,

    /// Maximum number of schema entries per page
    pub capacity: usize,

    /// Extension marking definition files
    pub extension: String,
}

impl Default for ManifestSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("schema"),
            root_page: "manifest.json".to_string(),
            index_file: "index.json".to_string(),
            capacity: DEFAULT_CAPACITY,
            extension: "json".to_string(),
        }
    }
}

/// FTP target and retry policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadSettings {
    /// FTP server host
    pub server: String,

    /// FTP control port
    pub port: u16,

    /// Remote directory the file is stored under
    pub remote_dir: String,

    /// Hard deadline for a single attempt, in seconds
    pub timeout_secs: u64,

    /// Number of attempts before giving up
    pub max_retries: u32,

    /// Use PASV data connections instead of active PORT
    pub passive: bool,

    /// Login user; no login is attempted when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            server: "10.0.0.182".to_string(),
            port: 21,
            remote_dir: ".extensions".to_string(),
            timeout_secs: 6,
            max_retries: 8,
            passive: false,
            user: None,
            password: None,
        }
    }
}

impl UploadSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
