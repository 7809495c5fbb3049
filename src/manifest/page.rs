//! Manifest page files and the JSON writer shared by pages and the index.

use crate::error::ManifestError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::Path;

/// One page of the manifest chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestPage {
    /// Registered name -> entry
    #[serde(default)]
    pub schemas: Map<String, Value>,

    /// File name of the successor page; `null` on the terminal page
    #[serde(default)]
    pub next: Option<String>,

    /// Fields this tool does not manage, carried through rewrites
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManifestPage {
    /// Read and parse a page; `name` is only used for diagnostics
    pub fn load(path: &Path, name: &str) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::InvalidPage {
            page: name.to_string(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ManifestError::InvalidPage {
            page: name.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.next.is_none()
    }

    /// Persist the page, replacing any previous content atomically
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        write_json_atomic(path, self)
    }
}

/// Serialize with 4-space indentation, matching the files maintained by hand
pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Write `value` to a temp file next to `path`, then rename it into place
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ManifestError> {
    let file = path.display().to_string();
    let io_err = |source: std::io::Error| ManifestError::Io {
        file: file.clone(),
        source,
    };

    let bytes = to_pretty_json(value).map_err(|e| io_err(e.into()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = temp_file_for(path, dir).map_err(io_err)?;
    tmp.write_all(&bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Temp file that will carry the mode of the file it replaces, or the
/// umask default when `path` does not exist yet
fn temp_file_for(path: &Path, dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let tmp = builder.tempfile_in(dir)?;

    if let Ok(existing) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    Ok(tmp)
}
