pub mod loader;
pub mod types;

pub use loader::{validate_settings, SettingsLoader, PROJECT_CONFIG_FILE};
pub use types::{ManifestSettings, Settings, UploadSettings, DEFAULT_CAPACITY};
