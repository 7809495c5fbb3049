use thiserror::Error;

/// Failures raised while loading, extending or checking the manifest chain.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest file '{page}' referenced by '{referenced_by}' not found")]
    MissingPage { page: String, referenced_by: String },

    #[error("Manifest file '{page}' could not be parsed: {reason}")]
    InvalidPage { page: String, reason: String },

    #[error("Manifest file '{page}' links back into the chain via '{next}'")]
    ChainCycle { page: String, next: String },

    #[error("Failed to load JSON file '{file}': {reason}")]
    InvalidDefinition { file: String, reason: String },

    #[error("JSON file '{file}' missing required 'version' field (expected 1)")]
    InvalidVersion { file: String },

    #[error("Schema '{schema}' in file '{file}' already exists in manifest")]
    DuplicateSchema { schema: String, file: String },

    #[error("Included schema '{schema}' referenced by files {referenced_by:?} not found in manifest")]
    UnresolvedInclude {
        schema: String,
        referenced_by: Vec<String>,
    },

    #[error("Failed to write manifest file '{file}': {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures raised by the FTP upload path.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Source file '{0}' does not exist")]
    SourceMissing(String),

    #[error("Network error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server rejected '{command}': {reply}")]
    Protocol { command: String, reply: String },

    #[error("Malformed server reply: {0}")]
    MalformedReply(String),

    #[error("Attempt timed out after {0:?}")]
    TimedOut(std::time::Duration),

    #[error("Failed to complete after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

impl UploadError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, UploadError::SourceMissing(_))
    }
}

#[derive(Error, Debug)]
pub enum SchemachainError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SchemachainError>;
