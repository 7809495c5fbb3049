use crate::config::UploadSettings;
use crate::error::UploadError;
use crate::io::PathUtils;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// A single file to place on the server
#[derive(Debug, Clone, PartialEq)]
pub struct UploadJob {
    /// Local file to send
    pub source: PathBuf,
    /// Remote path, `<remote_dir>/<file name>`
    pub remote_path: String,
}

impl UploadJob {
    /// Build a job for `source`, stored under `remote_dir` with its base name
    pub fn new(source: &str, remote_dir: &str) -> Result<Self, UploadError> {
        let source = PathBuf::from(PathUtils::strip_current_dir_prefix(source));
        if !source.is_file() {
            return Err(UploadError::SourceMissing(source.display().to_string()));
        }

        let file_name = base_name(&source)
            .ok_or_else(|| UploadError::SourceMissing(source.display().to_string()))?;

        let remote_dir = remote_dir.trim_end_matches('/');
        let remote_path = if remote_dir.is_empty() {
            file_name
        } else {
            format!("{}/{}", remote_dir, file_name)
        };

        Ok(Self {
            source,
            remote_path,
        })
    }
}

/// Last path component, treating `\` as a separator too
fn base_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    name.rsplit('\\').next().map(str::to_string)
}

/// Transport used by the retry loop; one call is one complete attempt
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload the file and return the remote directory listing
    async fn upload(&self, job: &UploadJob) -> Result<Vec<String>, UploadError>;
}

/// How many attempts to make and how long each may take
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl From<&UploadSettings> for RetryPolicy {
    fn from(settings: &UploadSettings) -> Self {
        Self {
            timeout: settings.timeout(),
            max_retries: settings.max_retries,
        }
    }
}

/// Successful upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    /// Attempt that succeeded, 1-based
    pub attempts: u32,
    pub listing: Vec<String>,
}

/// Retry `uploader` until it succeeds, each attempt cut off at `policy.timeout`.
///
/// An attempt that outlives the deadline is dropped, which closes its
/// sockets. Attempts follow each other without delay. Errors that another
/// attempt cannot fix end the loop immediately.
pub async fn run_with_timeout<U>(
    uploader: &U,
    job: &UploadJob,
    policy: &RetryPolicy,
) -> Result<UploadOutcome, UploadError>
where
    U: Uploader + ?Sized,
{
    for attempt in 1..=policy.max_retries {
        info!("Attempt {}/{}", attempt, policy.max_retries);

        match tokio::time::timeout(policy.timeout, uploader.upload(job)).await {
            Ok(Ok(listing)) => {
                info!("Upload completed successfully");
                return Ok(UploadOutcome {
                    attempts: attempt,
                    listing,
                });
            }
            Ok(Err(e)) if !e.is_retryable() => return Err(e),
            Ok(Err(e)) => warn!("Attempt {} failed: {}", attempt, e),
            Err(_) => warn!("{}", UploadError::TimedOut(policy.timeout)),
        }
    }

    Err(UploadError::Exhausted {
        attempts: policy.max_retries,
    })
}
