use super::CommandHandler;
use crate::config::UploadSettings;
use crate::upload::{run_with_timeout, FtpUploader, RetryPolicy, UploadJob};
use crate::{Result, SchemachainError};
use async_trait::async_trait;

/// Handler for the `upload` command
pub struct UploadCommand {
    pub file: String,
    pub settings: UploadSettings,
}

/// Command-line values that override [`UploadSettings`]
#[derive(Debug, Default, Clone)]
pub struct UploadOverrides {
    pub server: Option<String>,
    pub remote_dir: Option<String>,
    pub timeout: Option<u64>,
    pub retries: Option<u32>,
    pub passive: bool,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[async_trait]
impl CommandHandler for UploadCommand {
    async fn execute(&self) -> Result<()> {
        let job = UploadJob::new(&self.file, &self.settings.remote_dir)?;
        let uploader = FtpUploader::new(self.settings.clone());
        let policy = RetryPolicy::from(&self.settings);

        println!(
            "Uploading {} to {}:{}",
            job.source.display(),
            uploader.address(),
            job.remote_path
        );

        let outcome = run_with_timeout(&uploader, &job, &policy).await?;
        for line in &outcome.listing {
            println!("{}", line);
        }
        println!(
            "FTP operation completed successfully (attempt {}/{})",
            outcome.attempts, policy.max_retries
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "upload"
    }
}

impl UploadCommand {
    /// Create new upload command, applying command-line overrides
    pub fn new(file: String, mut settings: UploadSettings, overrides: UploadOverrides) -> Result<Self> {
        if let Some(server) = overrides.server {
            settings.server = server;
        }
        if let Some(remote_dir) = overrides.remote_dir {
            settings.remote_dir = remote_dir;
        }
        if let Some(timeout) = overrides.timeout {
            settings.timeout_secs = timeout;
        }
        if let Some(retries) = overrides.retries {
            settings.max_retries = retries;
        }
        if overrides.passive {
            settings.passive = true;
        }
        if overrides.user.is_some() {
            settings.user = overrides.user;
            settings.password = overrides.password;
        }

        if settings.timeout_secs == 0 || settings.max_retries == 0 {
            return Err(SchemachainError::Config(
                "--timeout and --retries must be at least 1".to_string(),
            ));
        }

        Ok(Self { file, settings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let command = UploadCommand::new(
            "app.bin".to_string(),
            UploadSettings::default(),
            UploadOverrides {
                server: Some("ftp.local".to_string()),
                retries: Some(2),
                passive: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(command.settings.server, "ftp.local");
        assert_eq!(command.settings.max_retries, 2);
        assert_eq!(command.settings.timeout_secs, 6);
        assert!(command.settings.passive);
        assert_eq!(command.settings.remote_dir, ".extensions");
    }

    #[test]
    fn test_zero_retries_rejected() {
        let result = UploadCommand::new(
            "app.bin".to_string(),
            UploadSettings::default(),
            UploadOverrides {
                retries: Some(0),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }
}
