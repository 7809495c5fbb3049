use super::CommandHandler;
use crate::config::ManifestSettings;
use crate::io::ManifestPaths;
use crate::manifest::ManifestPager;
use crate::{Result, SchemachainError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Handler for the `check` command
pub struct CheckCommand {
    pub settings: ManifestSettings,
    pub working_dir: PathBuf,
}

#[async_trait]
impl CommandHandler for CheckCommand {
    async fn execute(&self) -> Result<()> {
        let paths = ManifestPaths::new(&self.working_dir, &self.settings)?;
        let report = ManifestPager::new(paths, self.settings.capacity).check()?;

        println!(
            "{} pages, {} entries: {}",
            report.pages.len(),
            report.entry_count,
            report.pages.join(" -> ")
        );

        if report.is_healthy() {
            println!("No problems found");
            return Ok(());
        }

        for problem in &report.problems {
            println!("   - {}", problem);
        }
        Err(SchemachainError::Generic(anyhow::anyhow!(
            "{} integrity problem(s) found",
            report.problems.len()
        )))
    }

    fn name(&self) -> &'static str {
        "check"
    }
}

impl CheckCommand {
    pub fn new(
        mut settings: ManifestSettings,
        working_dir: &Path,
        dir: Option<PathBuf>,
        capacity: Option<usize>,
    ) -> Result<Self> {
        if let Some(dir) = dir {
            settings.dir = dir;
        }
        if let Some(capacity) = capacity {
            if capacity == 0 {
                return Err(SchemachainError::Config(
                    "--capacity must be at least 1".to_string(),
                ));
            }
            settings.capacity = capacity;
        }

        Ok(Self {
            settings,
            working_dir: working_dir.to_path_buf(),
        })
    }
}
