use super::CommandHandler;
use crate::config::ManifestSettings;
use crate::io::ManifestPaths;
use crate::manifest::{ManifestPager, UpdateReport};
use crate::{Result, SchemachainError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Handler for the `update` command
pub struct UpdateCommand {
    pub settings: ManifestSettings,
    pub working_dir: PathBuf,
    pub dry_run: bool,
}

#[async_trait]
impl CommandHandler for UpdateCommand {
    async fn execute(&self) -> Result<()> {
        let pager = self.pager()?;
        println!("Updating manifest in {}", pager.paths().dir.display());

        let report = pager.run()?;
        print_report(&report);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "update"
    }
}

impl UpdateCommand {
    /// Create new update command, applying command-line overrides
    pub fn new(
        mut settings: ManifestSettings,
        working_dir: &Path,
        dir: Option<PathBuf>,
        capacity: Option<usize>,
        dry_run: bool,
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
            dry_run,
        })
    }

    fn pager(&self) -> Result<ManifestPager> {
        let paths = ManifestPaths::new(&self.working_dir, &self.settings)?;
        Ok(ManifestPager::new(paths, self.settings.capacity).with_dry_run(self.dry_run))
    }
}

fn print_report(report: &UpdateReport) {
    if report.entries_added.is_empty() {
        println!("Manifest is up to date ({} already registered)", report.skipped.len());
        return;
    }

    let verb = if report.dry_run { "Would register" } else { "Registered" };
    println!("{} {} entries:", verb, report.entries_added.len());
    for entry in &report.entries_added {
        println!("   - {}", entry);
    }

    for write in &report.plan.writes {
        let marker = if write.created { " (new)" } else { "" };
        println!(
            "{}{}: {} entries, next: {}",
            write.name,
            marker,
            write.page.len(),
            write.page.next.as_deref().unwrap_or("null")
        );
    }

    if report.dry_run {
        println!("Dry run - no files were changed");
    } else if report.index_updated {
        println!("Index updated");
    }
}
