use super::chain::ManifestChain;
use super::discover::discover;
use super::index::RegistryIndex;
use super::packer::{plan_pages, PagePlan};
use super::verify::verify_includes;
use crate::error::ManifestError;
use crate::io::ManifestPaths;
use std::collections::HashSet;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Outcome of one `update` run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    /// Stems registered by this run, in discovery order
    pub entries_added: Vec<String>,
    /// Pages written (or that would be written on a dry run), in chain order
    pub pages_written: Vec<String>,
    /// Pages newly added to the chain
    pub pages_created: Vec<String>,
    /// Definition files skipped because they are already registered
    pub skipped: Vec<String>,
    pub index_updated: bool,
    pub dry_run: bool,
    /// The planned page contents
    pub plan: PagePlan,
}

impl UpdateReport {
    pub fn is_noop(&self) -> bool {
        self.pages_written.is_empty() && !self.index_updated
    }
}

/// Integrity findings for an existing chain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    pub pages: Vec<String>,
    pub entry_count: usize,
    pub problems: Vec<String>,
}

impl CheckReport {
    pub fn is_healthy(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Runs the loader, discoverer, validator, packer and index updater in order
pub struct ManifestPager {
    paths: ManifestPaths,
    capacity: usize,
    dry_run: bool,
}

impl ManifestPager {
    pub fn new(paths: ManifestPaths, capacity: usize) -> Self {
        Self {
            paths,
            capacity,
            dry_run: false,
        }
    }

    /// Plan and validate everything but write nothing
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn paths(&self) -> &ManifestPaths {
        &self.paths
    }

    /// Register every new definition file in the manifest chain
    pub fn run(&self) -> Result<UpdateReport, ManifestError> {
        let chain = ManifestChain::load(&self.paths)?;
        info!(
            "Loaded manifest chain: {} pages, {} entries, terminal {}",
            chain.pages.len(),
            chain.schemas.len(),
            chain.terminal
        );

        let discovery = discover(&self.paths, &chain)?;
        verify_includes(&chain, &discovery)?;

        let plan = plan_pages(&self.paths, &chain, &discovery.entries, self.capacity);
        let pages_created = plan.created_pages();

        let index_path = self.paths.index_path();
        let mut index = RegistryIndex::load_or_default(&index_path);
        for page in &pages_created {
            index.register(page);
        }
        let index_updated = index.is_dirty();

        if self.dry_run {
            info!("Dry run: {} pages would be written", plan.writes.len());
        } else {
            plan.commit(&self.paths)?;
            if index_updated {
                index.save(&index_path)?;
            }
            info!(
                "Registered {} entries across {} pages ({} new)",
                discovery.entries.len(),
                plan.writes.len(),
                pages_created.len()
            );
        }

        Ok(UpdateReport {
            entries_added: discovery.entries.iter().map(|e| e.stem.clone()).collect(),
            pages_written: plan.written_pages(),
            pages_created,
            skipped: discovery.skipped,
            index_updated,
            dry_run: self.dry_run,
            plan,
        })
    }

    /// Inspect the chain without modifying anything
    pub fn check(&self) -> Result<CheckReport, ManifestError> {
        let chain = ManifestChain::load(&self.paths)?;
        let mut problems = Vec::new();

        for (page, size) in chain.pages.iter().zip(&chain.page_sizes) {
            if *size > self.capacity {
                problems.push(format!(
                    "{} holds {} entries (capacity {})",
                    page, size, self.capacity
                ));
            }
        }

        let index_path = self.paths.index_path();
        let index = RegistryIndex::load_or_default(&index_path);
        for page in chain.pages.iter().skip(1) {
            if !index.contains(page) {
                problems.push(format!("{} is not listed in {}", page, self.paths.index_file));
            }
        }
        for listed in &index.manifests {
            if !chain.is_page(listed) {
                problems.push(format!(
                    "{} lists {} which is not reachable from {}",
                    self.paths.index_file, listed, self.paths.root_page
                ));
            }
        }

        let reachable: HashSet<&str> = chain.pages.iter().map(String::as_str).collect();
        for entry in WalkDir::new(&self.paths.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if self.paths.is_chained_page_name(name) && !reachable.contains(name) {
                warn!("Orphaned manifest page {}", name);
                problems.push(format!(
                    "{} is not reachable from {}",
                    name, self.paths.root_page
                ));
            }
        }

        Ok(CheckReport {
            pages: chain.pages,
            entry_count: chain.schemas.len(),
            problems,
        })
    }
}
