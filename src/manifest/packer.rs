//! First-fit packing of new entries into the manifest chain.
//!
//! Packing is split into a pure planning step and a commit step. The commit
//! writes pages from the last one backwards, each through a temp file and a
//! rename, so a page is only linked from its predecessor once it is fully on
//! disk. An interrupted commit can leave an unlinked `manifest.<n>.json`
//! behind; discovery ignores such files and the next plan overwrites them.

use super::chain::ManifestChain;
use super::discover::NewEntry;
use super::page::ManifestPage;
use crate::error::ManifestError;
use crate::io::ManifestPaths;
use serde_json::Value;
use tracing::debug;

/// Final content of one page touched by the plan
#[derive(Debug, Clone, PartialEq)]
pub struct PageWrite {
    pub name: String,
    pub page: ManifestPage,
    /// The page did not exist in the chain before this run
    pub created: bool,
}

/// Pages to write, in chain order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePlan {
    pub writes: Vec<PageWrite>,
}

impl PagePlan {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Names of pages the plan adds to the chain
    pub fn created_pages(&self) -> Vec<String> {
        self.writes
            .iter()
            .filter(|w| w.created)
            .map(|w| w.name.clone())
            .collect()
    }

    pub fn written_pages(&self) -> Vec<String> {
        self.writes.iter().map(|w| w.name.clone()).collect()
    }

    /// Persist the plan, successors before the pages that link to them
    pub fn commit(&self, paths: &ManifestPaths) -> Result<(), ManifestError> {
        for write in self.writes.iter().rev() {
            debug!(
                "Writing {} ({} entries, next: {:?})",
                write.name,
                write.page.len(),
                write.page.next
            );
            write.page.save(&paths.file(&write.name))?;
        }
        Ok(())
    }
}

/// Distribute `entries` over the terminal page and as many new pages as needed
pub fn plan_pages(
    paths: &ManifestPaths,
    chain: &ManifestChain,
    entries: &[NewEntry],
    capacity: usize,
) -> PagePlan {
    let mut plan = PagePlan::default();
    if entries.is_empty() {
        return plan;
    }

    let capacity = capacity.max(1);
    let mut queue = entries.iter().peekable();
    let mut next_index = chain.pages.len();
    let mut current = PageWrite {
        name: chain.terminal.clone(),
        page: chain.terminal_page.clone(),
        created: false,
    };

    loop {
        let space = capacity.saturating_sub(current.page.len());
        for entry in queue.by_ref().take(space) {
            current
                .page
                .schemas
                .insert(entry.stem.clone(), Value::Array(entry.mappings.clone()));
        }

        if queue.peek().is_none() {
            current.page.next = None;
            plan.writes.push(current);
            return plan;
        }

        let name = loop {
            let candidate = paths.chained_page_name(next_index);
            next_index += 1;
            if !chain.is_page(&candidate) {
                break candidate;
            }
        };

        current.page.next = Some(name.clone());
        plan.writes.push(current);
        current = PageWrite {
            name,
            page: ManifestPage::default(),
            created: true,
        };
    }
}
