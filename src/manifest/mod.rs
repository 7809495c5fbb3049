//! Manifest pager - spreads schema registrations over a chain of pages
//!
//! # Overview
//!
//! Loose definition files sitting next to the manifest are registered under
//! their file stem in a chain of fixed-capacity pages. The registry index
//! records every page added after the root.
//!
//! # Architecture
//!
//! ```text
//! schema/
//!     ├── manifest.json      ← root page   { "schemas": {...}, "next": "manifest.1.json" }
//!     ├── manifest.1.json    ← chained page { "schemas": {...}, "next": null }
//!     ├── index.json         ← { "manifests": ["manifest.1.json"] }
//!     └── *.json             ← definition files { "version": 1, "schemas": {...}, "mappings": [...] }
//!
//! ManifestChain::load → discover → verify_includes → plan_pages → commit → RegistryIndex
//! ```

mod chain;
mod discover;
mod index;
mod packer;
mod page;
mod pager;
mod verify;

pub use chain::ManifestChain;
pub use discover::{discover, Discovery, NewEntry};
pub use index::RegistryIndex;
pub use packer::{plan_pages, PagePlan, PageWrite};
pub use page::ManifestPage;
pub use pager::{CheckReport, ManifestPager, UpdateReport};
pub use verify::verify_includes;
