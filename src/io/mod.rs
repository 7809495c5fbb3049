pub mod paths;

pub use paths::{ManifestPaths, PathUtils};
