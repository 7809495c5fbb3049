pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod manifest;
pub mod upload;

pub use error::{ManifestError, Result, SchemachainError, UploadError};
