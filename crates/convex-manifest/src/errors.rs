use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, merging or persisting a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid transformer id `{id}`: {reason}")]
    InvalidId { id: String, reason: &'static str },

    #[error("Invalid manifest entry at {}:{line}: {content:?}", .path.display())]
    InvalidEntry {
        path: PathBuf,
        line: usize,
        content: String,
    },
}
