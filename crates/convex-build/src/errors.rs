use convex_config::ConfigError;
use convex_manifest::ManifestError;
use convex_scan::DiscoveryError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Transformer id `{id}` cannot be turned into a type path: {reason}")]
    InvalidPath { id: String, reason: String },
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Missing environment variable {0}; convex-build must run from a cargo build script")]
    MissingEnv(&'static str),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to set up logging: {0}")]
    Logger(String),
}
